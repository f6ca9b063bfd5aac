//! Podman inter-container DNS repair.
//!
//! Compose services reach MySQL by name, which requires working
//! container DNS. Podman has two network backends: netavark (DNS via
//! aardvark-dns) and legacy CNI (DNS via the dnsname plugin). This
//! module detects the backend, installs the missing piece, recreates
//! the application network and patches the CNI network config when the
//! dnsname plugin entry is absent. Every step is idempotent: running
//! the repair twice never duplicates a plugin entry.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::{info, warn};

use valhalla_core::error::{DeployError, Result};

use crate::pkg::PackageManager;
use crate::runner::CommandRunner;

/// Candidate install locations for the CNI dnsname plugin binary.
const DNSNAME_CANDIDATES: [&str; 3] = [
    "/usr/libexec/cni/dnsname",
    "/opt/cni/bin/dnsname",
    "/usr/lib/cni/dnsname",
];

/// Directory holding per-network CNI configuration.
const CNI_CONF_DIR: &str = "/etc/cni/net.d";

/// Podman network backend variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkBackend {
    /// Modern backend; DNS handled by the aardvark-dns daemon.
    Netavark,
    /// Legacy plugin-based backend; DNS handled by the dnsname plugin.
    Cni,
}

/// Ask podman which network backend is active.
pub fn detect_backend(runner: &dyn CommandRunner) -> Result<NetworkBackend> {
    let output = runner.run(
        "podman",
        &["info", "--format", "{{.Host.NetworkBackend}}"],
    )?;
    if !output.success {
        return Err(DeployError::ToolMissing("podman".to_string()));
    }
    match output.stdout.trim() {
        "netavark" => Ok(NetworkBackend::Netavark),
        "cni" => Ok(NetworkBackend::Cni),
        other => Err(DeployError::Other(format!(
            "unknown podman network backend: {other:?}"
        ))),
    }
}

/// Repair inter-container DNS for the given application network.
///
/// Best-effort from the caller's point of view; errors are propagated
/// so the setup flow can log and continue.
pub fn repair_dns(runner: &dyn CommandRunner, network: &str) -> Result<()> {
    match detect_backend(runner)? {
        NetworkBackend::Netavark => {
            ensure_package(runner, "aardvark-dns")?;
            recreate_network(runner, network);
            Ok(())
        }
        NetworkBackend::Cni => {
            if !dnsname_plugin_present(&DNSNAME_CANDIDATES.map(PathBuf::from)) {
                ensure_package(runner, "podman-plugins")?;
            }
            recreate_network(runner, network);
            let conf = Path::new(CNI_CONF_DIR).join(format!("{network}.conflist"));
            patch_conflist_file(&conf)?;
            Ok(())
        }
    }
}

/// True when a dnsname plugin binary exists in any candidate location.
pub fn dnsname_plugin_present(candidates: &[PathBuf]) -> bool {
    candidates.iter().any(|p| p.exists())
}

fn ensure_package(runner: &dyn CommandRunner, package: &str) -> Result<()> {
    let Some(pm) = PackageManager::detect(runner) else {
        return Err(DeployError::ToolMissing(
            "no supported package manager (apt-get or dnf)".to_string(),
        ));
    };
    pm.install(runner, &[package])
}

/// Drop and recreate the application network so podman regenerates
/// its configuration. Removal failure is fine (network may not exist).
fn recreate_network(runner: &dyn CommandRunner, network: &str) {
    if !runner.succeeds("podman", &["network", "rm", "-f", network]) {
        info!("network {network} did not exist, creating fresh");
    }
    if !runner.succeeds("podman", &["network", "create", network]) {
        warn!("podman network create {network} failed");
    }
}

/// The dnsname plugin entry appended to a CNI plugin chain.
fn dnsname_entry() -> Value {
    json!({
        "type": "dnsname",
        "domainName": "dns.podman",
        "capabilities": { "aliases": true }
    })
}

/// Append the dnsname plugin to a parsed conflist unless one is
/// already present. Returns the (possibly modified) document and
/// whether a change was made.
pub fn patch_conflist(mut doc: Value) -> Result<(Value, bool)> {
    let plugins = doc
        .get_mut("plugins")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| {
            DeployError::Serialization("conflist has no plugins array".to_string())
        })?;

    let already_present = plugins
        .iter()
        .any(|p| p.get("type").and_then(Value::as_str) == Some("dnsname"));
    if already_present {
        return Ok((doc, false));
    }

    plugins.push(dnsname_entry());
    Ok((doc, true))
}

/// Patch a conflist file on disk, keeping a `.bak` copy of the
/// pre-patch contents. No-op when the entry already exists.
pub fn patch_conflist_file(path: &Path) -> Result<bool> {
    let data = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&data)?;

    let (patched, changed) = patch_conflist(doc)?;
    if !changed {
        info!("{} already carries a dnsname entry", path.display());
        return Ok(false);
    }

    let backup = path.with_extension("conflist.bak");
    std::fs::write(&backup, &data)?;
    std::fs::write(path, serde_json::to_string_pretty(&patched)?)?;
    info!("patched dnsname plugin into {}", path.display());
    Ok(true)
}
