//! `valhalla setup` command — interactive first-run provisioning.
//!
//! Collects credentials into the `.env` ledger, makes sure a container
//! engine and compose front-end are usable, handles TLS issuance when
//! the service is exposed on 443, repairs Podman DNS, downloads the
//! compose descriptor on first run and starts the stack.

use std::io::{BufRead, Write};
use std::path::Path;

use clap::Args;
use tracing::{info, warn};

use valhalla_core::envfile::EnvFile;
use valhalla_core::error::{DeployError, Result};
use valhalla_core::secret;
use valhalla_runtime::cert::{CertbotIssuer, CertificateIssuer};
use valhalla_runtime::compose::{detect_compose, runtime_installed, ComposeFrontEnd};
use valhalla_runtime::network;
use valhalla_runtime::pkg::PackageManager;
use valhalla_runtime::runner::{CommandRunner, HostRunner};
use valhalla_runtime::ContainerRuntime;

use crate::prompt::Prompter;

/// Where the compose descriptor is published.
const COMPOSE_URL: &str =
    "https://raw.githubusercontent.com/valhalla-panel/valhalla/main/docker-compose.yml";

const COMPOSE_FILE: &str = "docker-compose.yml";
const ENV_FILE: &str = ".env";

/// Published application image used as the IMAGE default.
const DEFAULT_IMAGE: &str = "ghcr.io/valhalla-panel/valhalla:latest";

/// Compose network whose DNS the Podman fixer repairs.
const APP_NETWORK: &str = "valhalla_default";

#[derive(Args)]
pub struct SetupArgs {}

pub async fn execute(_args: SetupArgs) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let runner = HostRunner;
    let issuer = CertbotIssuer::new(&runner);
    let mut prompter = Prompter::stdio();
    let mut env = EnvFile::load(Path::new(ENV_FILE))?;

    let front_end = provision(&mut prompter, &mut env, &runner, &issuer)?;

    fetch_compose_file(Path::new(COMPOSE_FILE)).await?;

    match front_end {
        Some(fe) => {
            info!("pulling images via {fe}");
            if !fe.invoke(&runner, &["pull"]) {
                warn!("compose pull failed; up will pull on demand");
            }
            if !fe.invoke(&runner, &["up", "-d"]) {
                return Err("compose up failed".into());
            }
            println!("Valhalla is starting. Configuration written to {ENV_FILE}.");
        }
        None => {
            println!(
                "No compose front-end found. Configuration written to {ENV_FILE}; \
                 install docker compose (or podman-compose) and run \"compose up -d\"."
            );
        }
    }
    Ok(())
}

/// The interactive provisioning flow. Every accepted value is
/// persisted through the env store immediately.
fn provision<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    env: &mut EnvFile,
    runner: &dyn CommandRunner,
    issuer: &dyn CertificateIssuer,
) -> Result<Option<ComposeFrontEnd>> {
    let runtime = prompter.choose_runtime()?;
    ensure_runtime(prompter, runner, runtime)?;

    let front_end = detect_compose(runner);
    match front_end {
        Some(fe) => info!("using compose front-end: {fe}"),
        None => warn!("no compose front-end responded"),
    }

    prompt_required(prompter, env, "BOT_TOKEN", "BOT_TOKEN", None)?;

    let existing_ids = env.get("ADMIN_IDS").map(str::to_string);
    let ids = prompter.admin_ids(existing_ids.as_deref())?;
    env.set("ADMIN_IDS", &ids)?;

    prompt_required(prompter, env, "PUBLIC_BASE_URL", "PUBLIC_BASE_URL", None)?;
    prompt_required(prompter, env, "MYSQL_HOST", "MYSQL_HOST", Some("mysql"))?;
    prompt_required(prompter, env, "MYSQL_PORT", "MYSQL_PORT", Some("3306"))?;
    prompt_required(
        prompter,
        env,
        "MYSQL_DATABASE",
        "MYSQL_DATABASE",
        Some("valhalla"),
    )?;
    prompt_required(prompter, env, "FLASK_HOST", "FLASK_HOST", Some("0.0.0.0"))?;
    prompt_required(prompter, env, "FLASK_PORT", "FLASK_PORT", Some("5000"))?;
    prompt_required(
        prompter,
        env,
        "USAGE_SYNC_INTERVAL",
        "USAGE_SYNC_INTERVAL (seconds)",
        Some("600"),
    )?;
    prompt_required(prompter, env, "IMAGE", "IMAGE", Some(DEFAULT_IMAGE))?;

    prompt_generated(prompter, env, "MYSQL_USER", secret::random_username)?;
    prompt_generated(prompter, env, "MYSQL_PASSWORD", secret::random_password)?;
    prompt_generated(prompter, env, "MYSQL_ROOT_PASSWORD", secret::random_password)?;

    if env.get("FLASK_PORT") == Some("443") {
        provision_tls(prompter, env, issuer)?;
    }

    if runtime == ContainerRuntime::Podman {
        // Best-effort: a broken DNS repair must not abort setup
        if let Err(e) = network::repair_dns(runner, APP_NETWORK) {
            warn!("podman DNS repair failed: {e}");
        }
    }

    Ok(front_end)
}

/// Verify the chosen engine is installed, offering to install it.
/// Declining is the one path that aborts setup with a non-zero exit.
fn ensure_runtime<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    runner: &dyn CommandRunner,
    runtime: ContainerRuntime,
) -> Result<()> {
    if runtime_installed(runner, runtime) {
        return Ok(());
    }

    prompter.say(&format!("{runtime} is not installed."))?;
    if !prompter.yes_no(&format!("Install {runtime} now?"), true)? {
        return Err(DeployError::ToolMissing(format!(
            "{runtime} (installation declined)"
        )));
    }

    let Some(pm) = PackageManager::detect(runner) else {
        return Err(DeployError::ToolMissing(
            "no supported package manager (apt-get or dnf)".to_string(),
        ));
    };
    pm.install(runner, &[runtime.package()])
}

/// TLS issuance for port-443 deployments. Best-effort: a failed ACME
/// exchange leaves the cert keys unset and setup continues.
fn provision_tls<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    env: &mut EnvFile,
    issuer: &dyn CertificateIssuer,
) -> Result<()> {
    let existing = env.get("SSL_DOMAIN").map(str::to_string);
    let domain = prompter.required("SSL_DOMAIN", existing.as_deref())?;
    env.set("SSL_DOMAIN", &domain)?;

    match issuer.issue(&domain) {
        Ok(bundle) => {
            env.set("SSL_CERT_PATH", &bundle.cert_path.to_string_lossy())?;
            env.set("SSL_KEY_PATH", &bundle.key_path.to_string_lossy())?;
            info!("certificate issued for {domain}");
        }
        Err(e) => {
            warn!("certificate issuance failed (re-run setup to retry): {e}");
        }
    }
    Ok(())
}

fn prompt_required<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    env: &mut EnvFile,
    key: &str,
    label: &str,
    default: Option<&str>,
) -> Result<()> {
    let existing = env.get(key).map(str::to_string);
    let shown = existing.as_deref().or(default);
    let value = prompter.required(label, shown)?;
    env.set(key, &value)
}

fn prompt_generated<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    env: &mut EnvFile,
    key: &str,
    generate: impl Fn() -> String,
) -> Result<()> {
    let existing = env.get(key).map(str::to_string);
    let value = prompter.generate_or_accept(key, existing.as_deref(), generate)?;
    env.set(key, &value)
}

/// Download the compose descriptor on first run only; an existing file
/// is never overwritten.
async fn fetch_compose_file(path: &Path) -> Result<()> {
    if path.exists() {
        info!("{} already present, keeping it", path.display());
        return Ok(());
    }
    let body = reqwest::get(COMPOSE_URL)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| DeployError::Other(format!("compose descriptor download failed: {e}")))?
        .text()
        .await
        .map_err(|e| DeployError::Other(format!("compose descriptor download failed: {e}")))?;
    std::fs::write(path, body)?;
    info!("wrote {}", path.display());
    Ok(())
}
