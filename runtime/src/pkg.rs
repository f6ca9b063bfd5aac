//! Host package installation.
//!
//! Detects the OS package manager (apt on Debian-family, dnf on
//! Fedora-family) and runs non-interactive installs. Used for a
//! missing container engine (with user consent) and the Podman DNS
//! packages.

use tracing::info;

use valhalla_core::error::{DeployError, Result};

use crate::runner::CommandRunner;

/// Supported host package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
}

impl PackageManager {
    /// Detect which package manager the host carries.
    pub fn detect(runner: &dyn CommandRunner) -> Option<Self> {
        if runner.succeeds("apt-get", &["--version"]) {
            Some(PackageManager::Apt)
        } else if runner.succeeds("dnf", &["--version"]) {
            Some(PackageManager::Dnf)
        } else {
            None
        }
    }

    /// Install packages non-interactively.
    pub fn install(&self, runner: &dyn CommandRunner, packages: &[&str]) -> Result<()> {
        let (program, base): (&str, &[&str]) = match self {
            PackageManager::Apt => ("apt-get", &["install", "-y"]),
            PackageManager::Dnf => ("dnf", &["install", "-y"]),
        };
        let mut args: Vec<&str> = base.to_vec();
        args.extend_from_slice(packages);

        info!("installing {} via {program}", packages.join(", "));
        let output = runner.run(program, &args)?;
        if output.success {
            Ok(())
        } else {
            Err(DeployError::Other(format!(
                "{program} install failed: {}",
                output.stderr.trim()
            )))
        }
    }
}
