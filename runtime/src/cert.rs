//! TLS certificate provisioning via certbot's standalone flow.
//!
//! certbot binds its own short-lived listener on port 80, so anything
//! already holding the port is stopped first (best-effort). Issuance
//! failure is tolerated by the setup flow; re-running setup retries.

use std::path::PathBuf;

use tracing::warn;

use valhalla_core::error::{DeployError, Result};

use crate::runner::CommandRunner;

/// Certificate and key paths for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl CertificateBundle {
    /// Deterministic letsencrypt live paths for a domain.
    pub fn for_domain(domain: &str) -> Self {
        let live = PathBuf::from("/etc/letsencrypt/live").join(domain);
        Self {
            cert_path: live.join("fullchain.pem"),
            key_path: live.join("privkey.pem"),
        }
    }
}

/// Capability interface so the setup flow can be tested without ACME.
pub trait CertificateIssuer {
    fn issue(&self, domain: &str) -> Result<CertificateBundle>;
}

/// Real issuer shelling out to certbot.
pub struct CertbotIssuer<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> CertbotIssuer<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Best-effort: kill whatever is bound to port 80 so the
    /// standalone listener can bind.
    fn free_port_80(&self) {
        if !self.runner.succeeds("fuser", &["-k", "80/tcp"]) {
            // Nothing was listening, or fuser is unavailable. Either
            // way certbot gets its chance.
            warn!("could not free port 80; continuing");
        }
    }
}

impl CertificateIssuer for CertbotIssuer<'_> {
    fn issue(&self, domain: &str) -> Result<CertificateBundle> {
        self.free_port_80();

        let output = self.runner.run(
            "certbot",
            &[
                "certonly",
                "--standalone",
                "--non-interactive",
                "--agree-tos",
                "--register-unsafely-without-email",
                "-d",
                domain,
            ],
        )?;

        if output.success {
            Ok(CertificateBundle::for_domain(domain))
        } else {
            Err(DeployError::Other(format!(
                "certbot failed for {domain}: {}",
                output.stderr.trim()
            )))
        }
    }
}
