//! `valhalla entrypoint` command — container PID-1 gate.
//!
//! Waits for the configured MySQL endpoint, computes the server
//! command from the environment and replaces the current process
//! image with it. Exits non-zero if the readiness wait times out; a
//! successful exec never returns here.

use clap::Args;
use tracing::info;

use valhalla_runtime::supervisor::{database_endpoint, exec_server, server_command};
use valhalla_runtime::{wait_for, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};

#[derive(Args)]
pub struct EntrypointArgs {}

pub async fn execute(_args: EntrypointArgs) -> Result<(), Box<dyn std::error::Error>> {
    let env = |key: &str| std::env::var(key).ok();

    let (host, port) = database_endpoint(&env)?;
    info!("waiting for MySQL at {host}:{port}");
    wait_for(&host, port, DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL).await?;

    let cmd = server_command(&env)?;
    info!("starting {} {}", cmd.program, cmd.args.join(" "));

    // Only returns on failure
    Err(exec_server(&cmd).into())
}
