//! CLI command definitions and dispatch.

mod entrypoint;
mod setup;

use clap::{Parser, Subcommand};

/// Valhalla Deploy — first-run bootstrap and container entrypoint.
#[derive(Parser)]
#[command(name = "valhalla", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Interactive first-run provisioning on the host
    Setup(setup::SetupArgs),
    /// Container entrypoint: wait for MySQL, then exec the server
    Entrypoint(entrypoint::EntrypointArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Setup(args) => setup::execute(args).await,
        Command::Entrypoint(args) => entrypoint::execute(args).await,
    }
}
