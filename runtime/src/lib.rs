//! Valhalla Deploy Runtime - Host and Container Interaction
//!
//! Everything that touches the OS lives here: the TCP readiness
//! prober, container-engine and compose detection, package
//! installation, certificate issuance, Podman DNS repair and the
//! server process handoff. External tools are reached through the
//! [`runner::CommandRunner`] seam so the setup flow is testable
//! without Docker, certbot or a package manager installed.

pub mod cert;
pub mod compose;
pub mod network;
pub mod pkg;
pub mod probe;
pub mod runner;
pub mod supervisor;

pub use compose::{ComposeFrontEnd, ComposeKind, ContainerRuntime};
pub use probe::{wait_for, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
pub use runner::{CommandRunner, HostRunner, RunOutput};
