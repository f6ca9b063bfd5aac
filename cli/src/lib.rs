//! Valhalla Deploy CLI - first-run setup and container entrypoint.

pub mod commands;
pub mod prompt;
