//! Valhalla Deploy Core - Foundational Types
//!
//! This crate provides the types shared by the setup tool and the
//! container entrypoint: the error taxonomy, the environment-file
//! store, admin-ID validation and credential generation.

pub mod admin;
pub mod envfile;
pub mod error;
pub mod secret;

// Re-export commonly used types
pub use admin::parse_admin_ids;
pub use envfile::EnvFile;
pub use error::{DeployError, Result};

/// Valhalla Deploy version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
