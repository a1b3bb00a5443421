//! # stratum-core
//!
//! Core configuration, errors, and utilities for Stratum.
//!
//! This crate provides shared functionality used across all Stratum crates:
//!
//! - **Configuration**: Loading, validation, and persistence of config files
//! - **Secrets in memory**: A zeroizing, redacting string type
//! - **Host environment**: Env-var helpers and the [`env::EnvironmentWriter`] seam
//! - **Logging**: `tracing` subscriber initialisation

pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use env::{EnvironmentWriter, MemoryEnvironment, ProcessEnvironment};
pub use error::{Error, Result};
pub use secret::SecretString;
