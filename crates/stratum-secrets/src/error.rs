//! Error types for secret management.

use stratum_core::error::{ConfigError, SecurityError};
use thiserror::Error;

use crate::store::TransportError;

/// Errors that can occur during secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret not found: {name} (environment {environment}, path {path})")]
    NotFound {
        name: String,
        environment: String,
        path: String,
    },

    #[error("Circular reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    #[error("Reference depth exceeded resolving {name}: limit is {limit}")]
    MaxDepthExceeded { name: String, limit: usize },

    #[error("Authentication failed: ciphertext, tag, nonce or key do not match")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Secret store failure: {0}")]
    Transport(#[source] TransportError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Environment export refused: {0}")]
    Environment(#[from] SecurityError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SecretError {
    /// True for failures of the resolution engine itself, as opposed to
    /// store, crypto, or caller errors.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::CircularReference { .. } | Self::MaxDepthExceeded { .. }
        )
    }
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
