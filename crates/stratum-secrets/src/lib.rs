//! Shared/personal secret management for Stratum.
//!
//! Secrets live in `(environment, path, type)` scopes. A personal value
//! shadows the shared value of the same name on single reads, while listings
//! can still see both. Values may embed `${OTHER_NAME}` references that are
//! expanded recursively against a snapshot of the store.
//!
//! The crate also carries the AES-256-GCM primitives used to protect values
//! in transit or at rest.

pub mod crypto;
pub mod error;
pub mod file_store;
pub mod interpolate;
pub mod overlay;
pub mod service;
pub mod store;
pub mod types;

pub use crypto::{decrypt, encrypt, generate_key, CipherBundle, EncodedBundle, SymmetricKey};
pub use error::{Result, SecretError};
pub use file_store::FileSecretStore;
pub use interpolate::{Interpolator, ResolutionPath};
pub use overlay::{OverlayResolver, Precedence};
pub use service::SecretService;
pub use store::{MemorySecretStore, SecretStore, StoreResult, TransportError};
pub use types::{
    ListOptions, RecordKey, ResolvedSecret, SecretOptions, SecretRecord, SecretScope, SecretType,
};
