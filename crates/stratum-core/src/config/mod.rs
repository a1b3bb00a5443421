//! Configuration schema, loading, and persistence.

mod loader;
mod schema;

pub use loader::*;
pub use schema::*;
