//! Content-addressed schema registry.
//!
//! A schema's id is the BLAKE3 hash of its canonical text, so identical
//! definitions resolve to the same id in every process. Definitions are
//! persisted once (insert-if-absent) in a backend table keyed by the hex id
//! and cached in both directions for the life of the registry.

pub mod config;
pub mod error;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use registry::SchemaRegistry;
