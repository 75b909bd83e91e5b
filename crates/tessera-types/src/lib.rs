//! Foundation types for Tessera.
//!
//! This crate provides the identity and data-model types shared by every
//! other Tessera crate.
//!
//! # Key Types
//!
//! - [`RecordKey`]: Row key of a record (1..=256 bytes)
//! - [`SchemaId`]: Content-addressed schema identifier (BLAKE3 hash)
//! - [`Format`]: Payload encoding tag (binary or text)
//! - [`Version`]: Optimistic-concurrency version counter
//! - [`Record`]: A decoded value together with its storage metadata
//! - [`LogEntry`]: One accepted write, as mirrored into the history log

pub mod error;
pub mod format;
pub mod key;
pub mod record;
pub mod schema_id;

pub use error::TypeError;
pub use format::Format;
pub use key::RecordKey;
pub use record::{version_from_bytes, version_to_bytes, LogEntry, Record, Version};
pub use schema_id::SchemaId;
