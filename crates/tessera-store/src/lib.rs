//! Versioned record store.
//!
//! [`VersionedStore`] keeps the single current value of every key in one
//! backend table, together with the schema id it was written with, its
//! format and a version counter. Writes are compare-and-put on the version:
//!
//! - `put(key, value, 0)` inserts only if the key is absent
//! - `put(key, value, n)` replaces only if the stored version is `n`
//! - on success the stored version becomes `expected + 1`
//!
//! Prior values are not kept here. Accepted writes are handed to a
//! [`HistorySink`], which the history log implements.
//!
//! [`Shard`] pairs a store with a routing weight for external routers.

pub mod cell;
pub mod config;
pub mod error;
pub mod shard;
pub mod sink;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use shard::Shard;
pub use sink::HistorySink;
pub use store::VersionedStore;
