//! Storage capability consumed by Tessera.
//!
//! The core never talks to a physical store directly. Everything it needs is
//! expressed by the [`Backend`] trait: idempotent table creation, point reads
//! and writes, a compare-and-put on one column, prefix scans, table discovery
//! and a single-table filtered query.
//!
//! # Backends
//!
//! - [`InMemoryBackend`] -- `BTreeMap`-based tables for tests and embedding
//!
//! Column-family stores and relational databases implement the same trait;
//! there is no shared base type.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use traits::{Backend, MAX_ROW_KEY_LEN};
pub use types::{columns, Columns, Order, Query, Row, TableSchema};
