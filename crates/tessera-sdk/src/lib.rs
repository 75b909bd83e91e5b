//! High-level SDK for Tessera.
//!
//! [`Tessera`] opens the schema registry and history log over a backend and
//! hands out [`LoggedStore`]s: typed, optimistically versioned stores whose
//! accepted writes are mirrored into the history.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use tessera_sdk::{GenericRecord, InMemoryBackend, RecordKey, SdkResult, Tessera, TesseraConfig};
//! # async fn demo(value: GenericRecord) -> SdkResult<()> {
//! let db = Tessera::open(Arc::new(InMemoryBackend::new()), TesseraConfig::default()).await?;
//! let store = db.store::<GenericRecord>().await?;
//! let key = RecordKey::try_from("u1")?;
//! store.put(&key, &value, 0).await?;
//! db.flush().await;
//! let history = store.versions(&key).into_vec().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logged;
pub mod tessera;

pub use config::TesseraConfig;
pub use error::{SdkError, SdkResult};
pub use logged::LoggedStore;
pub use tessera::Tessera;

// Re-export key types
pub use tessera_backend::{Backend, InMemoryBackend};
pub use tessera_codec::{Datum, GenericRecord, Schema, Value};
pub use tessera_history::{Backpressure, HistoryConfig, HistoryMetrics, ManualClock, SystemClock};
pub use tessera_registry::RegistryConfig;
pub use tessera_store::StoreConfig;
pub use tessera_types::{Format, Record, RecordKey, SchemaId, Version};
