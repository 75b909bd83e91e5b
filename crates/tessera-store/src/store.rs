use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use tessera_backend::{Backend, TableSchema};
use tessera_codec::{decode_datum, encode_datum, Datum};
use tessera_registry::SchemaRegistry;
use tessera_types::{version_to_bytes, Format, LogEntry, Record, RecordKey, Version};

use crate::cell::{read_version, StoredCell, COLUMNS, VERSION_COLUMN};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::sink::HistorySink;

/// Current-value store with optimistic concurrency.
///
/// Each key holds one value, the id of the schema it was written with, its
/// format and a version. Writes name the version they expect to replace and
/// succeed only if it is still current; the new version is `expected + 1`.
///
/// Accepted writes are handed to the configured [`HistorySink`], if any.
pub struct VersionedStore<T> {
    backend: Arc<dyn Backend>,
    registry: Arc<SchemaRegistry>,
    table: String,
    format: Format,
    sink: Option<Arc<dyn HistorySink>>,
    _datum: PhantomData<fn() -> T>,
}

impl<T> VersionedStore<T> {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Format new values are written in.
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }
}

impl<T: Datum> VersionedStore<T> {
    /// Open a store over `config.table`, creating the table if needed.
    pub async fn open(
        backend: Arc<dyn Backend>,
        registry: Arc<SchemaRegistry>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        backend
            .create_table_if_absent(&config.table, &TableSchema::new(COLUMNS))
            .await?;
        Ok(Self {
            backend,
            registry,
            table: config.table,
            format: config.format,
            sink: None,
            _datum: PhantomData,
        })
    }

    /// Mirror every accepted write into `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Read the current value of `key`.
    pub async fn get(&self, key: &RecordKey) -> StoreResult<Option<Record<T>>> {
        let Some(cols) = self.backend.get(&self.table, key.as_bytes()).await? else {
            return Ok(None);
        };
        let cell = StoredCell::from_columns(&cols).map_err(|reason| StoreError::Corrupt {
            key: key.clone(),
            reason,
        })?;
        let schema = self.registry.load(&cell.schema_id).await?;
        let value = decode_datum::<T>(&cell.data, &schema, cell.format)?;
        Ok(Some(Record {
            key: key.clone(),
            value,
            schema_id: cell.schema_id,
            format: cell.format,
            version: cell.version,
        }))
    }

    /// Current version of `key`; `0` if it has never been written.
    pub async fn version(&self, key: &RecordKey) -> StoreResult<Version> {
        match self.backend.get(&self.table, key.as_bytes()).await? {
            Some(cols) => read_version(&cols).map_err(|reason| StoreError::Corrupt {
                key: key.clone(),
                reason,
            }),
            None => Ok(0),
        }
    }

    /// Write `value` if the stored version is `expected` (`0`: key absent).
    ///
    /// Returns `false` on a version conflict.
    pub async fn put(&self, key: &RecordKey, value: &T, expected: Version) -> StoreResult<bool> {
        match self.try_put(key, value, expected).await {
            Ok(_) => Ok(true),
            Err(StoreError::Conflict { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Like [`put`](Self::put), but reports a conflict as
    /// [`StoreError::Conflict`] and returns the new version on success.
    pub async fn try_put(&self, key: &RecordKey, value: &T, expected: Version) -> StoreResult<Version> {
        let conflict = || StoreError::Conflict {
            key: key.clone(),
            expected,
        };
        // Encode first: a value that does not fit its schema must not reach
        // the registry or the record table.
        let payload = Bytes::from(encode_datum(value, self.format)?);
        let schema_id = self.registry.resolve(&value.schema()).await?;
        let version = expected.checked_add(1).ok_or_else(conflict)?;

        let cell = StoredCell {
            schema_id,
            data: payload,
            version,
            format: self.format,
        };
        let expected_bytes = version_to_bytes(expected);
        let expected_column = (expected != 0).then_some(&expected_bytes[..]);
        let accepted = self
            .backend
            .compare_and_put(
                &self.table,
                key.as_bytes(),
                VERSION_COLUMN,
                expected_column,
                cell.to_columns(),
            )
            .await?;
        if !accepted {
            debug!(table = %self.table, key = %key, expected, "version conflict");
            return Err(conflict());
        }
        debug!(table = %self.table, key = %key, version, "record written");

        if let Some(sink) = &self.sink {
            sink.record(LogEntry {
                key: key.clone(),
                schema_id,
                version,
                format: self.format,
                payload: cell.data,
            })
            .await;
        }
        Ok(version)
    }

    /// Read the current version, then write against it.
    ///
    /// Not atomic: a concurrent writer between the read and the write makes
    /// this return `false`.
    pub async fn put_latest(&self, key: &RecordKey, value: &T) -> StoreResult<bool> {
        let current = self.version(key).await?;
        self.put(key, value, current).await
    }
}

impl<T> std::fmt::Debug for VersionedStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedStore")
            .field("table", &self.table)
            .field("format", &self.format)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
