use std::sync::Arc;

use tessera_codec::Datum;
use tessera_history::{HistoryLog, HistoryMetrics, Segment, VersionHistory};
use tessera_store::{Shard, VersionedStore};
use tessera_types::{Record, RecordKey, Version};

use crate::error::SdkResult;

/// A [`VersionedStore`] whose accepted writes are mirrored into its table's
/// [`HistoryLog`], together with read access to that history.
pub struct LoggedStore<T> {
    store: Arc<VersionedStore<T>>,
    history: Arc<HistoryLog>,
}

impl<T: Datum> LoggedStore<T> {
    pub(crate) fn new(store: Arc<VersionedStore<T>>, history: Arc<HistoryLog>) -> Self {
        Self { store, history }
    }

    pub async fn get(&self, key: &RecordKey) -> SdkResult<Option<Record<T>>> {
        Ok(self.store.get(key).await?)
    }

    /// Current version of `key`; `0` if absent.
    pub async fn version(&self, key: &RecordKey) -> SdkResult<Version> {
        Ok(self.store.version(key).await?)
    }

    /// Write `value` if the stored version is `expected`; `false` on conflict.
    pub async fn put(&self, key: &RecordKey, value: &T, expected: Version) -> SdkResult<bool> {
        Ok(self.store.put(key, value, expected).await?)
    }

    /// Write `value` and return the new version; a conflict is an error.
    pub async fn try_put(&self, key: &RecordKey, value: &T, expected: Version) -> SdkResult<Version> {
        Ok(self.store.try_put(key, value, expected).await?)
    }

    pub async fn put_latest(&self, key: &RecordKey, value: &T) -> SdkResult<bool> {
        Ok(self.store.put_latest(key, value).await?)
    }

    /// Every logged version of `key`, newest first.
    pub fn versions(&self, key: &RecordKey) -> VersionHistory<T> {
        self.history.read_versions(key)
    }

    /// Describe this store as a routing shard of the given weight.
    pub fn shard(&self, weight: f64) -> SdkResult<Shard<T>> {
        Ok(Shard::new(Arc::clone(&self.store), weight)?)
    }

    pub fn store(&self) -> &Arc<VersionedStore<T>> {
        &self.store
    }

    pub fn history(&self) -> &Arc<HistoryLog> {
        &self.history
    }

    /// Start a new segment in this table's history; returns its rotation id.
    pub async fn roll(&self) -> SdkResult<u64> {
        Ok(self.history.roll().await?)
    }

    /// This table's history segments, newest first.
    pub async fn segments(&self) -> SdkResult<Vec<Segment>> {
        Ok(self.history.segments().await?)
    }

    pub fn metrics(&self) -> HistoryMetrics {
        self.history.metrics()
    }
}

impl<T> Clone for LoggedStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            history: Arc::clone(&self.history),
        }
    }
}

impl<T> std::fmt::Debug for LoggedStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggedStore")
            .field("store", &self.store)
            .field("history", &self.history.base_table())
            .finish()
    }
}
