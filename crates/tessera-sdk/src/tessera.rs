use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use tessera_backend::Backend;
use tessera_codec::{Datum, Schema};
use tessera_history::{
    Clock, HistoryConfig, HistoryError, HistoryLog, HistoryMetrics, Segment, SystemClock,
};
use tessera_registry::SchemaRegistry;
use tessera_store::{StoreConfig, VersionedStore};
use tessera_types::SchemaId;

use crate::config::TesseraConfig;
use crate::error::SdkResult;
use crate::logged::LoggedStore;

/// High-level Tessera API.
///
/// Owns the schema registry for one backend and hands out typed stores.
/// Every store table gets its own history log, with segments named
/// `<table>_<rotation id>`; stores opened on the same table share it.
pub struct Tessera {
    backend: Arc<dyn Backend>,
    registry: Arc<SchemaRegistry>,
    clock: Arc<dyn Clock>,
    histories: Mutex<BTreeMap<String, Arc<HistoryLog>>>,
    closed: AtomicBool,
    config: TesseraConfig,
}

impl Tessera {
    /// Open over `backend` using the system clock for segment names.
    pub async fn open(backend: Arc<dyn Backend>, config: TesseraConfig) -> SdkResult<Self> {
        Self::open_with_clock(backend, config, Arc::new(SystemClock)).await
    }

    /// Open the registry and the history of the configured store table.
    pub async fn open_with_clock(
        backend: Arc<dyn Backend>,
        config: TesseraConfig,
        clock: Arc<dyn Clock>,
    ) -> SdkResult<Self> {
        let registry = Arc::new(
            SchemaRegistry::open(Arc::clone(&backend), config.registry.clone()).await?,
        );
        let db = Self {
            backend,
            registry,
            clock,
            histories: Mutex::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
            config,
        };
        db.history_for(&db.config.store.table).await?;
        info!(
            schemas = db.registry.len(),
            store_table = %db.config.store.table,
            "tessera opened"
        );
        Ok(db)
    }

    /// A typed store over the configured record table.
    pub async fn store<T: Datum>(&self) -> SdkResult<LoggedStore<T>> {
        self.store_with(self.config.store.clone()).await
    }

    /// A typed store over another table or format, logged into that
    /// table's own history.
    ///
    /// Fails with [`HistoryError::Shutdown`] after [`shutdown`](Self::shutdown).
    pub async fn store_with<T: Datum>(&self, config: StoreConfig) -> SdkResult<LoggedStore<T>> {
        let history = self.history_for(&config.table).await?;
        let store = VersionedStore::open(
            Arc::clone(&self.backend),
            Arc::clone(&self.registry),
            config,
        )
        .await?
        .with_sink(history.clone());
        Ok(LoggedStore::new(Arc::new(store), history))
    }

    async fn history_for(&self, table: &str) -> SdkResult<Arc<HistoryLog>> {
        let mut histories = self.histories.lock().await;
        if let Some(history) = histories.get(table) {
            return Ok(Arc::clone(history));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(HistoryError::Shutdown.into());
        }
        let config = HistoryConfig {
            base_table: table.to_string(),
            ..self.config.history.clone()
        };
        let history = Arc::new(
            HistoryLog::open(
                Arc::clone(&self.backend),
                Arc::clone(&self.registry),
                config,
                Arc::clone(&self.clock),
            )
            .await?,
        );
        histories.insert(table.to_string(), Arc::clone(&history));
        Ok(history)
    }

    async fn open_histories(&self) -> Vec<Arc<HistoryLog>> {
        self.histories.lock().await.values().cloned().collect()
    }

    /// Register a schema ahead of any write that uses it.
    pub async fn register(&self, schema: &Schema) -> SdkResult<SchemaId> {
        Ok(self.registry.resolve(schema).await?)
    }

    /// Start a new segment in every open history. Returns the newly active
    /// segments, ordered by table.
    pub async fn roll(&self) -> SdkResult<Vec<Segment>> {
        let mut rolled = Vec::new();
        for history in self.open_histories().await {
            let id = history.roll().await?;
            rolled.push(Segment::new(history.base_table(), id));
        }
        Ok(rolled)
    }

    /// The history log of `table`, if a store on it has been opened.
    pub async fn history(&self, table: &str) -> Option<Arc<HistoryLog>> {
        self.histories.lock().await.get(table).cloned()
    }

    /// Append outcomes summed over every open history.
    pub async fn metrics(&self) -> HistoryMetrics {
        self.open_histories()
            .await
            .iter()
            .map(|history| history.metrics())
            .sum()
    }

    /// Wait for every queued history append to be attempted.
    pub async fn flush(&self) {
        for history in self.open_histories().await {
            history.flush().await;
        }
    }

    /// Drain and stop every history's workers. Existing stores stay usable;
    /// their writes are no longer logged.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        for history in self.open_histories().await {
            history.shutdown().await;
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &TesseraConfig {
        &self.config
    }
}

impl std::fmt::Debug for Tessera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tessera")
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
