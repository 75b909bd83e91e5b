use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use tessera_backend::Backend;
use tessera_codec::Datum;
use tessera_registry::SchemaRegistry;
use tessera_store::HistorySink;
use tessera_types::{LogEntry, RecordKey};

use crate::clock::Clock;
use crate::config::HistoryConfig;
use crate::cursor::VersionHistory;
use crate::error::{HistoryError, HistoryResult};
use crate::metrics::{Counters, HistoryMetrics};
use crate::pool::{AppendPool, Submit};
use crate::segment::{
    entry_columns, order_segments, row_key, table_schema, ActiveSegment, Segment, KEY_COLUMN,
};

/// Append-only history of every accepted write, split into segments.
///
/// Exactly one segment is active at a time. Appends are queued and written
/// by background workers into the active segment; [`roll`](Self::roll)
/// switches to a new segment. Each worker holds the shared side of the
/// rotation lock for the whole insert and a roll takes the exclusive side,
/// so a roll waits for in-flight appends to land in the old segment and
/// appends queued behind it land in the new one.
pub struct HistoryLog {
    inner: Arc<LogInner>,
    pool: AppendPool,
}

struct LogInner {
    backend: Arc<dyn Backend>,
    registry: Arc<SchemaRegistry>,
    base_table: String,
    clock: Arc<dyn Clock>,
    active: RwLock<ActiveSegment>,
    rolling: Mutex<()>,
    counters: Counters,
}

impl HistoryLog {
    /// Open the log: create a segment for the current time, make it active
    /// and start the append workers.
    pub async fn open(
        backend: Arc<dyn Backend>,
        registry: Arc<SchemaRegistry>,
        config: HistoryConfig,
        clock: Arc<dyn Clock>,
    ) -> HistoryResult<Self> {
        let first = Segment::new(&config.base_table, clock.now_secs());
        backend
            .create_table_if_absent(&first.table, &table_schema())
            .await?;
        info!(
            segment = %first.table,
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            backpressure = ?config.backpressure,
            "history log opened"
        );

        let inner = Arc::new(LogInner {
            backend,
            registry,
            base_table: config.base_table,
            clock,
            active: RwLock::new(ActiveSegment::new(first)),
            rolling: Mutex::new(()),
            counters: Counters::default(),
        });
        let worker_inner = Arc::clone(&inner);
        let pool = AppendPool::spawn(
            config.workers,
            config.queue_capacity,
            config.backpressure,
            move |entry| {
                let inner = Arc::clone(&worker_inner);
                async move { inner.write(entry).await }
            },
        );
        Ok(Self { inner, pool })
    }

    /// Start a new segment named after the current time and make it active.
    ///
    /// Returns the new rotation id. Rolling twice within one second reuses
    /// the same segment and resets its append counter.
    pub async fn roll(&self) -> HistoryResult<u64> {
        if self.pool.is_closed() {
            return Err(HistoryError::Shutdown);
        }
        let _rolling = self.inner.rolling.lock().await;

        let segment = Segment::new(&self.inner.base_table, self.inner.clock.now_secs());
        self.inner
            .backend
            .create_table_if_absent(&segment.table, &table_schema())
            .await?;

        let id = segment.id;
        let mut active = self.inner.active.write().await;
        let previous = std::mem::replace(&mut *active, ActiveSegment::new(segment));
        info!(
            segment = %active.segment.table,
            previous = %previous.segment.table,
            previous_appended = previous.appended(),
            "history segment rolled"
        );
        Ok(id)
    }

    /// Queue an entry for the active segment.
    ///
    /// Never waits for the write. Under [`Backpressure::Block`] it waits
    /// for queue space; otherwise a full queue drops the entry.
    ///
    /// [`Backpressure::Block`]: crate::Backpressure::Block
    pub async fn append(&self, entry: LogEntry) {
        match self.pool.submit(entry).await {
            Submit::Queued => {}
            Submit::Full(entry) => {
                self.inner.counters.rejected();
                warn!(key = %entry.key, version = entry.version, "history queue full; entry dropped");
            }
            Submit::Closed(entry) => {
                self.inner.counters.rejected();
                warn!(key = %entry.key, version = entry.version, "history log shut down; entry dropped");
            }
        }
    }

    /// Every logged version of `key`, newest segment first and descending
    /// version within a segment.
    ///
    /// Versions come out strictly descending as long as each version was
    /// written no later than its successor. With several workers, two
    /// versions queued around a [`roll`](Self::roll) can be written in the
    /// opposite order and then read back out of order; configure one worker
    /// when that matters.
    pub fn read_versions<T: Datum>(&self, key: &RecordKey) -> VersionHistory<T> {
        VersionHistory::new(
            Arc::clone(&self.inner.backend),
            Arc::clone(&self.inner.registry),
            self.inner.base_table.clone(),
            key.clone(),
        )
    }

    /// All segments of this log, newest first.
    pub async fn segments(&self) -> HistoryResult<Vec<Segment>> {
        let prefix = format!("{}_", self.inner.base_table);
        let tables = self.inner.backend.scan_tables(&prefix).await?;
        Ok(order_segments(&self.inner.base_table, &tables))
    }

    pub async fn active_segment(&self) -> Segment {
        self.inner.active.read().await.segment.clone()
    }

    /// Entries written to the active segment since it became active.
    pub async fn appended_in_active(&self) -> u64 {
        self.inner.active.read().await.appended()
    }

    pub fn metrics(&self) -> HistoryMetrics {
        self.inner.counters.snapshot()
    }

    pub fn base_table(&self) -> &str {
        &self.inner.base_table
    }

    /// Wait until every queued entry has been attempted.
    pub async fn flush(&self) {
        self.pool.flush().await;
    }

    /// Stop accepting entries, write everything already queued and stop the
    /// workers. Later appends are counted as rejected.
    pub async fn shutdown(&self) {
        if self.pool.shutdown().await {
            info!(base_table = %self.inner.base_table, "history log shut down");
        }
    }
}

impl LogInner {
    async fn write(&self, entry: LogEntry) {
        let active = self.active.read().await;
        let table = &active.segment.table;
        let result = self
            .backend
            .compare_and_put(
                table,
                &row_key(&entry.key, entry.version),
                KEY_COLUMN,
                None,
                entry_columns(&entry),
            )
            .await;
        match result {
            Ok(true) => {
                active.appended.fetch_add(1, Ordering::SeqCst);
                self.counters.appended();
                debug!(segment = %table, key = %entry.key, version = entry.version, "history entry appended");
            }
            Ok(false) => {
                self.counters.collision();
                warn!(segment = %table, key = %entry.key, version = entry.version, "history entry already present; dropped");
            }
            Err(e) => {
                self.counters.failed();
                warn!(segment = %table, key = %entry.key, version = entry.version, error = %e, "history append failed");
            }
        }
    }
}

#[async_trait]
impl HistorySink for HistoryLog {
    async fn record(&self, entry: LogEntry) {
        self.append(entry).await;
    }
}

impl std::fmt::Debug for HistoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLog")
            .field("base_table", &self.inner.base_table)
            .field("metrics", &self.metrics())
            .finish()
    }
}
