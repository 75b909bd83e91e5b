use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;

use tessera_backend::{Backend, Order, Query, Row};
use tessera_codec::{decode_datum, Datum};
use tessera_registry::SchemaRegistry;
use tessera_types::{Record, RecordKey};

use crate::error::{HistoryError, HistoryResult};
use crate::segment::{order_segments, parse_entry, Segment, KEY_COLUMN, VERSION_COLUMN};

/// Every logged version of one key, newest first.
///
/// Segments are discovered on the first call to [`next`](Self::next) and
/// queried one at a time, newest segment first; within a segment, rows come
/// back in descending version order. [`rewind`](Self::rewind) starts over,
/// rediscovering segments.
pub struct VersionHistory<T> {
    backend: Arc<dyn Backend>,
    registry: Arc<SchemaRegistry>,
    base_table: String,
    key: RecordKey,
    segments: Option<Vec<Segment>>,
    next_segment: usize,
    rows: VecDeque<(String, Row)>,
    _datum: PhantomData<fn() -> T>,
}

impl<T: Datum> VersionHistory<T> {
    pub(crate) fn new(
        backend: Arc<dyn Backend>,
        registry: Arc<SchemaRegistry>,
        base_table: String,
        key: RecordKey,
    ) -> Self {
        Self {
            backend,
            registry,
            base_table,
            key,
            segments: None,
            next_segment: 0,
            rows: VecDeque::new(),
            _datum: PhantomData,
        }
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// The next older version, or `None` once every segment is exhausted.
    pub async fn next(&mut self) -> HistoryResult<Option<Record<T>>> {
        loop {
            if let Some((table, row)) = self.rows.pop_front() {
                return self.decode(&table, &row).await.map(Some);
            }
            if self.segments.is_none() {
                let prefix = format!("{}_", self.base_table);
                let tables = self.backend.scan_tables(&prefix).await?;
                self.segments = Some(order_segments(&self.base_table, &tables));
            }
            let Some(segment) = self
                .segments
                .as_ref()
                .and_then(|s| s.get(self.next_segment))
                .cloned()
            else {
                return Ok(None);
            };
            self.next_segment += 1;

            let query = Query::new()
                .filter_eq(KEY_COLUMN, self.key.as_bytes().to_vec())
                .order_by(VERSION_COLUMN, Order::Descending);
            let rows = self.backend.query(&segment.table, &query).await?;
            self.rows
                .extend(rows.into_iter().map(|row| (segment.table.clone(), row)));
        }
    }

    /// Start again from the newest segment.
    pub fn rewind(&mut self) {
        self.segments = None;
        self.next_segment = 0;
        self.rows.clear();
    }

    /// Drain the remaining versions into a `Vec`.
    pub async fn into_vec(mut self) -> HistoryResult<Vec<Record<T>>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    async fn decode(&self, table: &str, row: &Row) -> HistoryResult<Record<T>> {
        let entry = parse_entry(row).map_err(|reason| HistoryError::Corrupt {
            table: table.to_string(),
            reason,
        })?;
        let schema = self.registry.load(&entry.schema_id).await?;
        let value = decode_datum::<T>(&entry.payload, &schema, entry.format)?;
        Ok(Record {
            key: entry.key,
            value,
            schema_id: entry.schema_id,
            format: entry.format,
            version: entry.version,
        })
    }
}

impl<T> std::fmt::Debug for VersionHistory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionHistory")
            .field("key", &self.key)
            .field("segments", &self.segments.as_ref().map(Vec::len))
            .field("next_segment", &self.next_segment)
            .field("buffered", &self.rows.len())
            .finish()
    }
}
