//! Segment naming and row layout.
//!
//! A segment is one backend table named `<base>_<rotation id>`. Each row is
//! one accepted write, keyed by the record key followed by the big-endian
//! version, so a segment holds every version of a key written while it was
//! active and only a repeated (key, version) collides.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tessera_backend::{Columns, Row, TableSchema};
use tessera_types::{
    version_from_bytes, version_to_bytes, Format, LogEntry, RecordKey, SchemaId, Version,
};

pub const KEY_COLUMN: &str = "key";
pub const SCHEMA_ID_COLUMN: &str = "schema_id";
pub const VERSION_COLUMN: &str = "version";
pub const FORMAT_COLUMN: &str = "format";
pub const PAYLOAD_COLUMN: &str = "payload";

pub fn table_schema() -> TableSchema {
    TableSchema::new([
        KEY_COLUMN,
        SCHEMA_ID_COLUMN,
        VERSION_COLUMN,
        FORMAT_COLUMN,
        PAYLOAD_COLUMN,
    ])
}

/// A segment table and its rotation id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub id: u64,
    pub table: String,
}

impl Segment {
    pub fn new(base: &str, id: u64) -> Self {
        Self {
            id,
            table: format!("{base}_{id}"),
        }
    }

    /// Recognise a segment table of `base`. The suffix must be all digits.
    pub fn parse(base: &str, table: &str) -> Option<Self> {
        let suffix = table.strip_prefix(base)?.strip_prefix('_')?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let id = suffix.parse().ok()?;
        Some(Self {
            id,
            table: table.to_string(),
        })
    }
}

/// Keep the segment tables of `base`, newest first.
pub fn order_segments(base: &str, tables: &[String]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = tables
        .iter()
        .filter_map(|t| Segment::parse(base, t))
        .collect();
    segments.sort_by(|a, b| b.id.cmp(&a.id));
    segments
}

/// The segment currently accepting appends.
#[derive(Debug)]
pub(crate) struct ActiveSegment {
    pub segment: Segment,
    pub appended: AtomicU64,
}

impl ActiveSegment {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            appended: AtomicU64::new(0),
        }
    }

    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::SeqCst)
    }
}

/// Row key of an entry: record key followed by the big-endian version.
pub fn row_key(key: &RecordKey, version: Version) -> Vec<u8> {
    let mut row = Vec::with_capacity(key.len() + 8);
    row.extend_from_slice(key.as_bytes());
    row.extend_from_slice(&version_to_bytes(version));
    row
}

pub(crate) fn entry_columns(entry: &LogEntry) -> Columns {
    let mut cols = Columns::new();
    cols.insert(KEY_COLUMN.into(), Bytes::copy_from_slice(entry.key.as_bytes()));
    cols.insert(
        SCHEMA_ID_COLUMN.into(),
        Bytes::copy_from_slice(entry.schema_id.as_bytes()),
    );
    cols.insert(
        VERSION_COLUMN.into(),
        Bytes::copy_from_slice(&version_to_bytes(entry.version)),
    );
    cols.insert(
        FORMAT_COLUMN.into(),
        Bytes::copy_from_slice(&[entry.format.ordinal()]),
    );
    cols.insert(PAYLOAD_COLUMN.into(), entry.payload.clone());
    cols
}

/// Inverse of [`entry_columns`].
pub(crate) fn parse_entry(row: &Row) -> Result<LogEntry, String> {
    let column = |name: &str| {
        row.column(name)
            .ok_or_else(|| format!("missing `{name}` column"))
    };
    Ok(LogEntry {
        key: RecordKey::try_from(&column(KEY_COLUMN)?[..]).map_err(|e| e.to_string())?,
        schema_id: SchemaId::from_slice(column(SCHEMA_ID_COLUMN)?).map_err(|e| e.to_string())?,
        version: version_from_bytes(column(VERSION_COLUMN)?).map_err(|e| e.to_string())?,
        format: Format::from_column(column(FORMAT_COLUMN)?).map_err(|e| e.to_string())?,
        payload: column(PAYLOAD_COLUMN)?.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_names() {
        let segment = Segment::new("records", 1000);
        assert_eq!(segment.table, "records_1000");
        assert_eq!(Segment::parse("records", "records_1000"), Some(segment));
        assert_eq!(Segment::parse("records", "records_"), None);
        assert_eq!(Segment::parse("records", "records_archive"), None);
        assert_eq!(Segment::parse("records", "records_12a"), None);
        assert_eq!(Segment::parse("records", "records"), None);
        assert_eq!(Segment::parse("records", "other_1000"), None);
    }

    #[test]
    fn segments_are_ordered_numerically_newest_first() {
        let tables = vec![
            "records_999".to_string(),
            "records_1000".to_string(),
            "records_old".to_string(),
            "records_20".to_string(),
        ];
        let ids: Vec<u64> = order_segments("records", &tables)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![1000, 999, 20]);
    }

    #[test]
    fn row_keys_separate_versions() {
        let key = RecordKey::try_from("u1").unwrap();
        let v1 = row_key(&key, 1);
        let v2 = row_key(&key, 2);
        assert_ne!(v1, v2);
        assert!(v1 < v2);
        assert_eq!(&v1[..2], b"u1");
        assert_eq!(v1.len(), 10);
    }

    #[test]
    fn entry_columns_roundtrip() {
        let entry = LogEntry {
            key: RecordKey::try_from("k").unwrap(),
            schema_id: SchemaId::of_canonical("\"int\""),
            version: 4,
            format: Format::Text,
            payload: Bytes::from_static(b"7"),
        };
        let row = Row {
            key: Bytes::from(row_key(&entry.key, entry.version)),
            columns: entry_columns(&entry),
        };
        assert_eq!(parse_entry(&row).unwrap(), entry);
    }

    #[test]
    fn parse_entry_reports_missing_columns() {
        let row = Row {
            key: Bytes::from_static(b"k"),
            columns: Columns::new(),
        };
        assert!(parse_entry(&row).unwrap_err().contains("key"));
    }
}
