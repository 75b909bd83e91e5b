use async_trait::async_trait;

use crate::error::BackendResult;
use crate::types::{Columns, Query, Row, TableSchema};

/// Longest row key a backend must accept: a 256-byte record key plus an
/// 8-byte version suffix.
pub const MAX_ROW_KEY_LEN: usize = 264;

/// Storage capability consumed by the registry, the record store and the
/// history log.
///
/// Implementations must satisfy these invariants:
/// - `compare_and_put` is atomic with respect to every other write on the
///   same row.
/// - Row keys and column values are opaque bytes; ordering is byte-wise.
/// - Operations on a table that was never created fail with
///   [`BackendError::TableNotFound`](crate::BackendError::TableNotFound).
/// - Row keys longer than [`MAX_ROW_KEY_LEN`] are rejected.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a table. A no-op if it already exists.
    async fn create_table_if_absent(&self, name: &str, schema: &TableSchema) -> BackendResult<()>;

    /// Read one row. Returns `Ok(None)` if the row does not exist.
    async fn get(&self, table: &str, key: &[u8]) -> BackendResult<Option<Columns>>;

    /// Unconditionally replace a row.
    async fn put(&self, table: &str, key: &[u8], columns: Columns) -> BackendResult<()>;

    /// Replace a row only if `column` currently holds `expected`.
    ///
    /// `expected = None` means the row, or that column of it, must be
    /// absent. Returns `false` without writing when the condition fails.
    async fn compare_and_put(
        &self,
        table: &str,
        key: &[u8],
        column: &str,
        expected: Option<&[u8]>,
        columns: Columns,
    ) -> BackendResult<bool>;

    /// All rows whose key starts with `prefix`, in key order.
    async fn scan_prefix(&self, table: &str, prefix: &[u8]) -> BackendResult<Vec<Row>>;

    /// Names of all tables starting with `prefix`.
    async fn scan_tables(&self, prefix: &str) -> BackendResult<Vec<String>>;

    /// Run a filtered, ordered query against one table.
    async fn query(&self, table: &str, query: &Query) -> BackendResult<Vec<Row>>;
}
