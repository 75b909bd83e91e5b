use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::traits::{Backend, MAX_ROW_KEY_LEN};
use crate::types::{Columns, Order, Query, Row, TableSchema};

struct Table {
    schema: TableSchema,
    rows: BTreeMap<Vec<u8>, Columns>,
}

/// In-memory backend holding every table in a `BTreeMap`.
///
/// Intended for tests and embedding. All tables sit behind one `RwLock`;
/// `compare_and_put` checks and writes under the write lock, so it is atomic
/// against every other writer. Writes can be made to fail on demand with
/// [`InMemoryBackend::set_fail_writes`].
pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
    fail_writes: AtomicBool,
}

impl InMemoryBackend {
    /// Create a backend with no tables.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Sorted names of all tables.
    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read().expect("lock poisoned");
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of rows in a table, or `None` if it does not exist.
    pub fn row_count(&self, table: &str) -> Option<usize> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.get(table).map(|t| t.rows.len())
    }

    /// Column layout a table was created with.
    pub fn table_schema(&self, table: &str) -> Option<TableSchema> {
        let tables = self.tables.read().expect("lock poisoned");
        tables.get(table).map(|t| t.schema.clone())
    }

    /// Make every subsequent write fail with [`BackendError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> BackendResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

fn check_key(key: &[u8]) -> BackendResult<()> {
    if key.len() > MAX_ROW_KEY_LEN {
        return Err(BackendError::KeyTooLong {
            len: key.len(),
            max: MAX_ROW_KEY_LEN,
        });
    }
    Ok(())
}

fn table_not_found(name: &str) -> BackendError {
    BackendError::TableNotFound(name.to_string())
}

fn to_row(key: &[u8], columns: &Columns) -> Row {
    Row {
        key: Bytes::copy_from_slice(key),
        columns: columns.clone(),
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn create_table_if_absent(&self, name: &str, schema: &TableSchema) -> BackendResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.write().expect("lock poisoned");
        if !tables.contains_key(name) {
            tables.insert(
                name.to_string(),
                Table {
                    schema: schema.clone(),
                    rows: BTreeMap::new(),
                },
            );
            debug!(table = name, "created table");
        }
        Ok(())
    }

    async fn get(&self, table: &str, key: &[u8]) -> BackendResult<Option<Columns>> {
        check_key(key)?;
        let tables = self.tables.read().expect("lock poisoned");
        let t = tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(t.rows.get(key).cloned())
    }

    async fn put(&self, table: &str, key: &[u8], columns: Columns) -> BackendResult<()> {
        check_key(key)?;
        self.check_writable()?;
        let mut tables = self.tables.write().expect("lock poisoned");
        let t = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        t.rows.insert(key.to_vec(), columns);
        Ok(())
    }

    async fn compare_and_put(
        &self,
        table: &str,
        key: &[u8],
        column: &str,
        expected: Option<&[u8]>,
        columns: Columns,
    ) -> BackendResult<bool> {
        check_key(key)?;
        self.check_writable()?;
        let mut tables = self.tables.write().expect("lock poisoned");
        let t = tables.get_mut(table).ok_or_else(|| table_not_found(table))?;
        let current = t
            .rows
            .get(key)
            .and_then(|row| row.get(column))
            .map(|v| &v[..]);
        if current != expected {
            return Ok(false);
        }
        t.rows.insert(key.to_vec(), columns);
        Ok(true)
    }

    async fn scan_prefix(&self, table: &str, prefix: &[u8]) -> BackendResult<Vec<Row>> {
        let tables = self.tables.read().expect("lock poisoned");
        let t = tables.get(table).ok_or_else(|| table_not_found(table))?;
        Ok(t.rows
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, cols)| to_row(k, cols))
            .collect())
    }

    async fn scan_tables(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let mut names = self.table_names();
        names.retain(|name| name.starts_with(prefix));
        Ok(names)
    }

    async fn query(&self, table: &str, query: &Query) -> BackendResult<Vec<Row>> {
        let tables = self.tables.read().expect("lock poisoned");
        let t = tables.get(table).ok_or_else(|| table_not_found(table))?;
        let mut rows: Vec<Row> = t
            .rows
            .iter()
            .filter(|(_, cols)| query.matches(cols))
            .map(|(k, cols)| to_row(k, cols))
            .collect();
        drop(tables);

        if let Some((column, order)) = &query.order_by {
            // Stable sort keeps key order among equal column values.
            rows.sort_by(|a, b| {
                let ord = a.column(column).cmp(&b.column(column));
                match order {
                    Order::Ascending => ord,
                    Order::Descending => ord.reverse(),
                }
            });
        }
        Ok(rows)
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("tables", &self.table_names())
            .field("fail_writes", &self.fail_writes.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::columns;

    fn schema() -> TableSchema {
        TableSchema::new(["v"])
    }

    async fn backend_with(table: &str) -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.create_table_if_absent(table, &schema()).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn create_table_is_idempotent() {
        let backend = backend_with("t").await;
        backend
            .put("t", b"k", columns([("v", &b"1"[..])]))
            .await
            .unwrap();
        backend.create_table_if_absent("t", &schema()).await.unwrap();
        assert_eq!(backend.row_count("t"), Some(1));
        assert_eq!(backend.table_schema("t"), Some(schema()));
    }

    #[tokio::test]
    async fn missing_table_is_an_error() {
        let backend = InMemoryBackend::new();
        assert!(matches!(
            backend.get("nope", b"k").await,
            Err(BackendError::TableNotFound(_))
        ));
        assert!(matches!(
            backend.query("nope", &Query::new()).await,
            Err(BackendError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn compare_and_put_absent_then_expected() {
        let backend = backend_with("t").await;
        let v1 = columns([("v", &b"1"[..])]);
        assert!(backend
            .compare_and_put("t", b"k", "v", None, v1.clone())
            .await
            .unwrap());
        assert!(!backend
            .compare_and_put("t", b"k", "v", None, v1.clone())
            .await
            .unwrap());
        assert!(!backend
            .compare_and_put("t", b"k", "v", Some(&b"9"[..]), v1)
            .await
            .unwrap());
        let v2 = columns([("v", &b"2"[..])]);
        assert!(backend
            .compare_and_put("t", b"k", "v", Some(&b"1"[..]), v2.clone())
            .await
            .unwrap());
        assert_eq!(backend.get("t", b"k").await.unwrap(), Some(v2));
    }

    #[tokio::test]
    async fn concurrent_inserts_have_one_winner() {
        let backend = Arc::new(backend_with("t").await);
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend
                    .compare_and_put("t", b"k", "v", None, columns([("v", vec![i])]))
                    .await
                    .unwrap()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn long_keys_are_rejected() {
        let backend = backend_with("t").await;
        let key = vec![b'x'; MAX_ROW_KEY_LEN + 1];
        assert!(matches!(
            backend.put("t", &key, Columns::new()).await,
            Err(BackendError::KeyTooLong { .. })
        ));
        let key = vec![b'x'; MAX_ROW_KEY_LEN];
        backend.put("t", &key, Columns::new()).await.unwrap();
    }

    #[tokio::test]
    async fn scan_prefix_is_ordered_and_bounded() {
        let backend = backend_with("t").await;
        for key in ["b2", "a1", "b1", "c1"] {
            backend
                .put("t", key.as_bytes(), Columns::new())
                .await
                .unwrap();
        }
        let keys: Vec<_> = backend
            .scan_prefix("t", b"b")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec![Bytes::from("b1"), Bytes::from("b2")]);
        assert_eq!(backend.scan_prefix("t", b"").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn scan_tables_filters_by_prefix() {
        let backend = InMemoryBackend::new();
        for name in ["log_2", "log_1", "logger", "other"] {
            backend.create_table_if_absent(name, &schema()).await.unwrap();
        }
        assert_eq!(
            backend.scan_tables("log_").await.unwrap(),
            vec!["log_1".to_string(), "log_2".to_string()]
        );
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let backend = backend_with("t").await;
        for (key, owner, n) in [("r1", "a", 1u8), ("r2", "b", 2), ("r3", "a", 3), ("r4", "a", 2)] {
            backend
                .put(
                    "t",
                    key.as_bytes(),
                    columns([("owner", vec![owner.as_bytes()[0]]), ("n", vec![n])]),
                )
                .await
                .unwrap();
        }
        let query = Query::new()
            .filter_eq("owner", &b"a"[..])
            .order_by("n", Order::Descending);
        let ns: Vec<u8> = backend
            .query("t", &query)
            .await
            .unwrap()
            .iter()
            .map(|r| r.column("n").unwrap()[0])
            .collect();
        assert_eq!(ns, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn failing_writes_leave_state_untouched() {
        let backend = backend_with("t").await;
        backend.set_fail_writes(true);
        assert!(matches!(
            backend.put("t", b"k", Columns::new()).await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(backend
            .compare_and_put("t", b"k", "v", None, Columns::new())
            .await
            .is_err());
        backend.set_fail_writes(false);
        assert_eq!(backend.row_count("t"), Some(0));
    }
}
