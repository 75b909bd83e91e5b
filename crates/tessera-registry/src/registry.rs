use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tessera_backend::{columns, Backend, Row, TableSchema};
use tessera_codec::Schema;
use tessera_types::SchemaId;

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};

/// Column holding the canonical schema text.
pub const PAYLOAD_COLUMN: &str = "payload";

/// Shared registry of schema definitions.
///
/// Lookups go through two concurrent maps (canonical text → id and
/// id → schema). Registration of a new schema holds a lock for that schema
/// id only, so distinct schemas register in parallel.
pub struct SchemaRegistry {
    backend: Arc<dyn Backend>,
    table: String,
    ids: DashMap<String, SchemaId>,
    schemas: DashMap<SchemaId, Arc<Schema>>,
    registering: DashMap<SchemaId, Arc<Mutex<()>>>,
}

impl SchemaRegistry {
    /// Open the registry: ensure the schema table exists and preload every
    /// stored definition.
    pub async fn open(backend: Arc<dyn Backend>, config: RegistryConfig) -> RegistryResult<Self> {
        backend
            .create_table_if_absent(&config.table, &TableSchema::new([PAYLOAD_COLUMN]))
            .await?;
        let registry = Self {
            backend,
            table: config.table,
            ids: DashMap::new(),
            schemas: DashMap::new(),
            registering: DashMap::new(),
        };
        registry.bootstrap().await?;
        Ok(registry)
    }

    async fn bootstrap(&self) -> RegistryResult<()> {
        let rows = self.backend.scan_prefix(&self.table, b"").await?;
        let total = rows.len();
        for row in rows {
            match parse_row(&row) {
                Ok((id, text, schema)) => self.cache(id, text, Arc::new(schema)),
                Err(e) => warn!(
                    table = %self.table,
                    key = %String::from_utf8_lossy(&row.key),
                    error = %e,
                    "skipping corrupt schema row"
                ),
            }
        }
        info!(
            table = %self.table,
            loaded = self.schemas.len(),
            skipped = total - self.schemas.len(),
            "schema registry bootstrapped"
        );
        Ok(())
    }

    /// Return the id for `schema`, persisting it on first use.
    ///
    /// Concurrent calls with the same schema persist it once; every caller
    /// gets the same id.
    pub async fn resolve(&self, schema: &Schema) -> RegistryResult<SchemaId> {
        let text = schema.canonical_form();
        if let Some(id) = self.ids.get(&text) {
            return Ok(*id);
        }

        let id = SchemaId::of_canonical(&text);
        let lock = self
            .registering
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        // Another task may have finished registering while we waited.
        if self.ids.contains_key(&text) {
            return Ok(id);
        }

        let inserted = self
            .backend
            .compare_and_put(
                &self.table,
                id.to_hex().as_bytes(),
                PAYLOAD_COLUMN,
                None,
                columns([(PAYLOAD_COLUMN, text.clone().into_bytes())]),
            )
            .await?;
        debug!(schema = %id.short_hex(), inserted, "schema registered");

        self.cache(id, text, Arc::new(schema.clone()));
        drop(guard);
        self.registering.remove(&id);
        Ok(id)
    }

    /// Parse a JSON definition and [`resolve`](Self::resolve) it.
    pub async fn resolve_text(&self, definition: &str) -> RegistryResult<SchemaId> {
        let schema = Schema::parse_str(definition)?;
        self.resolve(&schema).await
    }

    /// Fetch the schema stored under `id`.
    pub async fn load(&self, id: &SchemaId) -> RegistryResult<Arc<Schema>> {
        if let Some(schema) = self.schemas.get(id) {
            return Ok(Arc::clone(schema.value()));
        }

        let key = id.to_hex();
        let cols = self
            .backend
            .get(&self.table, key.as_bytes())
            .await?
            .ok_or(RegistryError::SchemaNotFound(*id))?;
        let row = Row {
            key: key.into_bytes().into(),
            columns: cols,
        };
        let (_, text, schema) = parse_row(&row)?;
        let schema = Arc::new(schema);
        self.cache(*id, text, Arc::clone(&schema));
        debug!(schema = %id.short_hex(), "schema loaded from backend");
        Ok(schema)
    }

    /// Whether `id` is cached.
    pub fn contains(&self, id: &SchemaId) -> bool {
        self.schemas.contains_key(id)
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Backend table holding the definitions.
    pub fn table(&self) -> &str {
        &self.table
    }

    // The id direction goes first so that anyone who finds the text mapping
    // can already load the schema.
    fn cache(&self, id: SchemaId, text: String, schema: Arc<Schema>) {
        self.schemas.entry(id).or_insert(schema);
        self.ids.insert(text, id);
    }
}

/// Decode and verify one stored schema row.
fn parse_row(row: &Row) -> RegistryResult<(SchemaId, String, Schema)> {
    let key = String::from_utf8_lossy(&row.key).into_owned();
    let corrupt = |reason: String| RegistryError::Corrupt {
        key: key.clone(),
        reason,
    };
    let id = SchemaId::from_hex(&key).map_err(|e| corrupt(e.to_string()))?;
    let payload = row
        .column(PAYLOAD_COLUMN)
        .ok_or_else(|| corrupt("missing payload column".into()))?;
    let text = std::str::from_utf8(payload)
        .map_err(|e| corrupt(format!("payload is not UTF-8: {e}")))?;
    let computed = SchemaId::of_canonical(text);
    if computed != id {
        return Err(RegistryError::HashMismatch { id, computed });
    }
    let schema = Schema::parse_str(text)?;
    Ok((id, text.to_string(), schema))
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("table", &self.table)
            .field("schemas", &self.schemas.len())
            .finish()
    }
}
