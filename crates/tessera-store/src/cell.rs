//! Backend layout of the current value of a key.

use bytes::Bytes;
use tessera_backend::Columns;
use tessera_types::{version_from_bytes, version_to_bytes, Format, SchemaId, Version};

pub const SCHEMA_ID_COLUMN: &str = "schema_id";
pub const DATA_COLUMN: &str = "data";
/// Compare-and-put column.
pub const VERSION_COLUMN: &str = "version";
pub const FORMAT_COLUMN: &str = "format";

pub const COLUMNS: [&str; 4] = [SCHEMA_ID_COLUMN, DATA_COLUMN, VERSION_COLUMN, FORMAT_COLUMN];

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StoredCell {
    pub schema_id: SchemaId,
    pub data: Bytes,
    pub version: Version,
    pub format: Format,
}

impl StoredCell {
    pub fn to_columns(&self) -> Columns {
        let mut cols = Columns::new();
        cols.insert(
            SCHEMA_ID_COLUMN.into(),
            Bytes::copy_from_slice(self.schema_id.as_bytes()),
        );
        cols.insert(DATA_COLUMN.into(), self.data.clone());
        cols.insert(
            VERSION_COLUMN.into(),
            Bytes::copy_from_slice(&version_to_bytes(self.version)),
        );
        cols.insert(
            FORMAT_COLUMN.into(),
            Bytes::copy_from_slice(&[self.format.ordinal()]),
        );
        cols
    }

    pub fn from_columns(cols: &Columns) -> Result<Self, String> {
        let column = |name: &str| {
            cols.get(name)
                .ok_or_else(|| format!("missing `{name}` column"))
        };
        Ok(Self {
            schema_id: SchemaId::from_slice(column(SCHEMA_ID_COLUMN)?).map_err(|e| e.to_string())?,
            data: column(DATA_COLUMN)?.clone(),
            version: read_version(cols)?,
            format: Format::from_column(column(FORMAT_COLUMN)?).map_err(|e| e.to_string())?,
        })
    }
}

/// Read only the version column.
pub(crate) fn read_version(cols: &Columns) -> Result<Version, String> {
    let raw = cols
        .get(VERSION_COLUMN)
        .ok_or_else(|| format!("missing `{VERSION_COLUMN}` column"))?;
    version_from_bytes(raw).map_err(|e| e.to_string())
}
