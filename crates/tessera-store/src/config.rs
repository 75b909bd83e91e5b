use serde::{Deserialize, Serialize};
use tessera_types::Format;

/// Configuration for a [`VersionedStore`](crate::VersionedStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend table holding the current value of every key.
    pub table: String,
    /// Format new values are written in. Stored values are read in whatever
    /// format they were written with.
    pub format: Format,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "records".into(),
            format: Format::Binary,
        }
    }
}
