use serde::{Deserialize, Serialize};

/// Configuration for the [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Backend table holding schema definitions.
    pub table: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            table: "schema".into(),
        }
    }
}
