use serde::{Deserialize, Serialize};
use tessera_history::HistoryConfig;
use tessera_registry::RegistryConfig;
use tessera_store::StoreConfig;

/// Configuration for every part of a [`Tessera`](crate::Tessera) handle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    pub registry: RegistryConfig,
    /// Used by [`Tessera::store`](crate::Tessera::store).
    pub store: StoreConfig,
    /// Settings for every store's history log. `base_table` is replaced by
    /// the store's own table, so each table keeps a separate history.
    pub history: HistoryConfig,
}
