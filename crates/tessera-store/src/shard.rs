use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::store::VersionedStore;

/// A store paired with its routing weight.
///
/// Routing itself happens elsewhere; a shard only carries the two values.
pub struct Shard<T> {
    store: Arc<VersionedStore<T>>,
    weight: f64,
}

impl<T> Shard<T> {
    /// Fails with [`StoreError::InvalidWeight`] unless `weight` is finite and
    /// non-negative.
    pub fn new(store: Arc<VersionedStore<T>>, weight: f64) -> StoreResult<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(StoreError::InvalidWeight(weight));
        }
        Ok(Self { store, weight })
    }

    pub fn store(&self) -> &Arc<VersionedStore<T>> {
        &self.store
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl<T> Clone for Shard<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            weight: self.weight,
        }
    }
}

impl<T> std::fmt::Debug for Shard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard")
            .field("table", &self.store.table())
            .field("weight", &self.weight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tessera_backend::InMemoryBackend;
    use tessera_registry::{RegistryConfig, SchemaRegistry};

    use super::*;
    use crate::config::StoreConfig;
    use crate::store::tests::Person;

    async fn store() -> Arc<VersionedStore<Person>> {
        let backend = Arc::new(InMemoryBackend::new());
        let registry = Arc::new(
            SchemaRegistry::open(backend.clone(), RegistryConfig::default())
                .await
                .unwrap(),
        );
        Arc::new(
            VersionedStore::open(backend, registry, StoreConfig::default())
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn accepts_finite_non_negative_weights() {
        let store = store().await;
        for weight in [0.0, 0.5, 10.0] {
            let shard = Shard::new(Arc::clone(&store), weight).unwrap();
            assert_eq!(shard.weight(), weight);
            assert!(Arc::ptr_eq(shard.store(), &store));
        }
    }

    #[tokio::test]
    async fn rejects_negative_and_non_finite_weights() {
        let store = store().await;
        for weight in [-0.1, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Shard::new(Arc::clone(&store), weight),
                Err(StoreError::InvalidWeight(_))
            ));
        }
    }

    #[tokio::test]
    async fn clones_share_the_store() {
        let shard = Shard::new(store().await, 2.0).unwrap();
        let copy = shard.clone();
        assert!(Arc::ptr_eq(shard.store(), copy.store()));
        assert_eq!(copy.weight(), 2.0);
    }

    #[tokio::test]
    async fn debug_names_the_table() {
        let shard = Shard::new(store().await, 1.5).unwrap();
        let shown = format!("{shard:?}");
        assert!(shown.contains("\"records\""), "{shown}");
        assert!(shown.contains("1.5"), "{shown}");
    }
}
