use tessera_backend::BackendError;
use tessera_codec::CodecError;
use tessera_registry::RegistryError;
use tessera_types::{RecordKey, TypeError, Version};

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored version did not match the expected one. Re-read and retry.
    #[error("version conflict on {key}: expected version {expected}")]
    Conflict { key: RecordKey, expected: Version },

    /// The value does not conform to its schema, or the stored payload does
    /// not decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Schema resolution failed, including an unknown stored schema id.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The backend failed. Never retried here.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A stored cell is malformed.
    #[error("corrupt cell {key}: {reason}")]
    Corrupt { key: RecordKey, reason: String },

    #[error(transparent)]
    Type(#[from] TypeError),

    /// Shard weights must be finite and non-negative.
    #[error("invalid shard weight: {0}")]
    InvalidWeight(f64),
}

impl StoreError {
    /// Whether this is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
