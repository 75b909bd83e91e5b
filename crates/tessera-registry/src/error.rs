use tessera_backend::BackendError;
use tessera_codec::CodecError;
use tessera_types::SchemaId;

/// Errors from schema registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No definition is stored under this id.
    #[error("schema not found: {0}")]
    SchemaNotFound(SchemaId),

    /// The stored definition does not hash to the id it is stored under.
    #[error("hash mismatch for schema {id}: stored definition hashes to {computed}")]
    HashMismatch { id: SchemaId, computed: SchemaId },

    /// A definition failed to parse.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A stored row is malformed.
    #[error("corrupt schema row {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
