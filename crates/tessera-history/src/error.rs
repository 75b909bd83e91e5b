use tessera_backend::BackendError;
use tessera_codec::CodecError;
use tessera_registry::RegistryError;

/// Errors from history log operations.
///
/// Appends never produce these; their failures only show up in
/// [`HistoryMetrics`](crate::HistoryMetrics).
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A segment row is malformed.
    #[error("corrupt history row in {table}: {reason}")]
    Corrupt { table: String, reason: String },

    /// The log has been shut down.
    #[error("history log is shut down")]
    Shutdown,
}

/// Result alias for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
