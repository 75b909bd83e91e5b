/// Errors from backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The table has not been created.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Row key exceeds the backend's key length limit.
    #[error("row key of {len} bytes exceeds limit of {max}")]
    KeyTooLong { len: usize, max: usize },

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend rejected or could not serve the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
