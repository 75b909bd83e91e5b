use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("backend error: {0}")]
    Backend(#[from] tessera_backend::BackendError),

    #[error("registry error: {0}")]
    Registry(#[from] tessera_registry::RegistryError),

    #[error("store error: {0}")]
    Store(#[from] tessera_store::StoreError),

    #[error("history error: {0}")]
    History(#[from] tessera_history::HistoryError),

    #[error("codec error: {0}")]
    Codec(#[from] tessera_codec::CodecError),

    #[error("invalid input: {0}")]
    Type(#[from] tessera_types::TypeError),
}

impl SdkError {
    /// `true` if a write lost an optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conflict())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
