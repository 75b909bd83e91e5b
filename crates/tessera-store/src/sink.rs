use async_trait::async_trait;
use tessera_types::LogEntry;

/// Receiver of every write the store accepts.
///
/// Called after a successful compare-and-put, with the already-encoded
/// payload. Implementations hand the entry off and return; they have no way
/// to fail the write that produced it.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, entry: LogEntry);
}
