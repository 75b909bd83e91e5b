use serde::{Deserialize, Serialize};

/// What an append does when the queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    /// Drop the entry and count it as rejected.
    #[default]
    Reject,
    /// Wait for queue space.
    Block,
}

/// Configuration for the [`HistoryLog`](crate::HistoryLog).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Segment tables are named `<base_table>_<rotation id>`.
    pub base_table: String,
    /// Number of append worker tasks. With more than one, two versions of a
    /// key queued around a roll may land in segments in the opposite order;
    /// a single worker writes entries in the order they were appended.
    pub workers: usize,
    /// Bound on entries waiting for a worker.
    pub queue_capacity: usize,
    pub backpressure: Backpressure,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_table: "records".into(),
            workers: 4,
            queue_capacity: 1024,
            backpressure: Backpressure::Reject,
        }
    }
}
