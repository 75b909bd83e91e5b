//! Time-partitioned version history.
//!
//! Every write accepted by a [`VersionedStore`](tessera_store::VersionedStore)
//! can be mirrored into a [`HistoryLog`]: an append-only log split into
//! segment tables named `<base>_<rotation id>`, where the rotation id is the
//! clock reading (in seconds) when the segment was opened.
//!
//! Appends are asynchronous. They are queued and written by a small worker
//! pool; failures are logged and counted in [`HistoryMetrics`] but never
//! reach the writer. [`HistoryLog::flush`] waits for the queue to drain.
//!
//! [`HistoryLog::read_versions`] walks every segment newest first and yields
//! each version of a key, decoded with the schema it was written with.

pub mod clock;
pub mod config;
pub mod cursor;
pub mod error;
pub mod log;
pub mod metrics;
pub mod segment;

mod pool;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Backpressure, HistoryConfig};
pub use cursor::VersionHistory;
pub use error::{HistoryError, HistoryResult};
pub use log::HistoryLog;
pub use metrics::HistoryMetrics;
pub use segment::Segment;
