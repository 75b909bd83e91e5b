use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of append outcomes since the log was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMetrics {
    /// Entries written to a segment.
    pub appended: u64,
    /// Entries dropped because their (key, version) was already in the
    /// active segment.
    pub collisions: u64,
    /// Entries whose backend write failed.
    pub failed: u64,
    /// Entries never queued: queue full or log shut down.
    pub rejected: u64,
}

impl std::ops::Add for HistoryMetrics {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            appended: self.appended + rhs.appended,
            collisions: self.collisions + rhs.collisions,
            failed: self.failed + rhs.failed,
            rejected: self.rejected + rhs.rejected,
        }
    }
}

impl std::iter::Sum for HistoryMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, m| acc + m)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    appended: AtomicU64,
    collisions: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    pub fn appended(&self) {
        self.appended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn collision(&self) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HistoryMetrics {
        HistoryMetrics {
            appended: self.appended.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
