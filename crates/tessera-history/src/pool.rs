use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tessera_types::LogEntry;

use crate::config::Backpressure;

/// Outcome of handing an entry to the pool.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Submit {
    Queued,
    /// Queue full under [`Backpressure::Reject`].
    Full(LogEntry),
    /// The pool has been shut down.
    Closed(LogEntry),
}

/// Entries handed to the pool and not yet processed.
#[derive(Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

impl Pending {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Bounded queue drained by a fixed set of worker tasks.
pub(crate) struct AppendPool {
    sender: Mutex<Option<mpsc::Sender<LogEntry>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pending: Arc<Pending>,
    backpressure: Backpressure,
}

impl AppendPool {
    /// Start `workers` tasks, each running `handler` on one entry at a time.
    pub fn spawn<F, Fut>(
        workers: usize,
        capacity: usize,
        backpressure: Backpressure,
        handler: F,
    ) -> Self
    where
        F: Fn(LogEntry) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let handler = Arc::new(handler);
        let pending = Arc::new(Pending::default());

        let handles = (0..workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let handler = Arc::clone(&handler);
                let pending = Arc::clone(&pending);
                tokio::spawn(async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(entry) = next else { break };
                        handler(entry).await;
                        pending.done();
                    }
                    debug!(worker, "history worker stopped");
                })
            })
            .collect();

        Self {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
            pending,
            backpressure,
        }
    }

    pub async fn submit(&self, entry: LogEntry) -> Submit {
        let sender = self.sender.lock().expect("pool lock poisoned").clone();
        let Some(sender) = sender else {
            return Submit::Closed(entry);
        };

        self.pending.add();
        let outcome = match self.backpressure {
            Backpressure::Reject => match sender.try_send(entry) {
                Ok(()) => Submit::Queued,
                Err(mpsc::error::TrySendError::Full(entry)) => Submit::Full(entry),
                Err(mpsc::error::TrySendError::Closed(entry)) => Submit::Closed(entry),
            },
            Backpressure::Block => match sender.send(entry).await {
                Ok(()) => Submit::Queued,
                Err(mpsc::error::SendError(entry)) => Submit::Closed(entry),
            },
        };
        if outcome != Submit::Queued {
            self.pending.done();
        }
        outcome
    }

    /// Wait until every queued entry has been processed.
    pub async fn flush(&self) {
        loop {
            let mut idle = pin!(self.pending.idle.notified());
            idle.as_mut().enable();
            if self.pending.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Close the queue, let the workers drain it, and wait for them.
    ///
    /// Returns `false` if the pool was already shut down.
    pub async fn shutdown(&self) -> bool {
        let sender = self.sender.lock().expect("pool lock poisoned").take();
        if sender.is_none() {
            return false;
        }
        drop(sender);

        let handles = std::mem::take(&mut *self.workers.lock().expect("pool lock poisoned"));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "history worker panicked");
            }
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().expect("pool lock poisoned").is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tessera_types::{Format, RecordKey, SchemaId};
    use tokio::sync::Semaphore;

    use super::*;

    fn entry(version: u64) -> LogEntry {
        LogEntry {
            key: RecordKey::try_from("k").unwrap(),
            schema_id: SchemaId::of_canonical("\"null\""),
            version,
            format: Format::Binary,
            payload: Bytes::new(),
        }
    }

    fn counting_pool(
        workers: usize,
        capacity: usize,
        backpressure: Backpressure,
        gate: Arc<Semaphore>,
    ) -> (AppendPool, Arc<AtomicUsize>) {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let pool = AppendPool::spawn(workers, capacity, backpressure, move |_entry| {
            let gate = Arc::clone(&gate);
            let counter = Arc::clone(&counter);
            async move {
                gate.acquire().await.expect("gate closed").forget();
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (pool, seen)
    }

    #[tokio::test]
    async fn flush_waits_for_all_entries() {
        let gate = Arc::new(Semaphore::new(usize::MAX >> 4));
        let (pool, seen) = counting_pool(3, 64, Backpressure::Reject, gate);
        for v in 0..50 {
            assert_eq!(pool.submit(entry(v)).await, Submit::Queued);
        }
        pool.flush().await;
        assert_eq!(seen.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn flush_on_idle_pool_returns() {
        let (pool, _) = counting_pool(1, 1, Backpressure::Reject, Arc::new(Semaphore::new(0)));
        pool.flush().await;
    }

    #[tokio::test]
    async fn full_queue_rejects() {
        let gate = Arc::new(Semaphore::new(0));
        let (pool, seen) = counting_pool(1, 1, Backpressure::Reject, Arc::clone(&gate));

        assert_eq!(pool.submit(entry(1)).await, Submit::Queued);
        // Let the worker take the first entry off the queue.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.submit(entry(2)).await, Submit::Queued);
        assert_eq!(pool.submit(entry(3)).await, Submit::Full(entry(3)));

        gate.add_permits(2);
        pool.flush().await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blocking_submit_waits_for_space() {
        let gate = Arc::new(Semaphore::new(0));
        let (pool, seen) = counting_pool(1, 1, Backpressure::Block, Arc::clone(&gate));
        let pool = Arc::new(pool);

        pool.submit(entry(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.submit(entry(2)).await;

        let blocked = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.submit(entry(3)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!blocked.is_finished());

        gate.add_permits(3);
        assert_eq!(blocked.await.unwrap(), Submit::Queued);
        pool.flush().await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn shutdown_drains_then_closes() {
        let gate = Arc::new(Semaphore::new(usize::MAX >> 4));
        let (pool, seen) = counting_pool(2, 16, Backpressure::Reject, gate);
        for v in 0..10 {
            pool.submit(entry(v)).await;
        }
        assert!(pool.shutdown().await);
        assert_eq!(seen.load(Ordering::SeqCst), 10);
        assert!(pool.is_closed());
        assert_eq!(pool.submit(entry(11)).await, Submit::Closed(entry(11)));
        assert!(!pool.shutdown().await);
        pool.flush().await;
    }
}
