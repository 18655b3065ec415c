//! Bounded in-process queue.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mailroom_common::Metrics;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::job::EmailJob;
use crate::queue::{Queue, QueueError};

/// Bounded FIFO queue living in process memory.
///
/// Strict enqueue-order delivery; an enqueue into a full buffer fails with
/// [`QueueError::Full`] rather than blocking the submitter.
pub struct MemoryQueue {
    inner: Mutex<VecDeque<EmailJob>>,
    notify: Notify,
    closed: AtomicBool,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl MemoryQueue {
    /// Create a queue holding at most `capacity` buffered jobs.
    #[must_use]
    pub fn new(capacity: usize, metrics: Arc<Metrics>) -> Self {
        metrics.set_queue_depth(0);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
            metrics,
        }
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn enqueue(&self, job: EmailJob) -> Result<(), QueueError> {
        let mut jobs = self.inner.lock().await;

        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        if jobs.len() >= self.capacity {
            return Err(QueueError::Full);
        }

        jobs.push_back(job);
        drop(jobs);

        self.metrics.queue_depth_inc();
        self.notify.notify_waiters();
        Ok(())
    }

    async fn dequeue(&self) -> Option<EmailJob> {
        loop {
            // Register for wakeups before inspecting the buffer so an
            // enqueue between the check and the await is not missed.
            let notified = self.notify.notified();

            {
                let mut jobs = self.inner.lock().await;
                if let Some(job) = jobs.pop_front() {
                    drop(jobs);
                    self.metrics.queue_depth_dec();
                    return Some(job);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return None;
                }
            }

            notified.await;
        }
    }

    async fn close(&self) {
        let jobs = self.inner.lock().await;
        let already_closed = self.closed.swap(true, Ordering::SeqCst);
        let buffered = jobs.len();
        drop(jobs);

        if !already_closed {
            debug!(buffered, "In-memory queue closed");
        }
        self.notify.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
