//! Queue abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::job::EmailJob;

/// Errors returned by queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue has been closed and accepts no new jobs.
    #[error("queue is closed")]
    Closed,

    /// The bounded in-process queue is at capacity.
    #[error("queue is full")]
    Full,

    /// The backing store rejected or failed the operation.
    #[error("queue backend error: {0}")]
    Backend(String),

    /// A job payload could not be encoded or decoded.
    #[error("job serialization error: {0}")]
    Serialization(String),
}

/// FIFO hand-off buffer between the submission gateway and the worker pool.
///
/// Both backends implement the same state machine: an open queue accepts
/// enqueues and blocks dequeuers until data arrives; a closed queue rejects
/// enqueues but keeps yielding buffered jobs until drained, after which
/// `dequeue` returns `None`. Once closed, a queue never reopens.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Add a job to the tail of the queue.
    ///
    /// On success the job becomes visible to exactly one subsequent
    /// [`dequeue`](Queue::dequeue).
    async fn enqueue(&self, job: EmailJob) -> Result<(), QueueError>;

    /// Remove and return the job at the head of the queue.
    ///
    /// Blocks until a job is available. Returns `None` once the queue is
    /// closed and drained; a `None` is the worker's signal to exit.
    async fn dequeue(&self) -> Option<EmailJob>;

    /// Mark the queue closed. Idempotent; buffered jobs are not lost.
    async fn close(&self);

    /// Whether the queue has been closed.
    ///
    /// May race benignly with a concurrent `close`; only monotonicity is
    /// guaranteed.
    fn is_closed(&self) -> bool;
}
