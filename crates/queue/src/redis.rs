//! Redis-backed queue.
//!
//! Jobs are JSON payloads on a redis list: `RPUSH` at the tail for enqueue,
//! blocking `BLPOP` at the head for dequeue. The pop is atomic against other
//! consumers sharing the same list, so several service instances can drain
//! one backlog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mailroom_common::Metrics;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::job::EmailJob;
use crate::queue::{Queue, QueueError};

/// How long one `BLPOP` waits server-side before re-arming.
///
/// The wait is semantically indefinite; the short window only exists so a
/// blocked worker notices a local `close` without cancelling an in-flight
/// redis command.
const BLOCK_WINDOW: Duration = Duration::from_secs(1);

/// Pause before retrying after a connection-level dequeue fault.
const BACKOFF_ON_ERROR: Duration = Duration::from_secs(1);

/// Unbounded queue persisted in a redis list.
pub struct RedisQueue {
    /// Connection for non-blocking commands, cloned per operation.
    shared: ConnectionManager,
    /// Dedicated connection for blocking pops. Workers take turns waiting
    /// on it; the hand-off itself stays atomic server-side.
    blocking: Mutex<ConnectionManager>,
    key: String,
    closed: AtomicBool,
    metrics: Arc<Metrics>,
}

impl RedisQueue {
    /// Connect to redis and seed the depth gauge from the existing backlog.
    pub async fn connect(
        url: &str,
        key: impl Into<String>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, QueueError> {
        let key = key.into();
        let client =
            redis::Client::open(url).map_err(|e| QueueError::Backend(e.to_string()))?;

        let shared = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        let blocking = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        let queue = Self {
            shared,
            blocking: Mutex::new(blocking),
            key,
            closed: AtomicBool::new(false),
            metrics,
        };

        match queue.len().await {
            Ok(backlog) => {
                queue.metrics.set_queue_depth(backlog);
                info!(key = %queue.key, backlog, "Connected to redis queue");
            }
            Err(e) => warn!(error = %e, "Failed to read initial redis queue length"),
        }

        Ok(queue)
    }

    /// Current length of the backing list.
    pub async fn len(&self) -> Result<u64, QueueError> {
        let mut conn = self.shared.clone();
        conn.llen(&self.key)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }

    /// Non-blocking pop used to drain the backlog after close.
    async fn pop_now(&self) -> Option<EmailJob> {
        loop {
            let mut conn = self.shared.clone();
            let payload: Option<String> = match conn.lpop(&self.key, None).await {
                Ok(payload) => payload,
                Err(e) => {
                    error!(error = %e, "Failed to drain job from redis");
                    return None;
                }
            };
            match payload {
                None => return None,
                Some(raw) => {
                    if let Some(job) = self.decode(&raw) {
                        return Some(job);
                    }
                }
            }
        }
    }

    fn decode(&self, raw: &str) -> Option<EmailJob> {
        match serde_json::from_str::<EmailJob>(raw) {
            Ok(job) => {
                self.metrics.queue_depth_dec();
                Some(job)
            }
            Err(e) => {
                // Poisoned payload: drop it rather than wedging a worker.
                error!(error = %e, "Discarding undecodable job payload");
                None
            }
        }
    }
}

#[async_trait]
impl Queue for RedisQueue {
    async fn enqueue(&self, job: EmailJob) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }

        let payload =
            serde_json::to_string(&job).map_err(|e| QueueError::Serialization(e.to_string()))?;

        let mut conn = self.shared.clone();
        let _: () = conn
            .rpush(&self.key, payload)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        self.metrics.queue_depth_inc();
        Ok(())
    }

    async fn dequeue(&self) -> Option<EmailJob> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                // Closed: hand out whatever is still buffered, then signal
                // exhaustion with None.
                return self.pop_now().await;
            }

            let popped: Result<Option<(String, String)>, redis::RedisError> = {
                let mut conn = self.blocking.lock().await;
                conn.blpop(&self.key, BLOCK_WINDOW.as_secs_f64()).await
            };

            match popped {
                Ok(Some((_key, raw))) => {
                    if let Some(job) = self.decode(&raw) {
                        return Some(job);
                    }
                }
                // Block window elapsed with nothing queued; re-arm.
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Failed to dequeue job from redis");
                    tokio::time::sleep(BACKOFF_ON_ERROR).await;
                }
            }
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(key = %self.key, "Redis queue closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
