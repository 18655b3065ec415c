//! Dispatch engine: attempt, retry, or dead-letter.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use mailroom_common::{AppError, AppResult, Metrics};
use tracing::{info, warn};

use crate::dead_letter::DeadLetterSink;
use crate::job::EmailJob;
use crate::queue::{Queue, QueueError};
use crate::retry::RetryPolicy;
use crate::sender::Sender;
use crate::worker::JobProcessor;

/// Owns the per-job state machine: `pending` becomes `delivered`,
/// `retry-scheduled` (back to `pending` after the delay) or `dead-lettered`.
pub struct EmailService {
    queue: Arc<dyn Queue>,
    dead_letters: Arc<DeadLetterSink>,
    sender: Arc<dyn Sender>,
    metrics: Arc<Metrics>,
    retry: RetryPolicy,
}

impl EmailService {
    /// Wire up the engine against its collaborators.
    #[must_use]
    pub fn new(
        queue: Arc<dyn Queue>,
        dead_letters: Arc<DeadLetterSink>,
        sender: Arc<dyn Sender>,
        metrics: Arc<Metrics>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            dead_letters,
            sender,
            metrics,
            retry,
        }
    }

    /// Validate and submit a job on behalf of the inbound boundary.
    ///
    /// Queue-state failures surface as distinguishable error categories so
    /// the HTTP layer can answer retryable-vs-fatal correctly.
    pub async fn enqueue_email(&self, job: EmailJob) -> AppResult<()> {
        job.validate()?;

        let job_id = job.id;
        let to = job.to.clone();
        match self.queue.enqueue(job).await {
            Ok(()) => {
                info!(job_id = %job_id, to = %to, "Enqueued email job");
                self.metrics.record_enqueued();
                Ok(())
            }
            Err(e) => {
                warn!(job_id = %job_id, to = %to, error = %e, "Failed to enqueue email job");
                self.metrics.record_enqueue_failed();
                Err(match e {
                    QueueError::Closed => AppError::QueueClosed,
                    QueueError::Full => AppError::QueueFull,
                    QueueError::Backend(msg) | QueueError::Serialization(msg) => {
                        AppError::Backend(msg)
                    }
                })
            }
        }
    }

    /// Run one delivery attempt and drive the retry/dead-letter transition.
    ///
    /// Never fails from the worker's point of view; every failure path is
    /// absorbed here.
    pub async fn process(&self, job: EmailJob) {
        info!(
            job_id = %job.id,
            to = %job.to,
            attempt = job.attempts + 1,
            "Processing email job"
        );

        let start = Instant::now();
        let outcome = self.sender.send(&job).await;
        let elapsed = start.elapsed();
        self.metrics.record_attempt(elapsed, outcome.is_ok());

        match outcome {
            Ok(()) => {
                info!(job_id = %job.id, to = %job.to, elapsed_ms = elapsed.as_millis() as u64, "Email delivered");
            }
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    to = %job.to,
                    attempt = job.attempts + 1,
                    error = %e,
                    "Delivery attempt failed"
                );

                if self.retry.should_retry(job.attempts) {
                    self.schedule_retry(job.for_retry());
                } else {
                    self.metrics.record_dead_lettered();
                    self.dead_letters
                        .store(
                            job.clone(),
                            format!("permanently failed after {} retries", job.attempts),
                        )
                        .await;
                }
            }
        }
    }

    /// Arm a one-shot timer that re-enqueues the job after the retry delay.
    ///
    /// Runs detached so the worker slot frees up immediately. A re-enqueue
    /// that fails (queue closed or full by then) is terminal and routes the
    /// job to the dead-letter sink.
    fn schedule_retry(&self, job: EmailJob) {
        self.metrics.record_retried();
        info!(
            job_id = %job.id,
            to = %job.to,
            attempt = job.attempts + 1,
            max_attempts = self.retry.max_retries + 1,
            delay_secs = self.retry.delay.as_secs(),
            "Scheduling retry"
        );

        let queue = self.queue.clone();
        let dead_letters = self.dead_letters.clone();
        let metrics = self.metrics.clone();
        let delay = self.retry.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if let Err(e) = queue.enqueue(job.clone()).await {
                warn!(job_id = %job.id, error = %e, "Failed to re-enqueue for retry");
                metrics.record_dead_lettered();
                dead_letters
                    .store(
                        job.clone(),
                        format!("failed to re-enqueue after {} retries: {e}", job.attempts),
                    )
                    .await;
            }
        });
    }

    /// The dead-letter sink this engine writes to.
    #[must_use]
    pub fn dead_letters(&self) -> Arc<DeadLetterSink> {
        self.dead_letters.clone()
    }
}

#[async_trait]
impl JobProcessor for EmailService {
    async fn process(&self, job: EmailJob) {
        Self::process(self, job).await;
    }
}
