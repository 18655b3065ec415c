//! Queue integration tests.
//!
//! These tests drive the queue, dispatch engine and worker pool together
//! against the in-process backend, with delivery outcomes forced through a
//! counting test sender.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mailroom_common::{AppError, Metrics};
use mailroom_queue::{
    DeadLetterSink, EmailJob, EmailService, JobProcessor, MemoryQueue, Queue, RetryPolicy,
    SendError, Sender, WorkerPool,
};

/// Sender with a forced outcome and an attempt counter.
struct CountingSender {
    fail: bool,
    sent: AtomicU32,
}

impl CountingSender {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            sent: AtomicU32::new(0),
        })
    }

    fn attempts(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sender for CountingSender {
    async fn send(&self, _job: &EmailJob) -> Result<(), SendError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(SendError::Transport("forced failure".into()))
        } else {
            Ok(())
        }
    }
}

struct Harness {
    queue: Arc<MemoryQueue>,
    dead_letters: Arc<DeadLetterSink>,
    sender: Arc<CountingSender>,
    metrics: Arc<Metrics>,
    service: Arc<EmailService>,
}

fn harness(capacity: usize, fail: bool, retry: RetryPolicy) -> Harness {
    let metrics = Arc::new(Metrics::new());
    let queue = Arc::new(MemoryQueue::new(capacity, metrics.clone()));
    let dead_letters = Arc::new(DeadLetterSink::new());
    let sender = CountingSender::new(fail);
    let service = Arc::new(EmailService::new(
        queue.clone(),
        dead_letters.clone(),
        sender.clone(),
        metrics.clone(),
        retry,
    ));

    Harness {
        queue,
        dead_letters,
        sender,
        metrics,
        service,
    }
}

fn job() -> EmailJob {
    EmailJob::new("user@example.com", "Hello", "A test message")
}

async fn next_job(queue: &MemoryQueue) -> EmailJob {
    tokio::time::timeout(Duration::from_secs(1), queue.dequeue())
        .await
        .expect("dequeue timed out")
        .expect("queue unexpectedly drained")
}

#[tokio::test]
async fn enqueue_then_dequeue_returns_the_same_job() {
    let h = harness(10, false, RetryPolicy::default());
    let submitted = job();

    h.service
        .enqueue_email(submitted.clone())
        .await
        .expect("enqueue");

    let leased = next_job(&h.queue).await;
    assert_eq!(leased, submitted);
    assert_eq!(leased.attempts, 0);
    assert_eq!(h.metrics.snapshot().emails_enqueued, 1);
}

#[tokio::test]
async fn invalid_job_is_rejected_before_the_queue() {
    let h = harness(10, false, RetryPolicy::default());

    let err = h
        .service
        .enqueue_email(EmailJob::new("not-an-address", "Hello", "body"))
        .await
        .expect_err("should fail validation");
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(h.metrics.snapshot().queue_depth, 0);
    assert_eq!(h.metrics.snapshot().emails_enqueued, 0);
}

#[tokio::test]
async fn repeated_failure_dead_letters_after_all_attempts() {
    let h = harness(
        10,
        true,
        RetryPolicy::new(2, Duration::ZERO),
    );

    h.service.enqueue_email(job()).await.expect("enqueue");

    // Initial attempt plus two retries; each retry is re-enqueued by the
    // detached timer, so the next dequeue blocks until it lands.
    for _ in 0..3 {
        let leased = next_job(&h.queue).await;
        h.service.process(leased).await;
    }

    assert_eq!(h.sender.attempts(), 3);

    let entries = h.dead_letters.entries().await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].reason.contains("permanently failed"));
    assert!(entries[0].reason.contains('2'));
    assert_eq!(entries[0].job.attempts, 2);

    let snapshot = h.metrics.snapshot();
    assert_eq!(snapshot.emails_enqueued, 1);
    assert_eq!(snapshot.emails_failed, 3);
    assert_eq!(snapshot.emails_retried, 2);
    assert_eq!(snapshot.emails_dead_lettered, 1);
}

#[tokio::test]
async fn first_attempt_success_is_terminal() {
    let h = harness(10, false, RetryPolicy::default());

    h.service.enqueue_email(job()).await.expect("enqueue");
    let leased = next_job(&h.queue).await;
    h.service.process(leased).await;

    assert_eq!(h.sender.attempts(), 1);
    assert!(h.dead_letters.is_empty().await);

    let snapshot = h.metrics.snapshot();
    assert_eq!(snapshot.emails_processed, 1);
    assert_eq!(snapshot.emails_retried, 0);
    assert_eq!(snapshot.queue_depth, 0);
}

#[tokio::test]
async fn gateway_reports_full_and_closed_distinctly() {
    let h = harness(1, false, RetryPolicy::default());

    h.service.enqueue_email(job()).await.expect("enqueue");

    let err = h
        .service
        .enqueue_email(job())
        .await
        .expect_err("queue is at capacity");
    assert!(matches!(err, AppError::QueueFull));

    h.queue.close().await;
    let err = h
        .service
        .enqueue_email(job())
        .await
        .expect_err("queue is closed");
    assert!(matches!(err, AppError::QueueClosed));
}

#[tokio::test]
async fn failed_re_enqueue_routes_to_dead_letters() {
    let h = harness(10, true, RetryPolicy::new(2, Duration::ZERO));

    h.service.enqueue_email(job()).await.expect("enqueue");
    let leased = next_job(&h.queue).await;

    // Close before the retry timer fires; the re-enqueue must fail and the
    // job must be quarantined with the re-enqueue reason.
    h.queue.close().await;
    h.service.process(leased).await;

    tokio::time::timeout(Duration::from_secs(1), async {
        while h.dead_letters.is_empty().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("dead letter never recorded");

    let entries = h.dead_letters.entries().await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].reason.contains("failed to re-enqueue"));
    assert_eq!(h.metrics.snapshot().emails_dead_lettered, 1);
}

#[tokio::test]
async fn concurrent_dead_letter_stores_lose_nothing() {
    let sink = Arc::new(DeadLetterSink::new());

    let handles: Vec<_> = (0..25)
        .map(|i| {
            let sink = sink.clone();
            tokio::spawn(async move {
                sink.store(job(), format!("failure {i}")).await;
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("store task");
    }

    assert_eq!(sink.len().await, 25);
}

#[tokio::test]
async fn pool_drains_all_jobs_then_exits_cleanly() {
    let h = harness(100, false, RetryPolicy::default());

    let pool = WorkerPool::new(3, h.queue.clone());
    pool.start(h.service.clone() as Arc<dyn JobProcessor>).await;

    for _ in 0..10 {
        h.service.enqueue_email(job()).await.expect("enqueue");
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.metrics.snapshot().emails_processed < 10 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("jobs were not all processed");

    h.queue.close().await;
    pool.stop().await;

    assert_eq!(h.sender.attempts(), 10);
    assert!(h.dead_letters.is_empty().await);

    let snapshot = h.metrics.snapshot();
    assert_eq!(snapshot.emails_processed, 10);
    assert_eq!(snapshot.queue_depth, 0);
    assert!(h.queue.is_closed());
}

#[tokio::test]
async fn stopped_pool_drains_buffered_jobs_before_exiting() {
    let h = harness(100, false, RetryPolicy::default());

    for _ in 0..5 {
        h.service.enqueue_email(job()).await.expect("enqueue");
    }

    // Close before the workers ever run; they must still drain the buffer.
    h.queue.close().await;

    let pool = WorkerPool::new(2, h.queue.clone());
    pool.start(h.service.clone() as Arc<dyn JobProcessor>).await;
    pool.stop().await;

    assert_eq!(h.metrics.snapshot().emails_processed, 5);
    assert_eq!(h.metrics.snapshot().queue_depth, 0);
}
