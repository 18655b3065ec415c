//! Redis integration tests.
//!
//! These tests require a running Redis instance.
//! Run with: `cargo test --test redis_integration -- --ignored`
//!
//! Set `REDIS_URL` environment variable to point to your Redis instance.
//! Default: <redis://localhost:6379>

use std::sync::Arc;
use std::time::Duration;

use mailroom_common::Metrics;
use mailroom_queue::{EmailJob, Queue, RedisQueue};
use uuid::Uuid;

fn get_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

/// A unique list key per test so runs do not interfere.
fn test_key() -> String {
    format!("mailroom:test:{}", Uuid::new_v4())
}

async fn connect(key: &str) -> RedisQueue {
    RedisQueue::connect(&get_redis_url(), key, Arc::new(Metrics::new()))
        .await
        .expect("Failed to connect to Redis")
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_redis_connection() {
    let queue = RedisQueue::connect(
        &get_redis_url(),
        test_key(),
        Arc::new(Metrics::new()),
    )
    .await;
    assert!(queue.is_ok(), "Failed to connect to Redis: {:?}", queue.err());
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_enqueue_dequeue_round_trip() {
    let key = test_key();
    let queue = connect(&key).await;

    let job = EmailJob::new("user@example.com", "Redis test", "Hello from redis");
    queue.enqueue(job.clone()).await.expect("Failed to enqueue");

    let leased = tokio::time::timeout(Duration::from_secs(5), queue.dequeue())
        .await
        .expect("Dequeue timed out")
        .expect("Queue unexpectedly empty");
    assert_eq!(leased, job);
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_fifo_order_across_enqueues() {
    let key = test_key();
    let queue = connect(&key).await;

    for subject in ["first", "second", "third"] {
        queue
            .enqueue(EmailJob::new("user@example.com", subject, "body"))
            .await
            .expect("Failed to enqueue");
    }

    for subject in ["first", "second", "third"] {
        let job = tokio::time::timeout(Duration::from_secs(5), queue.dequeue())
            .await
            .expect("Dequeue timed out")
            .expect("Queue unexpectedly empty");
        assert_eq!(job.subject, subject);
    }
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_never_full_at_volume() {
    let key = test_key();
    let queue = connect(&key).await;

    for i in 0..500 {
        queue
            .enqueue(EmailJob::new("user@example.com", format!("bulk {i}"), "body"))
            .await
            .expect("Unbounded queue should never reject");
    }

    assert_eq!(queue.len().await.expect("llen"), 500);

    // Drain so the test list does not linger.
    queue.close().await;
    while queue.dequeue().await.is_some() {}
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_close_drains_then_yields_none() {
    let key = test_key();
    let queue = connect(&key).await;

    queue
        .enqueue(EmailJob::new("user@example.com", "buffered", "body"))
        .await
        .expect("Failed to enqueue");

    queue.close().await;
    assert!(queue.is_closed());

    assert!(queue.dequeue().await.is_some());
    assert!(queue.dequeue().await.is_none());

    let err = queue
        .enqueue(EmailJob::new("user@example.com", "late", "body"))
        .await;
    assert!(err.is_err(), "Closed queue must reject enqueues");
}
