//! Email job queue for mailroom.
//!
//! This crate provides the buffering and delivery pipeline:
//!
//! - **Jobs**: validated email send requests with a retry count
//! - **Queue**: FIFO hand-off buffer, in-process bounded or redis-backed
//! - **Dead letter sink**: append-only record of permanently failed jobs
//! - **Dispatch**: per-job attempt, retry and dead-letter decisions
//! - **Workers**: fixed concurrency draining the queue until closed

pub mod dead_letter;
pub mod dispatch;
pub mod job;
pub mod memory;
pub mod queue;
pub mod redis;
pub mod retry;
pub mod sender;
pub mod worker;

pub use dead_letter::{DeadLetterEntry, DeadLetterSink};
pub use dispatch::EmailService;
pub use job::EmailJob;
pub use memory::MemoryQueue;
pub use queue::{Queue, QueueError};
pub use self::redis::RedisQueue;
pub use retry::RetryPolicy;
pub use sender::{SendError, Sender, SimulatedSender, SmtpSender};
pub use worker::{JobProcessor, WorkerPool};
