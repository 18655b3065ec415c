//! Delivery capability.
//!
//! The dispatch engine only observes success or failure of one attempt;
//! whether that attempt is a real SMTP transaction or a simulated one is
//! decided by configuration.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::job::EmailJob;

/// A single delivery attempt failure.
#[derive(Debug, Error)]
pub enum SendError {
    /// The message could not be constructed from the job.
    #[error("invalid message: {0}")]
    Message(String),

    /// The transport refused or failed the delivery.
    #[error("transport error: {0}")]
    Transport(String),
}

/// External send capability attempted once per job processing pass.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Attempt delivery of one job.
    async fn send(&self, job: &EmailJob) -> Result<(), SendError>;
}

/// Probabilistic sender standing in for a real provider.
pub struct SimulatedSender {
    latency: Duration,
    success_rate: f64,
}

impl SimulatedSender {
    /// Create a sender that sleeps for `latency` and then succeeds with
    /// probability `success_rate` (clamped to `0.0..=1.0`).
    #[must_use]
    pub fn new(latency: Duration, success_rate: f64) -> Self {
        Self {
            latency,
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl Sender for SimulatedSender {
    async fn send(&self, job: &EmailJob) -> Result<(), SendError> {
        tokio::time::sleep(self.latency).await;

        let delivered = rand::thread_rng().gen_bool(self.success_rate);
        if delivered {
            debug!(job_id = %job.id, to = %job.to, "Simulated delivery succeeded");
            Ok(())
        } else {
            Err(SendError::Transport("simulated delivery failure".into()))
        }
    }
}

/// Real SMTP delivery via lettre.
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Build a sender from a relay URL (e.g. `smtp://localhost:25`) and an
    /// envelope sender address.
    pub fn new(url: &str, from: &str) -> Result<Self, SendError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(url)
            .map_err(|e| SendError::Transport(e.to_string()))?
            .build();
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| SendError::Message(format!("invalid from address: {e}")))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Sender for SmtpSender {
    async fn send(&self, job: &EmailJob) -> Result<(), SendError> {
        let to = job
            .to
            .parse::<Mailbox>()
            .map_err(|e| SendError::Message(format!("invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&job.subject)
            .body(job.body.clone())
            .map_err(|e| SendError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(drop)
            .map_err(|e| SendError::Transport(e.to_string()))?;

        debug!(job_id = %job.id, to = %job.to, "Delivered via SMTP");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certain_success_always_delivers() {
        let sender = SimulatedSender::new(Duration::ZERO, 1.0);
        let job = EmailJob::new("user@example.com", "Hi", "Hello");

        for _ in 0..10 {
            assert!(sender.send(&job).await.is_ok());
        }
    }

    #[tokio::test]
    async fn certain_failure_never_delivers() {
        let sender = SimulatedSender::new(Duration::ZERO, 0.0);
        let job = EmailJob::new("user@example.com", "Hi", "Hello");

        for _ in 0..10 {
            assert!(sender.send(&job).await.is_err());
        }
    }

    #[test]
    fn success_rate_is_clamped() {
        let sender = SimulatedSender::new(Duration::ZERO, 1.5);
        assert!((sender.success_rate - 1.0).abs() < f64::EPSILON);
    }
}
