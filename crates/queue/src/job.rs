//! Email job model.

use mailroom_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

/// One email send request with its retry count.
///
/// A job is immutable once enqueued; a retry produces a copy with the
/// attempt count bumped via [`EmailJob::for_retry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Unique job id, assigned at creation.
    pub id: Uuid,
    /// Recipient address.
    pub to: String,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Number of delivery attempts already made.
    pub attempts: u32,
}

impl EmailJob {
    /// Create a new job with a fresh id and zero attempts.
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attempts: 0,
        }
    }

    /// Check that the job is queue-eligible.
    ///
    /// The recipient must be a syntactically valid email address and the
    /// subject and body must be non-empty.
    pub fn validate(&self) -> AppResult<()> {
        if self.to.is_empty() {
            return Err(AppError::Validation("recipient 'to' is required".into()));
        }
        if self.subject.is_empty() {
            return Err(AppError::Validation("subject is required".into()));
        }
        if self.body.is_empty() {
            return Err(AppError::Validation("body is required".into()));
        }
        if !self.to.validate_email() {
            return Err(AppError::Validation(format!(
                "invalid email address: {}",
                self.to
            )));
        }
        Ok(())
    }

    /// Copy of this job scheduled for one more attempt.
    #[must_use]
    pub fn for_retry(&self) -> Self {
        let mut job = self.clone();
        job.attempts += 1;
        job
    }
}
