//! Dead letter sink for permanently failed jobs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::error;

use crate::job::EmailJob;

/// One quarantined job with the reason it ended up here.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetterEntry {
    /// The failed job.
    pub job: EmailJob,
    /// Why the job was quarantined.
    pub reason: String,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl DeadLetterEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(job: EmailJob, reason: impl Into<String>) -> Self {
        Self {
            job,
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only in-process store of jobs that exhausted their retries.
///
/// Entries are never mutated or evicted here; export and retention belong
/// to whoever reads [`DeadLetterSink::entries`].
#[derive(Debug, Default)]
pub struct DeadLetterSink {
    entries: Mutex<Vec<DeadLetterEntry>>,
}

impl DeadLetterSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failed job. Safe under concurrent calls from many workers.
    pub async fn store(&self, job: EmailJob, reason: impl Into<String>) {
        let entry = DeadLetterEntry::new(job, reason);
        error!(
            job_id = %entry.job.id,
            to = %entry.job.to,
            attempts = entry.job.attempts,
            reason = %entry.reason,
            "Job moved to dead letter sink"
        );

        let mut entries = self.entries.lock().await;
        entries.push(entry);
    }

    /// Snapshot of all entries, oldest first.
    pub async fn entries(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().await.clone()
    }

    /// Number of quarantined jobs.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the sink holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_are_appended_in_order() {
        let sink = DeadLetterSink::new();
        let job = EmailJob::new("user@example.com", "Hi", "Hello");

        sink.store(job.clone(), "first").await;
        sink.store(job, "second").await;

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].reason, "first");
        assert_eq!(entries[1].reason, "second");
    }
}
