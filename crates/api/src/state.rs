//! Shared application state for API handlers.

use std::sync::Arc;

use mailroom_common::Metrics;
use mailroom_queue::{DeadLetterSink, EmailService};

/// Handles shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Dispatch engine used as the enqueue gateway.
    pub email_service: Arc<EmailService>,
    /// Dead-letter sink, read by the admin listing endpoint.
    pub dead_letters: Arc<DeadLetterSink>,
    /// Metrics collector, read by the `/metrics` endpoint.
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Bundle the shared handles.
    #[must_use]
    pub fn new(
        email_service: Arc<EmailService>,
        dead_letters: Arc<DeadLetterSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            email_service,
            dead_letters,
            metrics,
        }
    }
}
