//! Email submission endpoint.

use axum::{Json, Router, extract::State, routing::post};
use mailroom_common::AppResult;
use mailroom_queue::EmailJob;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{response::ApiResponse, state::AppState};

/// Email submission request.
#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    /// Recipient address.
    #[validate(email)]
    pub to: String,

    /// Message subject.
    #[validate(length(min = 1, max = 998))]
    pub subject: String,

    /// Message body.
    #[validate(length(min = 1))]
    pub body: String,
}

/// Email submission response.
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    /// Id assigned to the accepted job.
    pub id: Uuid,
    /// Always `"accepted"`; the eventual outcome is fire-and-forget.
    pub status: &'static str,
}

/// Accept an email job for asynchronous delivery.
///
/// Returns 202 on acceptance; submission is the only caller-visible
/// signal, there is no per-job delivery status endpoint.
async fn send_email(
    State(state): State<AppState>,
    Json(req): Json<SendEmailRequest>,
) -> AppResult<ApiResponse<SendEmailResponse>> {
    req.validate()?;

    let job = EmailJob::new(req.to, req.subject, req.body);
    let id = job.id;
    state.email_service.enqueue_email(job).await?;

    Ok(ApiResponse::accepted(SendEmailResponse {
        id,
        status: "accepted",
    }))
}

/// Routes for email submission.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/emails", post(send_email))
}
