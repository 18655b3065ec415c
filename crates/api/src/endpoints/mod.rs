//! API endpoints.

use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod email;

/// Assemble the full API router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new().merge(email::router()).merge(admin::router())
}
