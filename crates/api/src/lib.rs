//! HTTP API layer for mailroom.
//!
//! This crate provides the inbound boundary:
//!
//! - **Endpoints**: email submission, dead-letter listing, metrics, health
//! - **Response**: uniform JSON envelope with error codes
//! - **State**: shared handles to the dispatch engine and metrics
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod response;
pub mod state;

pub use endpoints::router;
pub use response::{ApiError, ApiResponse};
pub use state::AppState;
