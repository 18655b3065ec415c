//! Common utilities and shared types for mailroom.
//!
//! This crate provides foundational components used across all mailroom crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Metrics**: Queue and delivery counters via [`Metrics`]

pub mod config;
pub mod error;
pub mod metrics;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use metrics::{Metrics, MetricsSnapshot};
