//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    #[serde(skip)]
    status: StatusCode,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Create a success response carried with 202, for work accepted but
    /// not yet performed.
    pub const fn accepted(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::ACCEPTED,
        }
    }

    /// Create an error response.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
