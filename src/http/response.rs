//! Error responses.
//!
//! # Mapping
//! - No targets configured / all targets down → 503 Service Unavailable,
//!   with a message naming which of the two happened
//! - Invalid host → 400, unknown host → 404, host file write failure → 500

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::load_balancer::SelectError;
use crate::registry::RegistryError;

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Respond with `status` and a JSON error body.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

impl IntoResponse for SelectError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegistryError::InvalidHost(_) => StatusCode::BAD_REQUEST,
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        json_error(status, self.to_string())
    }
}
