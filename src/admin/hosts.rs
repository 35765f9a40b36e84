//! Hosts API handlers.
//!
//! Bodies are `{"host": "<url>"}`. The content type is not checked so plain
//! `curl -d` works.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::response::json_error;
use crate::http::server::AppState;
use crate::http::stats::PoolReport;

#[derive(Debug, Deserialize)]
pub struct HostRequest {
    pub host: String,
}

#[derive(Debug, Serialize)]
pub struct HostResponse {
    pub host: String,
}

fn parse_body(body: &[u8]) -> Result<HostRequest, Response> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(error = %e, "Bad hosts request body");
        json_error(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    })
}

/// `POST /hosts`: register a target and schedule a poll.
pub async fn add_host(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_body(&body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.registry.add(&request.host) {
        Ok(host) => Json(HostResponse { host: host.to_string() }).into_response(),
        Err(e) => {
            tracing::error!(host = %request.host, error = %e, "Failed to add host");
            e.into_response()
        }
    }
}

/// `DELETE /hosts`: unregister a target.
pub async fn remove_host(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_body(&body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.registry.remove(&request.host) {
        Ok(host) => Json(HostResponse { host: host.to_string() }).into_response(),
        Err(e) => {
            tracing::warn!(host = %request.host, error = %e, "Failed to remove host");
            e.into_response()
        }
    }
}

/// `GET /hosts`: the same report as the public `/stats`.
pub async fn list_hosts(State(state): State<AppState>) -> Response {
    let snapshot = state.registry.snapshot();
    Json(PoolReport::from_snapshot(&snapshot)).into_response()
}
