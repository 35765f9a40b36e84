//! Server-side spawn forwarding.
//!
//! `POST /api/spawn` selects a target, POSTs to its spawn endpoint and
//! returns the JSON reply with `url` made absolute against that target.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::http::response::json_error;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::registry::Host;

/// Failure talking to the selected target's spawn endpoint.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("spawn request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("spawn endpoint returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed spawn reply: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("spawn reply has no url")]
    MissingUrl,

    #[error("cannot resolve spawn url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SpawnError {
    pub fn label(&self) -> &'static str {
        match self {
            SpawnError::Upstream(e) if e.is_timeout() => "timeout",
            SpawnError::Upstream(_) => "upstream",
            SpawnError::Status(_) => "status",
            SpawnError::Parse(_) | SpawnError::MissingUrl => "parse",
            SpawnError::InvalidUrl(_) => "url",
        }
    }
}

pub async fn spawn_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.registry.snapshot();
    let host = match state.balancer.select(&snapshot) {
        Ok(host) => host,
        Err(e) => {
            metrics::record_selection(e.label());
            tracing::warn!(hosts = snapshot.len(), error = %e, "No spawn target");
            return json_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string());
        }
    };
    metrics::record_selection("selected");

    match forward_spawn(&state, &host).await {
        Ok(data) => {
            metrics::record_spawn("ok");
            Json(data).into_response()
        }
        Err(e) => {
            metrics::record_spawn(e.label());
            tracing::error!(host = %host, error = %e, "Failed to reach spawn endpoint");
            json_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

async fn forward_spawn(state: &AppState, host: &Host) -> Result<Value, SpawnError> {
    let url = host.join_path(&state.spawn.path);
    let response = state
        .client
        .post(&url)
        .body("")
        .timeout(Duration::from_millis(state.spawn.timeout_ms))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SpawnError::Status(status));
    }

    let body = response.bytes().await?;
    let mut data: Value = serde_json::from_slice(&body)?;
    let relative = data
        .get("url")
        .and_then(Value::as_str)
        .ok_or(SpawnError::MissingUrl)?;
    let absolute = Url::parse(host.as_str())?.join(relative)?;

    if let Some(object) = data.as_object_mut() {
        object.insert("url".to_string(), Value::String(absolute.to_string()));
    }
    Ok(data)
}
