//! Capacity-weighted redirect.
//!
//! `GET /<path>` answers `302 Found` pointing at `<selected host>/<path>`.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn redirect_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path();
    let snapshot = state.registry.snapshot();

    match state.balancer.select(&snapshot) {
        Ok(host) => {
            metrics::record_selection("selected");
            let location = host.join_path(path);
            tracing::debug!(
                request_id = %request_id(&request),
                host = %host,
                location = %location,
                "Redirecting"
            );
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Err(e) => {
            metrics::record_selection(e.label());
            tracing::warn!(
                request_id = %request_id(&request),
                path = %path,
                hosts = snapshot.len(),
                error = %e,
                "No redirect target"
            );
            e.into_response()
        }
    }
}
