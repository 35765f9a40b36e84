//! Hosts API.
//!
//! Served on its own listener (loopback by default). There is no
//! authentication, so it must not be exposed publicly.

pub mod hosts;

use axum::routing::post;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use self::hosts::{add_host, list_hosts, remove_host};
use crate::config::ApiConfig;
use crate::http::server::{with_request_layers, AppState};

pub fn setup_admin_router(config: &ApiConfig, state: AppState) -> Router {
    let router = Router::new()
        .route("/hosts", post(add_host).delete(remove_host).get(list_hosts))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state);

    with_request_layers(router)
}
