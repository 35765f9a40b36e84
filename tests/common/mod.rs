//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn start_target(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

/// A target whose `/stats` reports the given capacity.
pub async fn start_stats_target(available: u64, capacity: u64) -> String {
    let body = json!({ "available": available, "capacity": capacity, "version": "0.0.1" });
    start_target(Router::new().route("/stats", get(move || async move { Json(body) }))).await
}

/// A target whose `/stats` answers only after `delay`.
pub async fn start_slow_target(delay: Duration, available: u64, capacity: u64) -> String {
    let router = Router::new().route(
        "/stats",
        get(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({ "available": available, "capacity": capacity }))
        }),
    );
    start_target(router).await
}

/// A target whose `/stats` returns `status` with a plain-text body.
pub async fn start_failing_target(status: StatusCode, body: &'static str) -> String {
    start_target(Router::new().route("/stats", get(move || async move { (status, body) }))).await
}

/// A target that reports capacity and answers spawn requests with a relative url.
pub async fn start_spawning_target(available: u64, capacity: u64) -> String {
    let router = Router::new()
        .route(
            "/stats",
            get(move || async move { Json(json!({ "available": available, "capacity": capacity })) }),
        )
        .route(
            "/api/spawn/",
            post(|| async { Json(json!({ "url": "/user/abc123/tree", "status": "ok" })) }),
        );
    start_target(router).await
}

/// A loopback URL with nothing listening on it.
pub async fn unreachable_target() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Poll `check` every 20ms until it returns true or `within` elapses.
pub async fn eventually<F>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

