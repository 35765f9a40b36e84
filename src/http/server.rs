//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the public router (redirect, spawn, stats report)
//! - Create the hosts API router on its own listener
//! - Wire up middleware (tracing, timeout, request ID, CORS header)
//! - Spawn the stats poller alongside the servers
//! - Stop everything on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin::setup_admin_router;
use crate::config::{RedirectorConfig, SpawnConfig};
use crate::health::StatsPoller;
use crate::http::redirect::redirect_handler;
use crate::http::request::UuidRequestId;
use crate::http::spawn::spawn_handler;
use crate::http::stats::stats_handler;
use crate::load_balancer::{LoadBalancer, WeightedSelector};
use crate::registry::HostRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HostRegistry>,
    pub balancer: Arc<dyn LoadBalancer>,
    pub client: reqwest::Client,
    pub spawn: SpawnConfig,
}

impl AppState {
    pub fn new(
        registry: Arc<HostRegistry>,
        balancer: Arc<dyn LoadBalancer>,
        spawn: SpawnConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tmpnb-redirector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            registry,
            balancer,
            client,
            spawn,
        })
    }
}

/// The public and hosts API servers plus the stats poller.
pub struct HttpServer {
    public: Router,
    api: Router,
    poller: StatsPoller,
}

impl HttpServer {
    /// Create a server with a randomly seeded weighted selector.
    pub fn new(config: RedirectorConfig, registry: Arc<HostRegistry>) -> Result<Self, reqwest::Error> {
        Self::with_balancer(config, registry, Arc::new(WeightedSelector::new()))
    }

    pub fn with_balancer(
        config: RedirectorConfig,
        registry: Arc<HostRegistry>,
        balancer: Arc<dyn LoadBalancer>,
    ) -> Result<Self, reqwest::Error> {
        let poller = StatsPoller::new(registry.clone(), config.poller.clone())?;
        let state = AppState::new(registry, balancer, config.spawn.clone())?;

        Ok(Self {
            public: build_public_router(&config, state.clone()),
            api: setup_admin_router(&config.api, state),
            poller,
        })
    }

    /// Serve both routers and run the poller until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        api_listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %listener.local_addr()?, "Redirect server starting");
        tracing::info!(address = %api_listener.local_addr()?, "Hosts API starting");

        let poller_shutdown = shutdown.resubscribe();
        let poller = tokio::spawn(self.poller.run(poller_shutdown));

        let public = axum::serve(listener, self.public)
            .with_graceful_shutdown(wait_for(shutdown.resubscribe()));
        let api = axum::serve(api_listener, self.api)
            .with_graceful_shutdown(wait_for(shutdown));

        let served = tokio::try_join!(
            async { public.await },
            async { api.await },
        );

        if served.is_err() {
            poller.abort();
        } else if let Err(e) = poller.await {
            tracing::error!(error = %e, "Stats poller task failed");
        }

        served?;
        tracing::info!("HTTP servers stopped");
        Ok(())
    }
}

/// Build the public router: stats report, spawn, and redirect for everything else.
#[allow(deprecated)]
pub fn build_public_router(config: &RedirectorConfig, state: AppState) -> Router {
    let cors = SetResponseHeaderLayer::overriding(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );

    let api = Router::new()
        .route("/stats", get(stats_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/spawn", post(spawn_handler))
        .route("/api/spawn/", post(spawn_handler))
        .layer(cors);

    let router = Router::new()
        .route("/", get(redirect_handler))
        .route("/{*path}", get(redirect_handler))
        .merge(api)
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    with_request_layers(router)
}

/// Request ID, propagated to the response, with a trace span around each request.
pub(crate) fn with_request_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

async fn wait_for(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
}
