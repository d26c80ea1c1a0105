//! Router assembly, listener startup and graceful shutdown.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tubescribe_engine::Orchestrator;

use crate::auth::{self, ApiToken};
use crate::handlers;
use crate::request_id::request_id_middleware;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind; 0 picks a free one.
    pub port: u16,
    /// Request bodies above this size get 413.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7860,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Shared application state passed to axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared transcription pipeline.
    pub orchestrator: Arc<Orchestrator>,
    /// Token for `/transcribe`.
    pub auth: Arc<ApiToken>,
    /// Recorder handle; `/metrics` answers 404 without it.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State around a ready orchestrator.
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        auth: ApiToken,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            orchestrator,
            auth: Arc::new(auth),
            metrics,
        }
    }
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let protected = Router::new()
        .route("/transcribe", post(handlers::transcribe))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` is cancelled. Port 0 picks a free port.
pub async fn start(
    config: ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state, config.max_body_bytes);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "tubescribe server started");

    let token = shutdown.clone();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await;
        if let Err(e) = result {
            error!(error = %e, "server exited with error");
        }
        info!("tubescribe server stopped");
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        shutdown,
        server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    /// Bound port, resolved when 0 was requested.
    pub port: u16,
    shutdown: CancellationToken,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.server.await;
    }

    /// Wait for the server task to end (after the shutdown token fires).
    pub async fn wait(self) {
        let _ = self.server.await;
    }
}
