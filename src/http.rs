//! HTTP server for the Prometheus scrape endpoint.
//!
//! Every GET on the metrics path triggers one full scrape of the device; a
//! failed scrape answers with a non-200 status and leaves the server running.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::client::DeviceClient;
use crate::collector::{CollectError, SharedCollector};
use crate::metrics;

/// Application state shared across handlers.
struct AppState<C> {
    collector: SharedCollector<C>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
        }
    }
}

/// Create the HTTP router.
pub fn create_router<C: DeviceClient>(collector: SharedCollector<C>) -> Router {
    let state = AppState { collector };

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the /metrics endpoint: runs one scrape and renders it.
async fn metrics_handler<C: DeviceClient>(State(state): State<AppState<C>>) -> Response {
    match state.collector.collect().await {
        Ok(families) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics::render(&families),
        )
            .into_response(),
        Err(err) => {
            error!(ip_address = %state.collector.ip_address(), error = %err, "Scrape failed");
            let status = match err {
                CollectError::Client(_) => StatusCode::BAD_GATEWAY,
                CollectError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, format!("scrape failed: {}\n", err)).into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server wrapping the collector.
pub struct HttpServer<C> {
    collector: SharedCollector<C>,
    host: String,
    port: u16,
}

impl<C: DeviceClient> HttpServer<C> {
    /// Create a new HTTP server.
    pub fn new(collector: SharedCollector<C>, host: impl Into<String>, port: u16) -> Self {
        Self {
            collector,
            host: host.into(),
            port,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    ///
    /// In-flight scrapes are allowed to finish before the listener closes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.collector);

        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}:{}: {}", self.host, self.port, e))?;

        info!(
            host = %self.host,
            port = self.port,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
