use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
#[path = "./server.tests.rs"]
mod server_tests;

pub const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Possible errors from the metrics HTTP server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    /// Cannot bind metrics server to the address.
    #[error("cannot bind metrics server to {0}")]
    BindError(String, #[source] std::io::Error),

    /// Metrics server stopped with an error.
    #[error("metrics server failed")]
    ServeError(#[from] std::io::Error),
}

/// Readiness of all metrics stores served by the metrics server.
#[derive(Clone, Default)]
pub struct StoresReadiness(Arc<[Arc<AtomicBool>]>);

impl StoresReadiness {
    /// Creates new [`StoresReadiness`] instance from stores readiness flags.
    pub fn new(flags: impl IntoIterator<Item = Arc<AtomicBool>>) -> Self {
        Self(flags.into_iter().collect())
    }

    /// Returns `true` if every store received the initial list of objects.
    pub fn is_ready(&self) -> bool {
        self.0.iter().all(|flag| flag.load(Ordering::Relaxed))
    }
}

#[derive(Clone)]
struct ServerState {
    registry: Arc<Registry>,
    readiness: StoresReadiness,
}

/// Builds router exposing `/metrics`, `/healthz` and `/readyz` endpoints.
pub fn metrics_router(registry: Arc<Registry>, readiness: StoresReadiness) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(ServerState { registry, readiness })
}

/// Serves metrics from the `registry` on `host:port` until `cancellation_token` is cancelled.
pub async fn serve_metrics(
    registry: Arc<Registry>,
    readiness: StoresReadiness,
    host: &str,
    port: u16,
    cancellation_token: CancellationToken,
) -> Result<(), ServerError> {
    let address = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|error| ServerError::BindError(address.clone(), error))?;
    tracing::info!("Serving custom resource metrics on http://{}/metrics", address);

    serve_metrics_on(listener, registry, readiness, cancellation_token).await
}

/// Serves metrics from the `registry` on already bound `listener` until `cancellation_token` is cancelled.
pub async fn serve_metrics_on(
    listener: TcpListener,
    registry: Arc<Registry>,
    readiness: StoresReadiness,
    cancellation_token: CancellationToken,
) -> Result<(), ServerError> {
    axum::serve(listener, metrics_router(registry, readiness))
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await })
        .await?;

    Ok(())
}

async fn metrics(State(state): State<ServerState>) -> Response {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => ([(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body).into_response(),
        Err(error) => {
            tracing::error!("Cannot encode metrics: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<ServerState>) -> (StatusCode, &'static str) {
    if state.readiness.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "metrics stores are not synced yet")
    }
}
