//! HTTP Server and Scrape Entry Point
//!
//! This module implements the Prometheus exporter HTTP server.
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Runs one scrape cycle and returns Prometheus text format
//! - `GET /healthz` - Liveness check; answers without probing any device
//!
//! # Scrape Model
//!
//! Collection is pull-based: each `/metrics` request drives exactly one
//! scrape pass, mirroring how Prometheus schedules scraping. There is no
//! background collection loop. Concurrent requests each run an
//! independent pass; the cooldown tracker inside the engine is the only
//! state shared between them.
//!
//! # Error Handling
//!
//! Per-device probe failures are folded into the snapshot and can never
//! fail the endpoint. Only a metrics rendering failure maps to a 500.

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::scrape::discovery::Discovery;
use crate::scrape::probe::SmartctlRunner;
use crate::scrape::ScrapeEngine;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    metrics: MetricsCollector,
    engine: Arc<ScrapeEngine<Discovery, SmartctlRunner>>,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;
    let engine = Arc::new(ScrapeEngine::new(
        &config.probe,
        Discovery::new(),
        SmartctlRunner::new(&config.probe),
    ));

    let state = AppState { metrics, engine };

    // Build the router
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>Disk Status Exporter</title></head>
<body>
<h1>Disk Status Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/healthz">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.engine.scrape().await;
    state.metrics.apply(&snapshot);

    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn healthz_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
