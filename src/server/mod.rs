//! HTTP API
//!
//! - `POST /analyze` - multipart upload of one source file, returns the
//!   analysis result and persists it
//! - `POST /generate_pdf` - renders a PDF report from a report request
//! - `GET /health` - liveness probe

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{content_disposition, UPLOAD_FIELD};

use crate::analyzers::{build_collector, check_tools, MetricCollector};
use crate::config::{ServerSettings, ServiceConfig};
use crate::store::{open_sink, ReportSink};
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<MetricCollector>,
    pub sink: Arc<dyn ReportSink>,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(
        collector: Arc<MetricCollector>,
        sink: Arc<dyn ReportSink>,
        settings: ServerSettings,
    ) -> Self {
        Self {
            collector,
            sink,
            settings: Arc::new(settings),
        }
    }
}

/// CORS policy admitting exactly the configured frontend origin
fn cors_layer(settings: &ServerSettings) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(settings.allowed_origin())
        .with_context(|| format!("Invalid CORS origin: {}", settings.allowed_origin()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the API router around the given state
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.settings)?;
    let body_limit = state.settings.max_upload_bytes();

    Ok(Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/generate_pdf", post(handlers::generate_pdf))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run the HTTP service until Ctrl-C
pub async fn serve(config: &ServiceConfig) -> Result<()> {
    check_tools(&config.analysis);
    let collector = Arc::new(build_collector(&config.analysis));
    let sink = open_sink(&config.store).await;

    let state = AppState::new(collector, sink, config.server.clone());
    let router = build_router(state)?;

    let bind = config.server.bind();
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
