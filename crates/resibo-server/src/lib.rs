//! HTTP API for receipt OCR.
//!
//! Endpoints:
//! - `GET  /health` - liveness and version
//! - `POST /parse-receipt` - one uploaded image (`file`)
//! - `POST /parse-receipts` - several uploaded images (`files`)
//! - `POST /parse-receipt-url` / `POST /parse-receipts-url` - images by URL
//! - `POST /parse-drive-folder` - every image in a Google Drive folder
//! - `POST /verify-receipts` - images checked against a history PDF
//! - `POST /verify-parsed` - earlier parse results checked against a history PDF

pub mod download;
pub mod drive;
pub mod error;
mod handlers;
pub mod upload;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use resibo_core::{HistoryMatcher, ReceiptPipeline, ResiboConfig, TextLineExtractor};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use drive::{DriveClient, DriveError};
pub use error::ApiError;
pub use handlers::HealthResponse;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ReceiptPipeline,
    pub config: Arc<ResiboConfig>,
    pub http: reqwest::Client,
    pub drive: DriveClient,
    pub matcher: HistoryMatcher,
}

impl AppState {
    /// Build the state around an already loaded OCR engine.
    pub fn new(engine: Arc<dyn TextLineExtractor>, config: ResiboConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.download_timeout_secs))
            .build()?;

        Ok(Self {
            pipeline: ReceiptPipeline::from_config(engine, &config),
            drive: DriveClient::new(http.clone(), &config.drive),
            matcher: HistoryMatcher::new(config.extraction.match_time_tolerance_minutes),
            http,
            config: Arc::new(config),
        })
    }
}

/// Build the API router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    // A full batch plus room for the history PDF and form overhead
    let extraction = &state.config.extraction;
    let body_limit = extraction
        .max_file_size
        .saturating_mul(extraction.max_batch_size.saturating_add(2));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/parse-receipt", post(handlers::parse_receipt))
        .route("/parse-receipts", post(handlers::parse_receipts))
        .route("/parse-receipt-url", post(handlers::parse_receipt_url))
        .route("/parse-receipts-url", post(handlers::parse_receipts_url))
        .route("/parse-drive-folder", post(handlers::parse_drive_folder))
        .route("/verify-receipts", post(handlers::verify_receipts))
        .route("/verify-parsed", post(handlers::verify_parsed))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until Ctrl+C or SIGTERM.
pub async fn start_server(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server listening on http://{}", addr);
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Bind `host:port` and serve.
pub async fn run_server(state: AppState) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    start_server(listener, state).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
