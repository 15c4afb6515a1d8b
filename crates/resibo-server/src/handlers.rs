//! HTTP request handlers for API endpoints

use std::path::PathBuf;

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
};
use resibo_core::history::{HistoryTransaction, parse_statement};
use resibo_core::{BatchResult, ParseResult, ReceiptFields, VerificationReport};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::download::download_image;
use crate::error::ApiError;
use crate::upload::{Upload, UploadForm};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchUrlRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DriveRequest {
    pub folder_id: String,
    /// Falls back to the configured default key file.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

/// One entry of the `receipts_json` array sent to `/verify-parsed`.
///
/// This is the shape of a parse result; unknown keys are ignored.
#[derive(Debug, Deserialize)]
pub struct ParsedReceipt {
    #[serde(default = "unknown_filename")]
    pub filename: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

fn unknown_filename() -> String {
    "unknown".to_string()
}

/// An image ready for OCR, or the failure already recorded for it.
enum Pending {
    Ready { filename: String, bytes: Bytes },
    Failed(ParseResult),
}

impl Pending {
    fn from_upload(upload: Upload, max_file_size: usize) -> Self {
        match upload.validate_image(max_file_size) {
            Ok(()) => Pending::Ready {
                filename: upload.filename,
                bytes: upload.bytes,
            },
            Err(reason) => {
                warn!("{}: rejected upload: {}", upload.filename, reason);
                Pending::Failed(ParseResult::failure(upload.filename, reason))
            }
        }
    }
}

/// Run the pipeline over pending images in order, off the async runtime.
async fn process_pending(state: &AppState, pending: Vec<Pending>) -> Result<Vec<ParseResult>, ApiError> {
    let pipeline = state.pipeline.clone();
    let results = tokio::task::spawn_blocking(move || {
        pending
            .into_iter()
            .map(|p| match p {
                Pending::Ready { filename, bytes } => pipeline.process_bytes(&bytes, &filename),
                Pending::Failed(result) => result,
            })
            .collect::<Vec<_>>()
    })
    .await?;
    Ok(results)
}

fn check_batch_len(len: usize, max: usize, noun: &str) -> Result<(), ApiError> {
    if len == 0 {
        return Err(ApiError::bad_request(format!("No {} provided.", noun)));
    }
    if len > max {
        return Err(ApiError::bad_request(format!("Max {} {} per batch.", max, noun)));
    }
    Ok(())
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

async fn load_history(state: &AppState, form: &mut UploadForm) -> Result<Vec<HistoryTransaction>, ApiError> {
    let pdf = form.take_one("history_pdf")?;
    if !pdf.filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("history_pdf must be a PDF file."));
    }

    let history = tokio::task::spawn_blocking(move || parse_statement(&pdf.bytes)).await??;
    info!(
        "History statement has {} transactions (tolerance {} min)",
        history.len(),
        state.matcher.tolerance_minutes()
    );
    Ok(history)
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Parse one uploaded receipt image.
pub async fn parse_receipt(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let mut form = UploadForm::read(multipart?).await?;
    let upload = form.take_one("file")?;
    info!(request_id = %request_id, filename = %upload.filename, "Parsing receipt");

    let pending = Pending::from_upload(upload, state.config.extraction.max_file_size);
    let result = process_pending(&state, vec![pending])
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("No result produced.".to_string()))?;

    info!(request_id = %request_id, success = result.success, "Receipt parsed");
    Ok(Json(result))
}

/// Parse several uploaded receipt images, keeping upload order.
pub async fn parse_receipts(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let mut form = UploadForm::read(multipart?).await?;
    let uploads = form.take_all("files");
    check_batch_len(uploads.len(), state.config.extraction.max_batch_size, "files")?;
    info!(request_id = %request_id, files = uploads.len(), "Parsing receipt batch");

    let max_file_size = state.config.extraction.max_file_size;
    let pending = uploads
        .into_iter()
        .map(|u| Pending::from_upload(u, max_file_size))
        .collect();
    let batch = BatchResult::from_results(process_pending(&state, pending).await?);

    info!(
        request_id = %request_id,
        successful = batch.successful,
        failed = batch.failed,
        "Batch parsed"
    );
    Ok(Json(batch))
}

async fn fetch_url(state: &AppState, url: &str) -> Pending {
    match download_image(&state.http, url, state.config.extraction.max_file_size).await {
        Ok(image) => Pending::Ready {
            filename: image.filename,
            bytes: image.bytes,
        },
        Err(reason) => {
            warn!("{}", reason);
            Pending::Failed(ParseResult::failure(url, reason))
        }
    }
}

/// Parse one receipt image fetched from a URL.
pub async fn parse_receipt_url(
    State(state): State<AppState>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ParseResult>, ApiError> {
    let request = json_body(payload)?;
    let pending = fetch_url(&state, &request.url).await;
    let result = process_pending(&state, vec![pending])
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("No result produced.".to_string()))?;
    Ok(Json(result))
}

/// Parse several receipt images fetched from URLs.
pub async fn parse_receipts_url(
    State(state): State<AppState>,
    payload: Result<Json<BatchUrlRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let request = json_body(payload)?;
    check_batch_len(request.urls.len(), state.config.extraction.max_batch_size, "URLs")?;

    let mut pending = Vec::with_capacity(request.urls.len());
    for url in &request.urls {
        pending.push(fetch_url(&state, url).await);
    }

    Ok(Json(BatchResult::from_results(process_pending(&state, pending).await?)))
}

/// Parse every image in a Google Drive folder.
pub async fn parse_drive_folder(
    State(state): State<AppState>,
    payload: Result<Json<DriveRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let request = json_body(payload)?;
    let credentials_path = request
        .credentials_path
        .unwrap_or_else(|| state.config.drive.default_credentials_path.clone());
    info!(folder_id = %request.folder_id, "Scanning Drive folder");

    let session = state.drive.connect(&credentials_path).await.map_err(|e| {
        error!("Drive authentication failed: {}", e);
        ApiError::from(e)
    })?;
    let files = session.list_images(&request.folder_id).await.map_err(|e| {
        error!("Drive listing failed for {}: {}", request.folder_id, e);
        ApiError::from(e)
    })?;

    let mut pending = Vec::with_capacity(files.len());
    for file in files {
        match session.download(&file.id).await {
            Ok(bytes) => pending.push(Pending::Ready {
                filename: file.name,
                bytes,
            }),
            Err(e) => {
                warn!("{}: Drive download failed: {}", file.name, e);
                pending.push(Pending::Failed(ParseResult::failure(
                    file.name,
                    format!("Failed to download/process: {}", e),
                )));
            }
        }
    }

    Ok(Json(BatchResult::from_results(process_pending(&state, pending).await?)))
}

/// OCR receipt images and check them against an uploaded history PDF.
pub async fn verify_receipts(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerificationReport>, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;
    let history = load_history(&state, &mut form).await?;

    let uploads = form.take_all("receipts");
    check_batch_len(uploads.len(), state.config.extraction.max_batch_size, "receipts")?;

    let max_file_size = state.config.extraction.max_file_size;
    let pending = uploads
        .into_iter()
        .map(|u| Pending::from_upload(u, max_file_size))
        .collect();
    let parsed = process_pending(&state, pending).await?;

    let report = VerificationReport::from_parse_results(&state.matcher, &parsed, &history);
    info!(
        matched = report.summary.matched,
        mismatch = report.summary.mismatch,
        not_found = report.summary.not_found,
        errors = report.summary.errors,
        "Verification complete"
    );
    Ok(Json(report))
}

/// Check previously parsed receipts against an uploaded history PDF.
pub async fn verify_parsed(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerificationReport>, ApiError> {
    let mut form = UploadForm::read(multipart?).await?;
    let history = load_history(&state, &mut form).await?;

    let receipts_json = form.take_one("receipts_json")?;
    let parsed: Vec<ParsedReceipt> = serde_json::from_str(receipts_json.text()?)
        .map_err(|e| ApiError::bad_request(format!("Invalid receipts_json: {}", e)))?;

    let receipts: Vec<(String, ReceiptFields)> = parsed
        .into_iter()
        .map(|r| {
            (
                r.filename,
                ReceiptFields {
                    transaction_id: r.transaction_id,
                    amount: r.amount,
                    time: r.time,
                },
            )
        })
        .collect();

    Ok(Json(VerificationReport::from_receipts(
        &state.matcher,
        &receipts,
        &history,
    )))
}
