//! Request-level errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use resibo_core::HistoryError;
use serde::Serialize;
use thiserror::Error;

use crate::drive::DriveError;

/// A request the server refuses to process.
///
/// Per-image problems never end up here; they are reported inside the
/// parse result of that image.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Empty => ApiError::BadRequest(err.to_string()),
            HistoryError::Pdf(e) => ApiError::BadRequest(format!("Could not read history PDF: {}", e)),
        }
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::CredentialsNotFound(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::BadRequest(format!("Failed to access Google Drive folder: {}", other)),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl From<axum::extract::multipart::MultipartRejection> for ApiError {
    fn from(err: axum::extract::multipart::MultipartRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Processing task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resibo_core::PdfError;

    #[test]
    fn test_history_errors_are_client_errors() {
        let empty = ApiError::from(HistoryError::Empty);
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.to_string(), "No transactions found in the PDF.");

        let bad = ApiError::from(HistoryError::Pdf(PdfError::Encrypted));
        assert_eq!(bad.to_string(), "Could not read history PDF: PDF is encrypted");
    }

    #[test]
    fn test_credentials_not_found_detail() {
        let err = ApiError::from(DriveError::CredentialsNotFound("sa.json".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Credentials file not found: 'sa.json'"));
    }
}
