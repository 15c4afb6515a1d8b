//! Core library for Philippine e-wallet receipt OCR.
//!
//! This crate provides:
//! - OCR text line extraction using PaddleOCR models (via `pure-onnx-ocr`)
//! - Provider detection for GCash, Maya (PayMaya) and BDO Pay receipts
//! - Rule-based extraction of reference number, amount and timestamp
//! - Transaction history parsing from exported PDF statements and
//!   receipt-to-history verification

pub mod error;
pub mod history;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod receipt;

pub use error::{ExtractionError, HistoryError, OcrError, PdfError, ResiboError, Result};
pub use history::{HistoryMatcher, HistoryTransaction, MatchResult, Verdict, VerificationReport};
pub use models::config::ResiboConfig;
pub use models::receipt::{BatchResult, ParseResult, Provider, ReceiptFields};
pub use ocr::{ImagePreprocessor, TextLine, TextLineExtractor};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use receipt::{ReceiptParser, ReceiptPipeline};
