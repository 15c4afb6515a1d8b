//! Error types for the resibo-core library.

use thiserror::Error;

/// Main error type for the resibo library.
#[derive(Error, Debug)]
pub enum ResiboError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Receipt field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Transaction history error.
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// Image decoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The engine failed while recognizing text.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The engine panicked; the message is whatever the panic carried.
    #[error("OCR engine panicked: {0}")]
    Panicked(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Reasons a receipt parse ends with `success == false`.
///
/// The `Display` strings are returned verbatim in the `error` field of a
/// parse result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// OCR produced no lines at all.
    #[error("No text detected in image.")]
    NoText,

    /// None of the provider keyword sets matched.
    #[error("Could not identify provider.")]
    UnknownProvider,

    /// One or more required fields were not found.
    #[error("Could not extract required fields: {}.", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Errors related to transaction history statements.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The statement could not be read.
    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// The statement was readable but contained no transactions.
    #[error("No transactions found in the PDF.")]
    Empty,
}

/// Result type for the resibo library.
pub type Result<T> = std::result::Result<T, ResiboError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_messages() {
        assert_eq!(ExtractionError::NoText.to_string(), "No text detected in image.");
        assert_eq!(
            ExtractionError::UnknownProvider.to_string(),
            "Could not identify provider."
        );
        assert_eq!(
            ExtractionError::MissingFields(vec!["transaction_id", "amount"]).to_string(),
            "Could not extract required fields: transaction_id, amount."
        );
    }
}
