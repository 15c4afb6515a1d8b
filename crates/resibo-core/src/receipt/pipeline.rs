//! End-to-end receipt processing: image bytes to [`ParseResult`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{info, warn};

use crate::error::OcrError;
use crate::models::config::ResiboConfig;
use crate::models::receipt::{BatchResult, ParseResult};
use crate::ocr::{ImagePreprocessor, TextLine, TextLineExtractor};

use super::parser::ReceiptParser;

/// Runs OCR and parsing for receipt images.
///
/// The engine is shared: one instance is loaded at startup and every
/// request goes through it. Processing never fails; problems end up in the
/// `error` field of the result.
#[derive(Clone)]
pub struct ReceiptPipeline {
    engine: Arc<dyn TextLineExtractor>,
    preprocessor: Arc<ImagePreprocessor>,
    parser: ReceiptParser,
}

impl ReceiptPipeline {
    /// Create a pipeline with default preprocessing and parsing.
    pub fn new(engine: Arc<dyn TextLineExtractor>) -> Self {
        Self {
            engine,
            preprocessor: Arc::new(ImagePreprocessor::new()),
            parser: ReceiptParser::new(),
        }
    }

    pub fn from_config(engine: Arc<dyn TextLineExtractor>, config: &ResiboConfig) -> Self {
        Self::new(engine)
            .with_preprocessor(ImagePreprocessor::from_config(&config.ocr))
            .with_parser(ReceiptParser::from_config(&config.extraction))
    }

    pub fn with_preprocessor(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.preprocessor = Arc::new(preprocessor);
        self
    }

    pub fn with_parser(mut self, parser: ReceiptParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn parser(&self) -> &ReceiptParser {
        &self.parser
    }

    /// Decode, preprocess and recognize an image.
    ///
    /// A panic inside the engine is reported as [`OcrError::Panicked`].
    pub fn recognize(&self, bytes: &[u8]) -> Result<Vec<TextLine>, OcrError> {
        let image = ImagePreprocessor::decode(bytes)?;
        self.recognize_image(&image)
    }

    fn recognize_image(&self, image: &DynamicImage) -> Result<Vec<TextLine>, OcrError> {
        let prepared = self.preprocessor.prepare(image);
        catch_unwind(AssertUnwindSafe(|| self.engine.extract_lines(&prepared)))
            .map_err(|payload| OcrError::Panicked(panic_message(payload.as_ref())))?
    }

    /// Process one encoded image.
    pub fn process_bytes(&self, bytes: &[u8], filename: &str) -> ParseResult {
        let start = Instant::now();

        let result = match self.recognize(bytes) {
            Ok(lines) => self.parser.parse_lines(&lines, filename),
            Err(e) => {
                warn!("{}: OCR failed: {}", filename, e);
                ParseResult::failure(filename, format!("OCR failed: {}", e))
            }
        };

        info!("{}: processed in {}ms", filename, start.elapsed().as_millis());
        result
    }

    /// Process an already decoded image.
    pub fn process_image(&self, image: &DynamicImage, filename: &str) -> ParseResult {
        match self.recognize_image(image) {
            Ok(lines) => self.parser.parse_lines(&lines, filename),
            Err(e) => {
                warn!("{}: OCR failed: {}", filename, e);
                ParseResult::failure(filename, format!("OCR failed: {}", e))
            }
        }
    }

    /// Process an image file on disk.
    pub fn process_file(&self, path: &Path) -> ParseResult {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match std::fs::read(path) {
            Ok(bytes) => self.process_bytes(&bytes, &filename),
            Err(e) => ParseResult::failure(filename, format!("Failed to read file: {}", e)),
        }
    }

    /// Process named images one after another, keeping input order.
    pub fn process_batch<I, S, B>(&self, images: I) -> BatchResult
    where
        I: IntoIterator<Item = (S, B)>,
        S: AsRef<str>,
        B: AsRef<[u8]>,
    {
        images
            .into_iter()
            .map(|(name, bytes)| self.process_bytes(bytes.as_ref(), name.as_ref()))
            .collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
