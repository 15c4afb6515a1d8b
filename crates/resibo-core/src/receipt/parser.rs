//! Receipt parser: classification, extraction and assembly over OCR lines.

use tracing::{debug, info};

use crate::models::config::ExtractionConfig;
use crate::models::receipt::ParseResult;
use crate::ocr::TextLine;

use super::assembler::Assembly;
use super::classifier::ProviderClassifier;
use super::confidence::aggregate_confidence;
use super::providers::ProviderRules;

/// Turns recognized lines into a [`ParseResult`].
///
/// Parsing is deterministic: the same lines always produce the same result.
#[derive(Debug, Clone, Default)]
pub struct ReceiptParser {
    classifier: ProviderClassifier,
    /// Fail when no timestamp was found.
    require_time: bool,
}

impl ReceiptParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_require_time(config.require_time)
    }

    /// Treat a missing timestamp as a failed parse.
    pub fn with_require_time(mut self, require: bool) -> Self {
        self.require_time = require;
        self
    }

    /// Parse one receipt from its OCR lines, ordered top to bottom.
    pub fn parse_lines(&self, lines: &[TextLine], filename: &str) -> ParseResult {
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();

        let classification = self.classifier.classify(&texts);
        let provider = classification.as_ref().map(|c| c.provider);
        debug!("{}: provider {:?}", filename, provider);

        let extracted = ProviderRules::for_provider(provider).extract(&texts);

        let mut evidence = extracted.evidence();
        if let Some(c) = &classification {
            evidence.extend(c.lines.iter().copied());
        }
        let confidence = aggregate_confidence(lines, &evidence);

        let result = Assembly {
            provider,
            fields: extracted.values(),
            confidence,
            filename,
            raw_text: texts.iter().map(|t| t.to_string()).collect(),
            require_time: self.require_time,
        }
        .into_result();

        info!(
            "{}: success={} provider={:?} confidence={:.4}",
            filename, result.success, result.provider, result.confidence
        );

        result
    }
}
