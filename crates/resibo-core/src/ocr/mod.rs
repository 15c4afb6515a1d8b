//! OCR text line extraction.
//!
//! The OCR model itself is a black box behind [`TextLineExtractor`]: an image
//! goes in, recognized lines with confidences come out, ordered top to bottom.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use std::sync::{Mutex, MutexGuard};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::OcrError;

/// A recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Anything that turns an image into ordered text lines.
///
/// Implementations are shared across request handlers, so they must be
/// `Send + Sync`; engines without reentrancy guarantees serialize internally.
pub trait TextLineExtractor: Send + Sync {
    /// Recognize the text lines of an image, ordered top to bottom.
    fn extract_lines(&self, image: &DynamicImage) -> Result<Vec<TextLine>, OcrError>;
}

/// Lock an engine, taking it back after a panic poisoned the lock.
///
/// Engines keep no per-call state, so the guard of a panicked call is
/// still valid for the next one.
#[cfg_attr(not(feature = "native"), allow(dead_code))]
pub(crate) fn lock_engine<T>(engine: &Mutex<T>) -> MutexGuard<'_, T> {
    engine.lock().unwrap_or_else(|poisoned| {
        warn!("OCR engine lock was poisoned by an earlier panic; recovering");
        engine.clear_poison();
        poisoned.into_inner()
    })
}

/// A line together with the vertical center of its region.
#[derive(Debug, Clone)]
pub(crate) struct PositionedLine {
    pub center_y: f32,
    pub line: TextLine,
}

/// Drop low-confidence lines and order the rest top to bottom.
pub(crate) fn order_lines(mut lines: Vec<PositionedLine>, min_confidence: f32) -> Vec<TextLine> {
    lines.retain(|l| l.line.confidence >= min_confidence && !l.line.text.trim().is_empty());
    lines.sort_by(|a, b| {
        a.center_y
            .partial_cmp(&b.center_y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    lines.into_iter().map(|l| l.line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positioned(text: &str, y: f32, confidence: f32) -> PositionedLine {
        PositionedLine {
            center_y: y,
            line: TextLine::new(text, confidence),
        }
    }

    #[test]
    fn test_lock_engine_recovers_from_poison() {
        let engine = Mutex::new(0u32);
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = engine.lock().unwrap();
            panic!("recognition failed");
        }));
        assert!(poisoned.is_err());
        assert!(engine.is_poisoned());

        *lock_engine(&engine) += 1;
        assert!(!engine.is_poisoned());
        assert_eq!(*lock_engine(&engine), 1);
    }

    #[test]
    fn test_order_lines_sorts_and_filters() {
        let lines = vec![
            positioned("Ref No. 123", 300.0, 0.9),
            positioned("GCash", 10.0, 0.99),
            positioned("noise", 150.0, 0.2),
            positioned("   ", 160.0, 0.9),
            positioned("Amount 320.00", 200.0, 0.95),
        ];

        let ordered: Vec<String> = order_lines(lines, 0.5).into_iter().map(|l| l.text).collect();
        assert_eq!(ordered, vec!["GCash", "Amount 320.00", "Ref No. 123"]);
    }

    #[test]
    fn test_text_line_clamps_confidence() {
        assert_eq!(TextLine::new("x", 1.7).confidence, 1.0);
        assert_eq!(TextLine::new("x", -0.2).confidence, 0.0);
    }
}
