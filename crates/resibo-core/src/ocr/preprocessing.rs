//! Image preprocessing for OCR.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// 3x3 sharpen kernel; `filter3x3` normalizes by the kernel sum (16).
const SHARPEN_KERNEL: [f32; 9] = [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0];

/// Prepares receipt screenshots for recognition.
///
/// Screenshots are often small and low-contrast, so they are upscaled,
/// contrast-boosted and slightly sharpened.
pub struct ImagePreprocessor {
    /// Minimum length of the longer side.
    min_side: u32,
    /// Contrast factor (1.0 = unchanged).
    contrast: f32,
    /// Apply the sharpen kernel.
    sharpen: bool,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            min_side: config.min_image_side,
            contrast: config.contrast,
            sharpen: config.sharpen,
        }
    }

    /// Set the minimum length of the longer side.
    pub fn with_min_side(mut self, min_side: u32) -> Self {
        self.min_side = min_side;
        self
    }

    /// Decode uploaded bytes into an image.
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::InvalidImage("empty file".to_string()));
        }
        image::load_from_memory(bytes).map_err(|e| OcrError::InvalidImage(e.to_string()))
    }

    /// Apply resizing, contrast and sharpening.
    pub fn prepare(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        let mut prepared = if (new_width, new_height) != (width, height) {
            debug!("Upscaling {}x{} to {}x{}", width, height, new_width, new_height);
            image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
        } else {
            image.clone()
        };

        if (self.contrast - 1.0).abs() > f32::EPSILON {
            prepared = prepared.adjust_contrast(contrast_percent(self.contrast));
        }

        if self.sharpen {
            prepared = prepared.filter3x3(&SHARPEN_KERNEL);
        }

        prepared
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let longer = width.max(height);
        if longer == 0 || longer >= self.min_side {
            return (width, height);
        }

        let scale = self.min_side as f32 / longer as f32;
        let new_width = ((width as f32 * scale).round() as u32).max(1);
        let new_height = ((height as f32 * scale).round() as u32).max(1);
        (new_width, new_height)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a multiplicative contrast factor to the percentage `image` expects.
///
/// `adjust_contrast(c)` scales by `((100 + c) / 100)^2`.
fn contrast_percent(factor: f32) -> f32 {
    100.0 * (factor.max(0.0).sqrt() - 1.0)
}
