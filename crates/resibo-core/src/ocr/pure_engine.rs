//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{lock_engine, order_lines, PositionedLine, TextLine, TextLineExtractor};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
///
/// The underlying engine is not reentrant; calls are serialized.
pub struct PureOcrEngine {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(
        model_dir: &Path,
        models: &ModelConfig,
        config: OcrConfig,
    ) -> Result<Self, OcrError> {
        let det_path = model_dir.join(&models.detection_model);
        let rec_path = model_dir.join(&models.recognition_model);
        let dict_path = model_dir.join(&models.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            config,
        })
    }

    fn clean_text(&self, text: &str) -> String {
        if self.config.keep_unk {
            text.trim().to_string()
        } else {
            text.replace("[UNK]", " ").trim().to_string()
        }
    }
}

impl TextLineExtractor for PureOcrEngine {
    fn extract_lines(&self, image: &DynamicImage) -> Result<Vec<TextLine>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Recognizing image: {}x{}", width, height);

        let results = {
            let engine = lock_engine(&self.engine);
            engine
                .run_from_image(image)
                .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?
        };

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let positioned = results
            .iter()
            .map(|r| PositionedLine {
                center_y: polygon_center_y(&r.bounding_box),
                line: TextLine::new(self.clean_text(&r.text), r.confidence),
            })
            .collect();

        let lines = order_lines(positioned, self.config.min_line_confidence);

        info!(
            "OCR complete: {} lines in {}ms",
            lines.len(),
            start.elapsed().as_millis()
        );

        Ok(lines)
    }
}

/// Average y of the first four exterior points of a region polygon.
fn polygon_center_y(polygon: &pure_onnx_ocr::Polygon<f64>) -> f32 {
    let ys: Vec<f64> = polygon.exterior().coords().take(4).map(|c| c.y).collect();
    if ys.is_empty() {
        return 0.0;
    }
    (ys.iter().sum::<f64>() / ys.len() as f64) as f32
}
