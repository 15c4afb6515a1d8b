//! Configuration structures for the receipt pipeline and server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for resibo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResiboConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Receipt extraction configuration.
    pub extraction: ExtractionConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Google Drive configuration.
    pub drive: DriveConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Lines recognized below this confidence are dropped (0.0 - 1.0).
    pub min_line_confidence: f32,

    /// Images whose longer side is shorter than this are upscaled.
    pub min_image_side: u32,

    /// Contrast factor applied before recognition (1.0 = unchanged).
    pub contrast: f32,

    /// Apply a 3x3 sharpening filter before recognition.
    pub sharpen: bool,

    /// Keep `[UNK]` tokens emitted by the recognizer instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_line_confidence: 0.5,
            min_image_side: 800,
            contrast: 1.5,
            sharpen: true,
            keep_unk: false,
        }
    }
}

/// Receipt extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fail the parse when no timestamp was found.
    pub require_time: bool,

    /// Maximum number of images per batch request.
    pub max_batch_size: usize,

    /// Maximum size of a single image in bytes.
    pub max_file_size: usize,

    /// Tolerance when matching receipt and history timestamps.
    pub match_time_tolerance_minutes: i64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            require_time: false,
            max_batch_size: 50,
            max_file_size: 10 * 1024 * 1024,
            match_time_tolerance_minutes: 10,
        }
    }
}

/// Model file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "en_rec.onnx".to_string(),
            dictionary: "en_dict.txt".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Timeout for fetching images by URL, in seconds.
    pub download_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            download_timeout_secs: 30,
        }
    }
}

/// Google Drive API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Drive v3 API base URL.
    pub api_base: String,

    /// Credentials file used when a request does not name one.
    pub default_credentials_path: PathBuf,

    /// Page size for folder listings.
    pub page_size: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com".to_string(),
            default_credentials_path: PathBuf::from("service_account.json"),
            page_size: 100,
        }
    }
}

impl ResiboConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.models.model_dir.join(model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ResiboConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "extraction": {"require_time": true}}"#)
                .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.extraction.require_time);
        assert_eq!(config.extraction.max_batch_size, 50);
        assert_eq!(config.ocr.min_line_confidence, 0.5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ResiboConfig::default();
        config.models.model_dir = PathBuf::from("/opt/models");
        config.save(&path).unwrap();

        let loaded = ResiboConfig::from_file(&path).unwrap();
        assert_eq!(loaded.models.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(loaded.model_path("det.onnx"), PathBuf::from("/opt/models/det.onnx"));
    }
}
