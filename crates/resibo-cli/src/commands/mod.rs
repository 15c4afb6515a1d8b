//! Subcommands and the configuration/model loading they share.

pub mod batch;
pub mod config;
pub mod parse;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use resibo_core::{PureOcrEngine, ReceiptPipeline, ResiboConfig, TextLineExtractor};

/// Image extensions picked up from the file system.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("resibo")
        .join("config.json")
}

/// Load the file given with `-c`, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ResiboConfig> {
    let path = match config_path {
        Some(p) => Some(PathBuf::from(p)),
        None => Some(default_config_path()).filter(|p| p.exists()),
    };

    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            ResiboConfig::from_file(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))
        }
        None => Ok(ResiboConfig::default()),
    }
}

/// Load the OCR engine from `model_dir`, or from the configured directory.
pub fn load_engine(config: &ResiboConfig, model_dir: Option<&Path>) -> anyhow::Result<Arc<dyn TextLineExtractor>> {
    let model_dir = model_dir.unwrap_or(&config.models.model_dir);
    info!("Loading OCR models from {}", model_dir.display());

    let engine = PureOcrEngine::from_dir(model_dir, &config.models, config.ocr.clone()).map_err(|e| {
        anyhow::anyhow!(
            "{}.\n\nPlace {}, {} and {} in {} or pass --model-dir.",
            e,
            config.models.detection_model,
            config.models.recognition_model,
            config.models.dictionary,
            model_dir.display()
        )
    })?;

    Ok(Arc::new(engine))
}

pub fn load_pipeline(config: &ResiboConfig, model_dir: Option<&Path>) -> anyhow::Result<ReceiptPipeline> {
    Ok(ReceiptPipeline::from_config(load_engine(config, model_dir)?, config))
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
