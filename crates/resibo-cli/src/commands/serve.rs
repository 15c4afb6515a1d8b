//! Serve command - run the HTTP API.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use resibo_server::{AppState, run_server};

use super::{load_config, load_engine};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "RESIBO_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RESIBO_PORT")]
    port: Option<u16>,

    /// Model directory
    #[arg(short, long, env = "RESIBO_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model_dir) = args.model_dir {
        config.models.model_dir = model_dir;
    }

    info!("Initializing OCR engine...");
    let engine = load_engine(&config, None)?;
    info!("OCR engine initialized successfully");

    let state = AppState::new(engine, config)?;
    run_server(state).await?;
    Ok(())
}
