//! Batch processing command for multiple receipt images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use resibo_core::{BatchResult, ParseResult};

use super::{is_image_path, load_config, load_pipeline};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of receipt images, e.g. "receipts/*.png"
    #[arg(required = true)]
    input: String,

    /// Write one JSON file per receipt plus batch.json here
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Model directory
    #[arg(short, long, env = "RESIBO_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_image_path(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} receipts to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = load_pipeline(&config, args.model_dir.as_deref())?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in &files {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        results.push(pipeline.process_file(path));
        pb.inc(1);
    }
    pb.finish_with_message("Complete");

    let batch = BatchResult::from_results(results);

    if let Some(output_dir) = &args.output_dir {
        write_outputs(output_dir, &files, &batch)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &batch.results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} receipts in {:?}",
        style("✓").green(),
        batch.total,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(batch.successful).green(),
        style(batch.failed).red()
    );

    let failed: Vec<_> = batch.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed receipts:").red());
        for result in failed {
            println!(
                "  - {}: {}",
                result.filename,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_outputs(output_dir: &Path, files: &[PathBuf], batch: &BatchResult) -> anyhow::Result<()> {
    for (path, result) in files.iter().zip(&batch.results) {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("receipt");
        let output_path = output_dir.join(format!("{}.json", stem));
        fs::write(&output_path, serde_json::to_string_pretty(result)?)?;
        debug!("Wrote output to {}", output_path.display());
    }

    fs::write(output_dir.join("batch.json"), serde_json::to_string_pretty(batch)?)?;
    Ok(())
}

pub fn write_summary(path: &Path, results: &[ParseResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "provider",
        "transaction_id",
        "amount",
        "time",
        "confidence",
        "error",
    ])?;

    for result in results {
        let confidence = format!("{:.4}", result.confidence);
        wtr.write_record([
            result.filename.as_str(),
            if result.success { "success" } else { "error" },
            result.provider.map(|p| p.as_str()).unwrap_or(""),
            result.transaction_id.as_deref().unwrap_or(""),
            result.amount.as_deref().unwrap_or(""),
            result.time.as_deref().unwrap_or(""),
            confidence.as_str(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
