//! Parse command - extract fields from a single receipt image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use resibo_core::ParseResult;

use super::{load_config, load_pipeline};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Receipt image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long, env = "RESIBO_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Fail when no timestamp is found
    #[arg(long)]
    require_time: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if args.require_time {
        config.extraction.require_time = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Loading OCR models...");

    let pipeline = load_pipeline(&config, args.model_dir.as_deref())?;

    pb.set_message("Reading receipt...");
    info!("Processing file: {}", args.input.display());
    let result = pipeline.process_file(&args.input);
    pb.finish_and_clear();

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !result.success {
        eprintln!(
            "{} {}",
            style("✗").red(),
            result.error.as_deref().unwrap_or("Parsing failed.")
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

pub fn format_result(result: &ParseResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &ParseResult) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    let mut output = String::new();
    output.push_str(&format!("File:       {}\n", result.filename));
    output.push_str(&format!(
        "Provider:   {}\n",
        result.provider.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!("Reference:  {}\n", field(&result.transaction_id)));
    output.push_str(&format!("Amount:     {}\n", field(&result.amount)));
    output.push_str(&format!("Time:       {}\n", field(&result.time)));
    output.push_str(&format!("Confidence: {:.1}%\n", result.confidence * 100.0));

    if let Some(error) = &result.error {
        output.push_str(&format!("Error:      {}\n", error));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use resibo_core::Provider;

    #[test]
    fn test_text_format() {
        let result = ParseResult {
            success: true,
            provider: Some(Provider::Gcash),
            transaction_id: Some("7037516197197".to_string()),
            amount: Some("320.00".to_string()),
            confidence: 0.98,
            filename: "r.png".to_string(),
            ..ParseResult::default()
        };

        let text = format_text(&result);
        assert!(text.contains("Provider:   gcash"));
        assert!(text.contains("Amount:     320.00"));
        assert!(text.contains("Time:       -"));
        assert!(text.contains("Confidence: 98.0%"));
        assert!(!text.contains("Error"));
    }
}
