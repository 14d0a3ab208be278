//! Normalize command - map a saved OCR result into a normalized document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use finscan_core::OcrPayload;

use super::output::{format_document, OutputFormat};
use super::{load_config, mapper, KindArg};

/// Arguments for the normalize command.
#[derive(Args)]
pub struct NormalizeArgs {
    /// OCR result file (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Partner the document belongs to
    #[arg(short, long)]
    partner: String,

    /// Document kind
    #[arg(short, long, value_enum, default_value = "invoice")]
    kind: KindArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Report gaps in the normalized document
    #[arg(long)]
    validate: bool,
}

pub async fn run(args: NormalizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Normalizing {}", args.input.display());

    let content = fs::read_to_string(&args.input)?;
    let payload = OcrPayload::from_json(&content)?;
    let document = mapper(args.kind, &config).map(&payload, &args.partner)?;

    if args.validate {
        let issues = document.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_document(&document, args.format)?;

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

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
