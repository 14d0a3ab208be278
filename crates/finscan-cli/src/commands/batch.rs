//! Batch command for multiple OCR result files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use finscan_core::{DocumentMapper, NormalizedDocument, OcrPayload};

use super::output::{format_document, OutputFormat};
use super::{load_config, mapper, KindArg};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching OCR result files
    #[arg(required = true)]
    input: String,

    /// Partner the documents belong to
    #[arg(short, long)]
    partner: String,

    /// Document kind
    #[arg(short, long, value_enum, default_value = "invoice")]
    kind: KindArg,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of normalizing a single file.
struct BatchResult {
    path: PathBuf,
    document: Option<NormalizedDocument>,
    error: Option<String>,
    processed_at: DateTime<Local>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            ext.eq_ignore_ascii_case("json")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mapper = mapper(args.kind, &config);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = normalize_file(&path, &mapper, &args.partner);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(document) => results.push(BatchResult {
                path,
                document: Some(document),
                error: None,
                processed_at: Local::now(),
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(BatchResult {
                        path,
                        document: None,
                        error: Some(error_msg),
                        processed_at: Local::now(),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.document.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(document) = &result.document {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("document");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_document(document, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn normalize_file(
    path: &Path,
    mapper: &DocumentMapper,
    partner_id: &str,
) -> anyhow::Result<NormalizedDocument> {
    let content = fs::read_to_string(path)?;
    let payload = OcrPayload::from_json(&content)?;
    Ok(mapper.map(&payload, partner_id)?)
}

fn write_summary(path: &Path, results: &[BatchResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "document_number",
        "document_date",
        "due_date",
        "vendor_name",
        "total_amount",
        "currency",
        "line_items",
        "processed_at",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let processed_at = result.processed_at.to_rfc3339();
        let time_ms = result.processing_time_ms.to_string();

        let row = match &result.document {
            Some(document) => {
                let currency = &document.totals.currency;
                [
                    filename,
                    "success".to_string(),
                    document.header.document_number.clone().unwrap_or_default(),
                    document.header.document_date.to_string(),
                    document.header.due_date.to_string(),
                    document.vendor.name.clone().unwrap_or_default(),
                    document
                        .totals
                        .total_amount
                        .map(|a| a.to_string())
                        .unwrap_or_default(),
                    currency
                        .code
                        .clone()
                        .or_else(|| currency.symbol.clone())
                        .unwrap_or_default(),
                    document.line_items.len().to_string(),
                    processed_at,
                    time_ms,
                    String::new(),
                ]
            }
            None => [
                filename,
                "error".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                processed_at,
                time_ms,
                result.error.clone().unwrap_or_default(),
            ],
        };
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
