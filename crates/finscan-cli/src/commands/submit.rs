//! Submit command - run a document through OCR and the processing pipeline.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info_span};

use finscan_core::adapters::{
    AzureDocumentClient, LocalObjectStore, MemoryDocumentRepository, MemoryItemRepository,
    MemoryPartyRepository,
};
use finscan_core::pipeline::{DocumentDetails, DocumentView};
use finscan_core::ProcessingPipeline;

use super::{field_parser, load_config, KindArg};

/// Arguments for the submit command.
#[derive(Args)]
pub struct SubmitArgs {
    /// Document file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Partner the document belongs to
    #[arg(short, long)]
    partner: String,

    /// Document kind
    #[arg(short, long, value_enum, default_value = "invoice")]
    kind: KindArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: ViewFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ViewFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: SubmitArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let ocr = AzureDocumentClient::from_config(&config.ocr)?;
    let pipeline = ProcessingPipeline::builder(args.kind.into())
        .with_parser(field_parser(&config))
        .with_ocr(Arc::new(ocr))
        .with_store(Arc::new(LocalObjectStore::from_config(&config.storage)))
        .with_documents(Arc::new(MemoryDocumentRepository::new()))
        .with_customers(Arc::new(MemoryPartyRepository::customers()))
        .with_vendors(Arc::new(MemoryPartyRepository::vendors()))
        .with_items(Arc::new(MemoryItemRepository::new()))
        .with_span(info_span!("finscan_submit"))
        .build()?;

    let file = fs::read(&args.input)?;
    let filename = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Submitting document...");

    let accepted = pipeline.submit(file, &args.partner, &filename).await?;
    let id = accepted.submission.id;
    debug!("Accepted document {}", id);

    pb.set_message("Waiting for analysis...");
    let status = accepted.wait().await?;
    pb.finish_with_message(format!("Document {} {}", id, status));

    let view = pipeline.get_by_id(id).await?;
    match args.format {
        ViewFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        ViewFormat::Text => println!("{}", format_view(&view)),
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if let DocumentView::Failed { message, .. } = &view {
        anyhow::bail!("Processing failed: {}", message);
    }

    Ok(())
}

fn format_view(view: &DocumentView) -> String {
    match view {
        DocumentView::Ready(details) => format_details(details),
        DocumentView::Processing { id, message, .. } => {
            format!("{} {}: {}", style("…").yellow(), id, message)
        }
        DocumentView::Failed { id, message, .. } => {
            format!("{} {}: {}", style("✗").red(), id, message)
        }
    }
}

fn format_details(details: &DocumentDetails) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {} ({})\n", details.kind, details.id, details.status));
    output.push_str(&format!("File:   {}\n", details.file_url));
    if let Some(result_url) = &details.result_url {
        output.push_str(&format!("Result: {}\n", result_url));
    }

    if let Some(header) = &details.header {
        output.push_str(&format!(
            "Number: {}\n",
            header.document_number.as_deref().unwrap_or("-")
        ));
        output.push_str(&format!("Date:   {}\n", header.document_date));
        output.push_str(&format!("Due:    {}\n", header.due_date));
    }

    for (title, party) in [("Vendor", &details.vendor), ("Customer", &details.customer)] {
        if let Some(party) = party {
            output.push_str(&format!(
                "{}: {} [{}]\n",
                title,
                party.data.name.as_deref().unwrap_or("-"),
                party.slug
            ));
        }
    }

    if let Some(totals) = &details.totals {
        let currency = totals
            .currency
            .code
            .as_deref()
            .or(totals.currency.symbol.as_deref())
            .unwrap_or_default();
        let total = totals
            .total_amount
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!("Total:  {} {}\n", total, currency));
    }

    for line in &details.items {
        output.push_str(&format!("  {}. {}\n", line.position, line.description));
    }

    output
}
