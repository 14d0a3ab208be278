//! CLI application for financial document OCR normalization.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, normalize, slug, submit};

/// finscan - Normalize OCR output of invoices and purchase orders
#[derive(Parser)]
#[command(name = "finscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a saved OCR result file
    Normalize(normalize::NormalizeArgs),

    /// Normalize multiple OCR result files
    Batch(batch::BatchArgs),

    /// Run a document through OCR and the full processing pipeline
    Submit(submit::SubmitArgs),

    /// Print the partner slug for a name
    Slug(slug::SlugArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // OCR credentials usually live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Normalize(args) => normalize::run(args, cli.config.as_deref()).await,
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()).await,
        Commands::Submit(args) => submit::run(args, cli.config.as_deref()).await,
        Commands::Slug(args) => slug::run(args),
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
