//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod normalize;
pub mod output;
pub mod slug;
pub mod submit;

use std::path::{Path, PathBuf};

use finscan_core::models::config::FinscanConfig;
use finscan_core::{DocumentKind, DocumentMapper, FieldParser};

/// Document kind accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum KindArg {
    /// Invoice
    Invoice,
    /// Purchase order
    #[value(alias = "po")]
    PurchaseOrder,
}

impl From<KindArg> for DocumentKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Invoice => DocumentKind::Invoice,
            KindArg::PurchaseOrder => DocumentKind::PurchaseOrder,
        }
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finscan")
        .join("config.json")
}

/// Load the explicit config file, else the default one, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FinscanConfig> {
    if let Some(path) = config_path {
        return Ok(FinscanConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(FinscanConfig::from_file(&default_path)?)
    } else {
        Ok(FinscanConfig::default())
    }
}

/// Field parser configured from the extraction settings.
pub fn field_parser(config: &FinscanConfig) -> FieldParser {
    FieldParser::new().with_default_payment_days(config.extraction.default_payment_days)
}

pub fn mapper(kind: KindArg, config: &FinscanConfig) -> DocumentMapper {
    DocumentMapper::with_parser(kind.into(), field_parser(config))
}
