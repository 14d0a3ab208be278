//! Configuration structures for the document pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::document::DocumentKind;

/// Main configuration for finscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinscanConfig {
    /// Field normalization configuration.
    pub extraction: ExtractionConfig,

    /// Object storage configuration.
    pub storage: StorageConfig,

    /// OCR provider configuration.
    pub ocr: OcrConfig,
}

/// Field normalization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Days added to the document date when no due date or usable terms exist.
    pub default_payment_days: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_payment_days: 30,
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory where uploaded files and OCR results are written.
    pub root: PathBuf,

    /// Public base URL for stored objects. `file://` URLs are returned when unset.
    pub public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/objects"),
            public_base_url: None,
        }
    }
}

/// OCR provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Provider endpoint. Read from `endpoint_env` when unset.
    pub endpoint: Option<String>,

    /// Environment variable holding the endpoint.
    pub endpoint_env: String,

    /// Environment variable holding the subscription key.
    pub api_key_env: String,

    /// Provider API version.
    pub api_version: String,

    /// Model used for invoices.
    pub invoice_model: String,

    /// Model used for purchase orders.
    pub purchase_order_model: String,

    /// Delay between result polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum number of result polls before giving up.
    pub max_polls: u32,

    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            endpoint_env: "FINSCAN_OCR_ENDPOINT".to_string(),
            api_key_env: "FINSCAN_OCR_KEY".to_string(),
            api_version: "2024-11-30".to_string(),
            invoice_model: "prebuilt-invoice".to_string(),
            purchase_order_model: "prebuilt-invoice".to_string(),
            poll_interval_ms: 2000,
            max_polls: 60,
            request_timeout_secs: 120,
        }
    }
}

impl OcrConfig {
    /// Model id for a document kind.
    pub fn model_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Invoice => &self.invoice_model,
            DocumentKind::PurchaseOrder => &self.purchase_order_model,
        }
    }
}

impl FinscanConfig {
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
}
