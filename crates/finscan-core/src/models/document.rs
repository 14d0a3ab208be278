//! Normalized financial document models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Currency;

/// Kind of financial document handled by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    PurchaseOrder,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::PurchaseOrder => "purchase_order",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "invoice" => Ok(DocumentKind::Invoice),
            "purchase_order" | "po" => Ok(DocumentKind::PurchaseOrder),
            other => Err(format!("unknown document kind: {other}")),
        }
    }
}

/// Processing status of a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// File accepted and stored, OCR run in progress.
    Processing,
    /// OCR, mapping and all dependent writes completed.
    Analyzed,
    /// Some step after acceptance failed.
    Failed,
}

impl DocumentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Analyzed | DocumentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Analyzed => "analyzed",
            DocumentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical record produced from one OCR payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    /// Invoice or purchase order.
    pub kind: DocumentKind,

    /// Caller-supplied partner identifier.
    pub partner_id: String,

    /// Lifecycle status at construction time.
    pub status: DocumentStatus,

    /// Numbers, dates and terms.
    pub header: DocumentHeader,

    /// Monetary totals collapsed to one currency.
    pub totals: DocumentTotals,

    /// Bill-to party.
    pub customer: PartyData,

    /// Issuing party.
    pub vendor: PartyData,

    /// Line items in document order.
    pub line_items: Vec<LineItem>,
}

/// Document identification, dates and payment terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// Invoice id or purchase order number.
    pub document_number: Option<String>,

    /// Date the document was issued.
    pub document_date: NaiveDate,

    /// Payment due date (always resolved).
    pub due_date: NaiveDate,

    /// Purchase order number on an invoice, or invoice id on a purchase order.
    pub reference: Option<String>,

    /// Free-text payment terms.
    pub payment_terms: Option<String>,
}

/// Monetary totals of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub total_amount: Option<Decimal>,
    pub subtotal_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,

    /// Currency shared by all amounts.
    pub currency: Currency,
}

/// Customer or vendor data as read from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyData {
    pub name: Option<String>,
    pub address: Option<String>,

    /// Recipient or contact name.
    pub recipient: Option<String>,

    pub tax_id: Option<String>,
}

impl PartyData {
    /// A party without a name is treated as absent.
    pub fn is_present(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// A single line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

impl LineItem {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.unit_price.is_none()
            && self.amount.is_none()
    }
}

impl NormalizedDocument {
    /// Check the document for gaps worth reporting. Never fails.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.header.document_number.is_none() {
            issues.push(format!("Missing {} number", self.kind));
        }

        if self.totals.total_amount.is_none() {
            issues.push("Missing total amount".to_string());
        }

        if !self.vendor.is_present() {
            issues.push("Missing vendor name".to_string());
        }

        if !self.customer.is_present() {
            issues.push("Missing customer name".to_string());
        }

        if self.line_items.is_empty() {
            issues.push("No line items".to_string());
        }

        if self.header.due_date < self.header.document_date {
            issues.push(format!(
                "Due date ({}) is before document date ({})",
                self.header.due_date, self.header.document_date
            ));
        }

        let amounts: Vec<Decimal> = self.line_items.iter().filter_map(|i| i.amount).collect();
        if let Some(subtotal) = self.totals.subtotal_amount {
            if amounts.len() == self.line_items.len() && !amounts.is_empty() {
                let calculated: Decimal = amounts.iter().sum();
                if (calculated - subtotal).abs() > Decimal::new(1, 2) {
                    issues.push(format!(
                        "Line item total ({}) differs from subtotal ({})",
                        calculated, subtotal
                    ));
                }
            }
        }

        issues
    }
}
