//! Persisted records exchanged with the repositories.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{DocumentHeader, DocumentKind, DocumentStatus, DocumentTotals, LineItem, PartyData};

/// A stored document and its processing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub partner_id: String,
    pub original_filename: String,

    /// Location of the uploaded source file.
    pub file_url: String,

    /// Location of the raw OCR result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,

    pub status: DocumentStatus,

    /// Human-readable failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<DocumentHeader>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<DocumentTotals>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Initial record for a freshly accepted file.
    pub fn processing(
        kind: DocumentKind,
        partner_id: impl Into<String>,
        original_filename: impl Into<String>,
        file_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            partner_id: partner_id.into(),
            original_filename: original_filename.into(),
            file_url: file_url.into(),
            result_url: None,
            status: DocumentStatus::Processing,
            error: None,
            header: None,
            totals: None,
            customer_id: None,
            vendor_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a document record. `None` members are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub result_url: Option<String>,
    pub header: Option<DocumentHeader>,
    pub totals: Option<DocumentTotals>,
    pub customer_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub error: Option<String>,
}

impl DocumentUpdate {
    pub fn apply(self, record: &mut DocumentRecord) {
        if let Some(url) = self.result_url {
            record.result_url = Some(url);
        }
        if let Some(header) = self.header {
            record.header = Some(header);
        }
        if let Some(totals) = self.totals {
            record.totals = Some(totals);
        }
        if let Some(id) = self.customer_id {
            record.customer_id = Some(id);
        }
        if let Some(id) = self.vendor_id {
            record.vendor_id = Some(id);
        }
        if let Some(error) = self.error {
            record.error = Some(error);
        }
        record.updated_at = Utc::now();
    }
}

/// Role a party plays on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Customer,
    Vendor,
}

/// A stored customer or vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyRecord {
    pub id: Uuid,
    pub role: PartyRole,

    /// URL-safe key derived from the name.
    pub slug: String,

    #[serde(flatten)]
    pub data: PartyData,

    pub created_at: DateTime<Utc>,
}

/// Attributes used to find an existing party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyQuery {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
}

impl PartyQuery {
    /// Query for a named party; `None` when the party has no name.
    pub fn from_data(data: &PartyData) -> Option<Self> {
        let name = data.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        Some(Self {
            name: name.to_string(),
            tax_id: data.tax_id.clone(),
            address: data.address.clone(),
        })
    }

    /// Name plus every non-null attribute must match.
    pub fn matches(&self, data: &PartyData) -> bool {
        let same = |want: &str, have: Option<&String>| {
            have.is_some_and(|h| h.trim().eq_ignore_ascii_case(want.trim()))
        };

        same(&self.name, data.name.as_ref())
            && self.tax_id.as_deref().is_none_or(|t| same(t, data.tax_id.as_ref()))
            && self.address.as_deref().is_none_or(|a| same(a, data.address.as_ref()))
    }
}

/// Entry of the shared item catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Uuid,
    pub description: String,
}

/// Per-line values stored on a document/item association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFields {
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
}

impl From<&LineItem> for LineFields {
    fn from(item: &LineItem) -> Self {
        Self {
            quantity: item.quantity,
            unit: item.unit.clone(),
            unit_price: item.unit_price,
            amount: item.amount,
        }
    }
}

/// Association between a document and a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItemRecord {
    pub id: Uuid,
    pub document_kind: DocumentKind,
    pub document_id: Uuid,
    pub item_id: Uuid,

    /// Position on the document, starting at 1.
    pub position: u32,

    #[serde(flatten)]
    pub line: LineFields,
}

/// A document line joined with its catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub item: ItemRecord,
    pub line: DocumentItemRecord,
}
