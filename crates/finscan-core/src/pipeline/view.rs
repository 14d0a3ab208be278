//! Read-side projections of stored documents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::document::{DocumentHeader, DocumentKind, DocumentStatus, DocumentTotals};
use crate::models::record::{DocumentLine, DocumentRecord, LineFields, PartyRecord};

/// Message shown while a document is still being analyzed.
pub const PROCESSING_MESSAGE: &str = "The document is still being processed";

/// Message shown when processing failed without a recorded reason.
pub const FAILED_MESSAGE: &str = "The document could not be processed";

/// Status of a submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub status: DocumentStatus,
}

/// What `get_by_id` returns for a stored document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DocumentView {
    /// Fully analyzed document with its parties and lines.
    Ready(Box<DocumentDetails>),

    /// Analysis has not finished yet.
    Processing {
        id: Uuid,
        status: DocumentStatus,
        message: String,
    },

    /// Analysis failed.
    Failed {
        id: Uuid,
        status: DocumentStatus,
        message: String,
    },
}

impl DocumentView {
    pub fn processing(record: &DocumentRecord) -> Self {
        DocumentView::Processing {
            id: record.id,
            status: record.status,
            message: PROCESSING_MESSAGE.to_string(),
        }
    }

    pub fn failed(record: &DocumentRecord) -> Self {
        DocumentView::Failed {
            id: record.id,
            status: record.status,
            message: record
                .error
                .clone()
                .unwrap_or_else(|| FAILED_MESSAGE.to_string()),
        }
    }

    pub fn status(&self) -> DocumentStatus {
        match self {
            DocumentView::Ready(details) => details.status,
            DocumentView::Processing { status, .. } | DocumentView::Failed { status, .. } => {
                *status
            }
        }
    }
}

/// Analyzed document, formatted for consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDetails {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub partner_id: String,
    pub original_filename: String,
    pub file_url: String,
    pub result_url: Option<String>,
    pub status: DocumentStatus,
    pub header: Option<DocumentHeader>,
    pub totals: Option<DocumentTotals>,
    pub customer: Option<PartyRecord>,
    pub vendor: Option<PartyRecord>,
    pub items: Vec<LineView>,
    pub created_at: DateTime<Utc>,
}

impl DocumentDetails {
    pub fn new(
        record: DocumentRecord,
        customer: Option<PartyRecord>,
        vendor: Option<PartyRecord>,
        lines: Vec<DocumentLine>,
    ) -> Self {
        let mut items: Vec<LineView> = lines.into_iter().map(LineView::from).collect();
        items.sort_by_key(|item| item.position);

        Self {
            id: record.id,
            kind: record.kind,
            partner_id: record.partner_id,
            original_filename: record.original_filename,
            file_url: record.file_url,
            result_url: record.result_url,
            status: record.status,
            header: record.header,
            totals: record.totals,
            customer,
            vendor,
            items,
            created_at: record.created_at,
        }
    }
}

/// One line of an analyzed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub position: u32,
    pub item_id: Uuid,
    pub description: String,
    #[serde(flatten)]
    pub line: LineFields,
}

impl From<DocumentLine> for LineView {
    fn from(value: DocumentLine) -> Self {
        Self {
            position: value.line.position,
            item_id: value.item.id,
            description: value.item.description,
            line: value.line.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{DocumentItemRecord, ItemRecord};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn line(position: u32, description: &str) -> DocumentLine {
        let item = ItemRecord {
            id: Uuid::new_v4(),
            description: description.to_string(),
        };
        DocumentLine {
            line: DocumentItemRecord {
                id: Uuid::new_v4(),
                document_kind: DocumentKind::Invoice,
                document_id: Uuid::nil(),
                item_id: item.id,
                position,
                line: LineFields {
                    quantity: Some(Decimal::ONE),
                    ..Default::default()
                },
            },
            item,
        }
    }

    #[test]
    fn test_details_order_lines_by_position() {
        let record = DocumentRecord::processing(DocumentKind::Invoice, "p-1", "a.pdf", "memory://a");
        let details = DocumentDetails::new(
            record,
            None,
            None,
            vec![line(2, "Bolts"), line(1, "Nuts")],
        );

        let names: Vec<&str> = details.items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(names, vec!["Nuts", "Bolts"]);
    }

    #[test]
    fn test_failed_view_uses_recorded_error() {
        let mut record =
            DocumentRecord::processing(DocumentKind::Invoice, "p-1", "a.pdf", "memory://a");
        record.status = DocumentStatus::Failed;
        assert_eq!(
            DocumentView::failed(&record),
            DocumentView::Failed {
                id: record.id,
                status: DocumentStatus::Failed,
                message: FAILED_MESSAGE.to_string(),
            }
        );

        record.error = Some("The OCR service timed out".to_string());
        let view = DocumentView::failed(&record);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "The OCR service timed out");
    }
}
