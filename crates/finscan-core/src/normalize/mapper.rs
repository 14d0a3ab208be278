//! Mapping of a whole OCR payload into a normalized document.
//!
//! Structural problems (no documents, no field map, no partner) are
//! validation errors. Missing or unreadable individual fields degrade to
//! the [`FieldParser`] defaults.

use tracing::{debug, info};

use crate::error::ValidationError;
use crate::models::document::{
    DocumentHeader, DocumentKind, DocumentStatus, DocumentTotals, NormalizedDocument,
};
use crate::models::field::{FieldMap, OcrPayload};
use crate::models::money::{Currency, Money};

use super::entities::EntityExtractor;
use super::fields::FieldParser;
use super::{first_content, first_present};

/// Ordered field-name fallbacks for one document kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub number: &'static [&'static str],
    pub date: &'static [&'static str],
    pub due_date: &'static [&'static str],
    pub reference: &'static [&'static str],
    pub total: &'static [&'static str],
    pub subtotal: &'static [&'static str],
    pub discount: &'static [&'static str],
    pub tax: &'static [&'static str],
    pub payment_terms: &'static [&'static str],
    pub currency_code: &'static [&'static str],
    pub items: &'static [&'static str],
}

impl FieldSchema {
    pub const INVOICE: FieldSchema = FieldSchema {
        number: &["InvoiceId"],
        date: &["InvoiceDate"],
        due_date: &["DueDate"],
        reference: &["PurchaseOrder"],
        total: &["InvoiceTotal"],
        subtotal: &["SubTotal"],
        discount: &["TotalDiscount"],
        tax: &["TotalTax"],
        payment_terms: &["PaymentTerm", "PaymentTerms"],
        currency_code: &["CurrencyCode"],
        items: &["Items"],
    };

    pub const PURCHASE_ORDER: FieldSchema = FieldSchema {
        number: &["PurchaseOrderNumber", "PONumber", "PurchaseOrder"],
        date: &["PurchaseOrderDate", "PODate", "OrderDate"],
        due_date: &["DueDate", "DeliveryDate"],
        reference: &["InvoiceId", "QuoteNumber"],
        total: &["Total", "PurchaseOrderTotal", "InvoiceTotal"],
        subtotal: &["SubTotal"],
        discount: &["TotalDiscount", "Discount"],
        tax: &["TotalTax", "Tax"],
        payment_terms: &["PaymentTerm", "PaymentTerms"],
        currency_code: &["CurrencyCode"],
        items: &["Items"],
    };

    pub fn for_kind(kind: DocumentKind) -> &'static FieldSchema {
        match kind {
            DocumentKind::Invoice => &Self::INVOICE,
            DocumentKind::PurchaseOrder => &Self::PURCHASE_ORDER,
        }
    }
}

/// Produces [`NormalizedDocument`]s from OCR payloads.
#[derive(Debug, Clone)]
pub struct DocumentMapper {
    kind: DocumentKind,
    parser: FieldParser,
    entities: EntityExtractor,
}

impl DocumentMapper {
    /// Create a mapper for one document kind.
    pub fn new(kind: DocumentKind) -> Self {
        Self::with_parser(kind, FieldParser::new())
    }

    /// Create a mapper with a configured field parser.
    pub fn with_parser(kind: DocumentKind, parser: FieldParser) -> Self {
        Self {
            kind,
            entities: EntityExtractor::new(parser.clone()),
            parser,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Validate the payload shape and map its first document.
    pub fn map(
        &self,
        payload: &OcrPayload,
        partner_id: &str,
    ) -> Result<NormalizedDocument, ValidationError> {
        let partner_id = partner_id.trim();
        if partner_id.is_empty() {
            return Err(ValidationError::MissingPartnerId);
        }

        let document = payload
            .documents
            .as_deref()
            .and_then(|docs| docs.first())
            .ok_or(ValidationError::NoDocuments)?;
        let fields = document.fields.as_ref().ok_or(ValidationError::MissingFields)?;

        if payload.document_count() > 1 {
            debug!(
                "Payload has {} documents, mapping the first",
                payload.document_count()
            );
        }

        Ok(self.map_fields(fields, partner_id))
    }

    /// Map a field map. Never fails.
    pub fn map_fields(&self, fields: &FieldMap, partner_id: &str) -> NormalizedDocument {
        let schema = FieldSchema::for_kind(self.kind);
        let parser = &self.parser;

        let document_date = parser
            .date(first_present(fields, schema.date), false)
            .unwrap_or_else(|| parser.today());
        let payment_terms = first_content(parser, fields, schema.payment_terms);
        let due_date = parser
            .date(first_present(fields, schema.due_date), true)
            .unwrap_or_else(|| parser.due_date(document_date, payment_terms.as_deref()));

        let header = DocumentHeader {
            document_number: first_content(parser, fields, schema.number),
            document_date,
            due_date,
            reference: first_content(parser, fields, schema.reference),
            payment_terms,
        };

        let totals = self.totals(fields, schema);
        let customer = self.entities.customer(fields);
        let vendor = self.entities.vendor(fields);
        let line_items = self.entities.line_items(fields, schema.items);

        info!(
            kind = %self.kind,
            number = header.document_number.as_deref().unwrap_or("-"),
            items = line_items.len(),
            "Mapped OCR fields"
        );

        NormalizedDocument {
            kind: self.kind,
            partner_id: partner_id.to_string(),
            status: DocumentStatus::Processing,
            header,
            totals,
            customer,
            vendor,
            line_items,
        }
    }

    fn totals(&self, fields: &FieldMap, schema: &FieldSchema) -> DocumentTotals {
        let total = self.money(fields, schema.total);
        let subtotal = match self.money(fields, schema.subtotal) {
            m if m.is_empty() => total.clone(),
            m => m,
        };
        let discount = self.money(fields, schema.discount);
        let tax = self.money(fields, schema.tax);

        let mut currency = [&total, &subtotal, &discount, &tax]
            .iter()
            .fold(Currency::default(), |acc, m| acc.or(&m.currency));

        if currency.code.is_none() {
            currency.code = first_content(&self.parser, fields, schema.currency_code)
                .map(|c| c.to_uppercase());
        }

        DocumentTotals {
            total_amount: total.amount,
            subtotal_amount: subtotal.amount,
            discount_amount: discount.amount,
            tax_amount: tax.amount,
            currency,
        }
    }

    /// First field in `names` that yields an amount.
    fn money(&self, fields: &FieldMap, names: &[&str]) -> Money {
        names
            .iter()
            .map(|name| self.parser.currency(fields.get(*name)))
            .find(|m| !m.is_empty())
            .unwrap_or_default()
    }
}
