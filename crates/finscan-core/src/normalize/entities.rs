//! Composite entity extraction: customer, vendor and line items.

use tracing::debug;

use crate::models::document::{LineItem, PartyData};
use crate::models::field::{FieldMap, OcrField};

use super::fields::FieldParser;
use super::{first_content, first_present};

/// Ordered field-name fallbacks for one party.
#[derive(Debug, Clone, Copy)]
pub struct PartySchema {
    pub name: &'static [&'static str],
    pub address: &'static [&'static str],
    pub recipient: &'static [&'static str],
    pub tax_id: &'static [&'static str],
}

impl PartySchema {
    pub const CUSTOMER: PartySchema = PartySchema {
        name: &["CustomerName", "BillingAddressRecipient", "ShippingAddressRecipient"],
        address: &["CustomerAddress", "BillingAddress", "ShippingAddress"],
        recipient: &[
            "CustomerAddressRecipient",
            "BillingAddressRecipient",
            "ShippingAddressRecipient",
        ],
        tax_id: &["CustomerTaxId", "CustomerVatNumber", "BuyerTaxId"],
    };

    pub const VENDOR: PartySchema = PartySchema {
        name: &[
            "VendorName",
            "VendorAddressRecipient",
            "RemittanceAddressRecipient",
            "SupplierName",
        ],
        address: &["VendorAddress", "RemittanceAddress", "SupplierAddress"],
        recipient: &["VendorAddressRecipient", "RemittanceAddressRecipient"],
        tax_id: &["VendorTaxId", "VendorVatNumber", "SupplierTaxId"],
    };
}

/// Sub-field names inside one line-item entry.
const ITEM_DESCRIPTION: &[&str] = &["Description", "ProductCode", "Name"];
const ITEM_QUANTITY: &[&str] = &["Quantity"];
const ITEM_UNIT: &[&str] = &["Unit"];
const ITEM_UNIT_PRICE: &[&str] = &["UnitPrice", "Price"];
const ITEM_AMOUNT: &[&str] = &["Amount", "LineTotal", "Total"];

/// Builds parties and line items from a document's field map.
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor {
    parser: FieldParser,
}

impl EntityExtractor {
    pub fn new(parser: FieldParser) -> Self {
        Self { parser }
    }

    /// Bill-to party.
    pub fn customer(&self, fields: &FieldMap) -> PartyData {
        self.party(fields, &PartySchema::CUSTOMER)
    }

    /// Issuing party.
    pub fn vendor(&self, fields: &FieldMap) -> PartyData {
        self.party(fields, &PartySchema::VENDOR)
    }

    pub fn party(&self, fields: &FieldMap, schema: &PartySchema) -> PartyData {
        PartyData {
            name: first_content(&self.parser, fields, schema.name),
            address: first_content(&self.parser, fields, schema.address),
            recipient: first_content(&self.parser, fields, schema.recipient),
            tax_id: first_content(&self.parser, fields, schema.tax_id),
        }
    }

    /// Line items from the first present items field.
    ///
    /// Structured entries win. Without any, the raw text of the items field
    /// becomes a single line; an items field without text yields nothing.
    pub fn line_items(&self, fields: &FieldMap, items_keys: &[&str]) -> Vec<LineItem> {
        let Some(items) = first_present(fields, items_keys) else {
            return Vec::new();
        };

        let structured: Vec<LineItem> = match items.properties() {
            Some(single) => vec![self.line_item(single)],
            None => items
                .entries()
                .iter()
                .filter_map(OcrField::properties)
                .map(|props| self.line_item(props))
                .collect(),
        };
        let structured: Vec<LineItem> = structured.into_iter().filter(|i| !i.is_empty()).collect();

        if !structured.is_empty() {
            debug!("Extracted {} structured line items", structured.len());
            return structured;
        }

        match self.parser.content(Some(items)) {
            Some(text) => {
                debug!("No structured line items, using raw items text");
                vec![LineItem {
                    description: Some(text),
                    ..LineItem::default()
                }]
            }
            None => Vec::new(),
        }
    }

    fn line_item(&self, props: &FieldMap) -> LineItem {
        LineItem {
            description: first_content(&self.parser, props, ITEM_DESCRIPTION),
            quantity: self.parser.numeric(first_present(props, ITEM_QUANTITY)),
            unit: first_content(&self.parser, props, ITEM_UNIT),
            unit_price: self.parser.currency(first_present(props, ITEM_UNIT_PRICE)).amount,
            amount: self.parser.currency(first_present(props, ITEM_AMOUNT)).amount,
        }
    }
}
