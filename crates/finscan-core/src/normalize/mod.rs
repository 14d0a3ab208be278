//! Normalization of OCR field output into canonical document records.

pub mod entities;
pub mod fields;
pub mod mapper;
pub mod patterns;
pub mod slug;

pub use entities::{EntityExtractor, PartySchema};
pub use fields::FieldParser;
pub use mapper::{DocumentMapper, FieldSchema};
pub use slug::partner_slug;

use crate::models::field::{FieldMap, FieldValue, OcrField};

/// Whether a field carries any text or typed value.
fn has_data(field: &OcrField) -> bool {
    field.content.as_deref().is_some_and(|c| !c.trim().is_empty())
        || field.value != FieldValue::None
}

/// First field in `names` that carries data.
pub(crate) fn first_present<'a>(fields: &'a FieldMap, names: &[&str]) -> Option<&'a OcrField> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|f| has_data(f))
}

/// First non-empty text among `names`.
pub(crate) fn first_content(parser: &FieldParser, fields: &FieldMap, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| parser.content(fields.get(*name)))
}
