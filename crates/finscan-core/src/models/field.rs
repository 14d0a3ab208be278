//! OCR field and payload wire model.
//!
//! The provider returns each field in one of several shapes. Every shape is
//! folded into [`FieldValue`] when the payload is deserialized, so the
//! normalizers only ever match on an explicit variant.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Field name to field map of one analyzed document.
pub type FieldMap = BTreeMap<String, OcrField>;

/// One field as returned by the OCR provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct OcrField {
    /// Raw text the provider read for this field.
    pub content: Option<String>,

    /// Provider confidence (0.0 - 1.0).
    pub confidence: Option<f32>,

    /// Typed value, if the provider produced one.
    pub value: FieldValue,
}

/// The typed part of an OCR field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// No typed value (content-only or empty field).
    #[default]
    None,
    /// `{value: "text"}` or `{value: 12.5}`.
    Scalar(Scalar),
    /// `{value: {text: "..."}}`.
    NestedText(String),
    /// `{value: {amount, currencySymbol, currencyCode}}`.
    Money(StructuredMoney),
    /// `{values: [...]}` or legacy `{valueArray: [...]}`.
    Repeated(Vec<OcrField>),
    /// Sub-field map of one repeated-group entry.
    Object(FieldMap),
}

/// Scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(Decimal),
}

/// Structured currency value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredMoney {
    pub amount: Option<Decimal>,
    pub currency_symbol: Option<String>,
    pub currency_code: Option<String>,
}

impl OcrField {
    /// Content-only field.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Field with a typed value and no content.
    pub fn with_value(value: FieldValue) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Sub-fields of a repeated-group entry.
    pub fn properties(&self) -> Option<&FieldMap> {
        match &self.value {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Entries of a repeated group.
    pub fn entries(&self) -> &[OcrField] {
        match &self.value {
            FieldValue::Repeated(entries) => entries,
            _ => &[],
        }
    }
}

impl From<Value> for OcrField {
    fn from(raw: Value) -> Self {
        let map = match raw {
            Value::Object(map) => map,
            Value::String(s) => return OcrField::text(s),
            Value::Number(n) => {
                return OcrField::with_value(
                    decimal_from_number(&n).map_or(FieldValue::None, |d| {
                        FieldValue::Scalar(Scalar::Number(d))
                    }),
                );
            }
            _ => return OcrField::default(),
        };

        OcrField {
            content: map.get("content").and_then(Value::as_str).map(str::to_string),
            confidence: map
                .get("confidence")
                .and_then(Value::as_f64)
                .map(|c| c as f32),
            value: field_value(&map),
        }
    }
}

fn field_value(map: &Map<String, Value>) -> FieldValue {
    for key in ["values", "valueArray"] {
        if let Some(Value::Array(entries)) = map.get(key) {
            return repeated(entries);
        }
    }

    for key in ["properties", "valueObject"] {
        if let Some(Value::Object(sub)) = map.get(key) {
            return FieldValue::Object(sub_fields(sub));
        }
    }

    match map.get("value") {
        Some(Value::String(s)) => return FieldValue::Scalar(Scalar::Text(s.clone())),
        Some(Value::Number(n)) => {
            if let Some(d) = decimal_from_number(n) {
                return FieldValue::Scalar(Scalar::Number(d));
            }
        }
        Some(Value::Object(obj)) => return object_value(obj),
        Some(Value::Array(entries)) => return repeated(entries),
        _ => {}
    }

    if let Some(Value::Object(obj)) = map.get("valueCurrency") {
        return FieldValue::Money(structured_money(obj));
    }

    for key in ["valueNumber", "valueInteger"] {
        if let Some(Value::Number(n)) = map.get(key) {
            if let Some(d) = decimal_from_number(n) {
                return FieldValue::Scalar(Scalar::Number(d));
            }
        }
    }

    for key in ["valueString", "valueDate", "valueTime", "valuePhoneNumber", "valueCountryRegion"] {
        if let Some(Value::String(s)) = map.get(key) {
            return FieldValue::Scalar(Scalar::Text(s.clone()));
        }
    }

    FieldValue::None
}

fn object_value(obj: &Map<String, Value>) -> FieldValue {
    if ["amount", "currencySymbol", "currencyCode"]
        .iter()
        .any(|k| obj.contains_key(*k))
    {
        return FieldValue::Money(structured_money(obj));
    }

    if let Some(Value::String(text)) = obj.get("text") {
        return FieldValue::NestedText(text.clone());
    }

    FieldValue::Object(sub_fields(obj))
}

fn repeated(entries: &[Value]) -> FieldValue {
    FieldValue::Repeated(entries.iter().cloned().map(OcrField::from).collect())
}

fn sub_fields(obj: &Map<String, Value>) -> FieldMap {
    obj.iter()
        .map(|(k, v)| (k.clone(), OcrField::from(v.clone())))
        .collect()
}

fn structured_money(obj: &Map<String, Value>) -> StructuredMoney {
    let amount = match obj.get("amount") {
        Some(Value::Number(n)) => decimal_from_number(n),
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    StructuredMoney {
        amount,
        currency_symbol: text("currencySymbol"),
        currency_code: text("currencyCode"),
    }
}

/// Convert a JSON number through its text form so `123.45` stays exact.
fn decimal_from_number(n: &serde_json::Number) -> Option<Decimal> {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Raw result of one OCR analysis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrPayload {
    #[serde(default)]
    pub documents: Option<Vec<OcrDocument>>,
}

/// One analyzed document inside an OCR payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrDocument {
    /// Provider document type, e.g. `invoice`.
    #[serde(default, rename = "docType")]
    pub doc_type: Option<String>,

    #[serde(default)]
    pub fields: Option<FieldMap>,

    #[serde(default)]
    pub confidence: Option<f32>,
}

impl OcrPayload {
    /// Read a payload from JSON, unwrapping the provider's `analyzeResult`
    /// envelope when present.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let inner = match value {
            Value::Object(mut map) => match map.remove("analyzeResult") {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };

        serde_json::from_value(inner).map_err(|e| ValidationError::MalformedPayload(e.to_string()))
    }

    /// Parse a payload from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
        Self::from_value(value)
    }

    /// Number of documents in the payload.
    pub fn document_count(&self) -> usize {
        self.documents.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: Value) -> OcrField {
        OcrField::from(value)
    }

    #[test]
    fn test_content_only_field() {
        let f = field(json!({ "content": "INV-100", "confidence": 0.98 }));
        assert_eq!(f.content.as_deref(), Some("INV-100"));
        assert_eq!(f.value, FieldValue::None);
        assert!(f.confidence.is_some());
    }

    #[test]
    fn test_scalar_values() {
        let f = field(json!({ "value": "Acme" }));
        assert_eq!(f.value, FieldValue::Scalar(Scalar::Text("Acme".into())));

        let f = field(json!({ "value": 123.45 }));
        assert_eq!(
            f.value,
            FieldValue::Scalar(Scalar::Number(Decimal::from_str("123.45").unwrap()))
        );
    }

    #[test]
    fn test_nested_text_value() {
        let f = field(json!({ "value": { "text": "12 Main St" } }));
        assert_eq!(f.value, FieldValue::NestedText("12 Main St".into()));
    }

    #[test]
    fn test_structured_money_value() {
        let f = field(json!({
            "content": "$110.00",
            "value": { "amount": 110, "currencySymbol": "$", "currencyCode": "USD" }
        }));
        assert_eq!(
            f.value,
            FieldValue::Money(StructuredMoney {
                amount: Some(Decimal::from(110)),
                currency_symbol: Some("$".into()),
                currency_code: Some("USD".into()),
            })
        );
    }

    #[test]
    fn test_rest_typed_keys() {
        let f = field(json!({
            "type": "currency",
            "valueCurrency": { "amount": 5.5, "currencySymbol": "€" },
            "content": "€5,50"
        }));
        match f.value {
            FieldValue::Money(m) => {
                assert_eq!(m.amount, Some(Decimal::from_str("5.5").unwrap()));
                assert_eq!(m.currency_code, None);
            }
            other => panic!("unexpected value {other:?}"),
        }

        let f = field(json!({ "type": "date", "valueDate": "2023-05-15" }));
        assert_eq!(f.value, FieldValue::Scalar(Scalar::Text("2023-05-15".into())));
    }

    #[test]
    fn test_repeated_group_shapes() {
        let modern = field(json!({
            "values": [
                { "kind": "object", "properties": { "Description": { "content": "Widget" } } }
            ]
        }));
        assert_eq!(modern.entries().len(), 1);
        let props = modern.entries()[0].properties().unwrap();
        assert_eq!(props["Description"].content.as_deref(), Some("Widget"));

        let legacy = field(json!({
            "type": "array",
            "valueArray": [
                { "type": "object", "valueObject": { "Quantity": { "valueNumber": 2 } } }
            ]
        }));
        let props = legacy.entries()[0].properties().unwrap();
        assert_eq!(
            props["Quantity"].value,
            FieldValue::Scalar(Scalar::Number(Decimal::from(2)))
        );
    }

    #[test]
    fn test_malformed_field_degrades_to_empty() {
        assert_eq!(field(json!(null)), OcrField::default());
        assert_eq!(field(json!(true)), OcrField::default());
        let f = field(json!({ "content": 42 }));
        assert_eq!(f.content, None);
    }

    #[test]
    fn test_payload_envelope() {
        let payload = OcrPayload::from_value(json!({
            "status": "succeeded",
            "analyzeResult": {
                "documents": [{ "docType": "invoice", "fields": { "InvoiceId": { "content": "1" } } }]
            }
        }))
        .unwrap();
        assert_eq!(payload.document_count(), 1);

        let payload = OcrPayload::from_value(json!({})).unwrap();
        assert_eq!(payload.document_count(), 0);

        assert!(OcrPayload::from_json("not json").is_err());
        assert!(OcrPayload::from_value(json!({ "documents": "nope" })).is_err());
    }
}
