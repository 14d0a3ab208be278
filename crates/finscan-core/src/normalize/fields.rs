//! Scalar normalization of single OCR fields.
//!
//! Every parser takes a possibly-absent field and returns a null-safe
//! default instead of failing. Anomalies are logged, never raised.

use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::field::{FieldValue, OcrField, Scalar};
use crate::models::money::{Currency, Money};

use super::patterns::{
    BARE_INTEGER, DATE_DMY_LONG, DATE_DMY_SHORT, DATE_ISO_PREFIX, LEADING_SYMBOL, LINE_BREAKS,
    NON_NUMERIC, NON_RUPIAH_NUMERIC, ORDINAL_SUFFIX, RUPIAH_MARKER, TERMS_DAYS, TERMS_NET,
};

/// Formats tried after the explicit day-first and ISO patterns.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B, %Y",
    "%Y%m%d",
];

/// Default payment period in days.
pub const DEFAULT_PAYMENT_DAYS: u32 = 30;

/// Converts OCR fields into domain primitives.
#[derive(Debug, Clone)]
pub struct FieldParser {
    /// Date substituted for missing or unreadable dates. Today when unset.
    reference_date: Option<NaiveDate>,
    /// Days added to the document date when no usable payment terms exist.
    default_payment_days: u32,
}

impl FieldParser {
    /// Create a parser that substitutes today's date.
    pub fn new() -> Self {
        Self {
            reference_date: None,
            default_payment_days: DEFAULT_PAYMENT_DAYS,
        }
    }

    /// Pin the substitute date.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Set the default payment period.
    pub fn with_default_payment_days(mut self, days: u32) -> Self {
        self.default_payment_days = days;
        self
    }

    /// Date used when a required date is missing or unreadable.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Best-effort text of a field: `content`, then a text `value`, then `value.text`.
    pub fn content(&self, field: Option<&OcrField>) -> Option<String> {
        let field = field?;
        let raw = field
            .content
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(match &field.value {
                FieldValue::Scalar(Scalar::Text(s)) => Some(s.as_str()),
                FieldValue::NestedText(s) => Some(s.as_str()),
                _ => None,
            })?;

        clean_text(raw)
    }

    /// Resolve a date.
    ///
    /// Empty fields yield `None` when `optional`, otherwise today. Unreadable
    /// text yields today with a warning.
    pub fn date(&self, field: Option<&OcrField>, optional: bool) -> Option<NaiveDate> {
        let Some(text) = self.content(field) else {
            return if optional { None } else { Some(self.today()) };
        };

        if let Some(date) = parse_date_text(&text) {
            return Some(date);
        }

        // A typed value may still be readable when the printed text is not.
        let typed = field.and_then(|f| match &f.value {
            FieldValue::Scalar(Scalar::Text(s)) | FieldValue::NestedText(s) => parse_date_text(s),
            _ => None,
        });
        if let Some(date) = typed {
            return Some(date);
        }

        warn!(value = %text, "Unparseable date, substituting {}", self.today());
        Some(self.today())
    }

    /// Resolve a monetary value.
    pub fn currency(&self, field: Option<&OcrField>) -> Money {
        let Some(field) = field else {
            return Money::empty();
        };
        let text = self.content(Some(field));

        let typed = match &field.value {
            FieldValue::Scalar(Scalar::Number(n)) => Some(Money::amount_only(*n)),
            FieldValue::Money(m) if m.amount.is_some() => Some(Money::new(
                m.amount,
                Currency::new(m.currency_symbol.clone(), m.currency_code.clone()),
            )),
            _ => None,
        };

        // Rupiah text overrides the provider's currency, and its amount when parseable.
        if let Some(text) = text.as_deref().filter(|t| RUPIAH_MARKER.is_match(t)) {
            let amount =
                parse_rupiah_amount(text).or_else(|| typed.as_ref().and_then(|m| m.amount));
            if amount.is_none() {
                warn!(value = %text, "Unparseable rupiah amount");
            }
            return Money::new(amount, Currency::rupiah());
        }

        if let Some(money) = typed {
            return money;
        }

        match text {
            Some(text) => {
                let money = parse_money_text(&text);
                if money.is_empty() {
                    warn!(value = %text, "Unparseable amount");
                }
                money
            }
            None => Money::empty(),
        }
    }

    /// Resolve a plain number (quantities, rates).
    pub fn numeric(&self, field: Option<&OcrField>) -> Option<Decimal> {
        let field = field?;
        if let FieldValue::Scalar(Scalar::Number(n)) = &field.value {
            return Some(*n);
        }

        let text = self.content(Some(field))?;
        let number = parse_plain_amount(&text);
        if number.is_none() {
            debug!(value = %text, "Unparseable number");
        }
        number
    }

    /// Due date derived from payment terms, falling back to the default period.
    pub fn due_date(&self, document_date: NaiveDate, payment_terms: Option<&str>) -> NaiveDate {
        let days = payment_terms
            .and_then(payment_days)
            .filter(|d| *d > 0)
            .map(|d| d as u64)
            .unwrap_or(u64::from(self.default_payment_days));

        document_date
            .checked_add_days(Days::new(days))
            .unwrap_or_else(|| {
                warn!(days, terms = ?payment_terms, "Payment terms out of range, using default");
                document_date
                    .checked_add_days(Days::new(u64::from(self.default_payment_days)))
                    .unwrap_or(document_date)
            })
    }
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse line breaks to single spaces and trim.
fn clean_text(raw: &str) -> Option<String> {
    let cleaned = LINE_BREAKS.replace_all(raw, " ");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Parse a date string. Day-first slash dates are matched before anything else.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Some(caps) = DATE_DMY_SHORT.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(expand_two_digit_year(caps[3].parse().ok()?), month, day);
    }

    if let Some(caps) = DATE_DMY_LONG.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = DATE_ISO_PREFIX.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    let text = ORDINAL_SUFFIX.replace_all(text, "$1");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
}

/// Two-digit years below 50 are 20xx, the rest 19xx.
fn expand_two_digit_year(year: i32) -> i32 {
    if year < 50 { 2000 + year } else { 1900 + year }
}

/// Parse an amount with optional leading currency symbol (e.g. `$1,234.50`).
pub fn parse_money_text(text: &str) -> Money {
    let symbol = LEADING_SYMBOL
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty());

    Money::new(parse_plain_amount(text), Currency::new(symbol, None))
}

/// Strip everything but digits, `.` and `-`, then parse.
pub fn parse_plain_amount(text: &str) -> Option<Decimal> {
    let stripped = NON_NUMERIC.replace_all(text, "");
    if stripped.is_empty() {
        return None;
    }
    Decimal::from_str(&stripped).ok()
}

/// Parse a rupiah amount: `.` groups thousands, `,` marks decimals.
pub fn parse_rupiah_amount(text: &str) -> Option<Decimal> {
    // Drop the marker first so "Rp." does not contribute a dot.
    let without_marker = text.replace(['R', 'r'], " ");
    let numeric = NON_RUPIAH_NUMERIC.replace_all(&without_marker, "");
    let normalized = numeric.replace('.', "").replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

/// Day count from payment terms: `net N`, then `N days`/`Nd`, then a bare integer.
pub fn payment_days(terms: &str) -> Option<i64> {
    [&*TERMS_NET, &*TERMS_DAYS]
        .iter()
        .find_map(|re| re.captures(terms).and_then(|c| c[1].parse::<i64>().ok()))
        .or_else(|| BARE_INTEGER.find(terms).and_then(|m| m.as_str().parse::<i64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::StructuredMoney;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parser() -> FieldParser {
        FieldParser::new().with_reference_date(ymd(2024, 1, 1))
    }

    #[test]
    fn test_content_priority() {
        let p = parser();
        let mut f = OcrField::text("  Acme\nCorp \r\n Ltd ");
        f.value = FieldValue::Scalar(Scalar::Text("ignored".into()));
        assert_eq!(p.content(Some(&f)).as_deref(), Some("Acme Corp Ltd"));

        let f = OcrField::with_value(FieldValue::Scalar(Scalar::Text("From value".into())));
        assert_eq!(p.content(Some(&f)).as_deref(), Some("From value"));

        let f = OcrField::with_value(FieldValue::NestedText("Nested".into()));
        assert_eq!(p.content(Some(&f)).as_deref(), Some("Nested"));

        let f = OcrField::with_value(FieldValue::Scalar(Scalar::Number(dec("1"))));
        assert_eq!(p.content(Some(&f)), None);
        assert_eq!(p.content(None), None);
        assert_eq!(p.content(Some(&OcrField::text("   "))), None);
    }

    #[test]
    fn test_date_day_first_formats() {
        let p = parser();
        assert_eq!(p.date(Some(&OcrField::text("15/05/23")), false), Some(ymd(2023, 5, 15)));
        assert_eq!(p.date(Some(&OcrField::text("15/05/78")), false), Some(ymd(1978, 5, 15)));
        assert_eq!(p.date(Some(&OcrField::text("01/02/49")), false), Some(ymd(2049, 2, 1)));
        assert_eq!(p.date(Some(&OcrField::text("01/02/50")), false), Some(ymd(1950, 2, 1)));
        assert_eq!(p.date(Some(&OcrField::text("03/04/2022")), false), Some(ymd(2022, 4, 3)));
        assert_eq!(p.date(Some(&OcrField::text("2023-05-15")), false), Some(ymd(2023, 5, 15)));
    }

    #[test]
    fn test_date_generic_formats() {
        assert_eq!(parse_date_text("2023-05-15T00:00:00.000Z"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date_text("May 15, 2023"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date_text("15 May 2023"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date_text("May 15th, 2023"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date_text("15.05.2023"), Some(ymd(2023, 5, 15)));
        assert_eq!(parse_date_text("31/02/2023"), None);
    }

    #[test]
    fn test_date_missing_and_unparseable() {
        let p = parser();
        assert_eq!(p.date(None, true), None);
        assert_eq!(p.date(Some(&OcrField::text("")), true), None);
        assert_eq!(p.date(None, false), Some(ymd(2024, 1, 1)));
        assert_eq!(p.date(Some(&OcrField::text("soon")), true), Some(ymd(2024, 1, 1)));
    }

    #[test]
    fn test_date_falls_back_to_typed_value() {
        let mut f = OcrField::text("15 Mei 2023");
        f.value = FieldValue::Scalar(Scalar::Text("2023-05-15".into()));
        assert_eq!(parser().date(Some(&f), false), Some(ymd(2023, 5, 15)));
    }

    #[test]
    fn test_currency_symbol_capture() {
        let p = parser();
        let m = p.currency(Some(&OcrField::text("$123.45")));
        assert_eq!(m.amount, Some(dec("123.45")));
        assert_eq!(m.currency.symbol.as_deref(), Some("$"));
        assert_eq!(m.currency.code, None);

        let m = p.currency(Some(&OcrField::text("£123.45")));
        assert_eq!(m.amount, Some(dec("123.45")));
        assert_eq!(m.currency.symbol.as_deref(), Some("£"));

        let m = p.currency(Some(&OcrField::text("$1,234.50")));
        assert_eq!(m.amount, Some(dec("1234.50")));
    }

    #[test]
    fn test_currency_unparseable() {
        let p = parser();
        assert_eq!(p.currency(None), Money::empty());
        assert_eq!(p.currency(Some(&OcrField::text("N/A"))), Money::empty());
        assert_eq!(p.currency(Some(&OcrField::text("$"))), Money::empty());
        assert_eq!(p.currency(Some(&OcrField::text("1.2.3"))), Money::empty());
    }

    #[test]
    fn test_currency_direct_number() {
        let f = OcrField::with_value(FieldValue::Scalar(Scalar::Number(dec("42.5"))));
        assert_eq!(parser().currency(Some(&f)), Money::amount_only(dec("42.5")));
    }

    #[test]
    fn test_currency_structured() {
        let f = OcrField {
            content: Some("€ 99,00".into()),
            confidence: None,
            value: FieldValue::Money(StructuredMoney {
                amount: Some(dec("99")),
                currency_symbol: Some("€".into()),
                currency_code: Some("EUR".into()),
            }),
        };
        let m = parser().currency(Some(&f));
        assert_eq!(m.amount, Some(dec("99")));
        assert_eq!(m.currency, Currency::new(Some("€".into()), Some("EUR".into())));
    }

    #[test]
    fn test_rupiah_overrides_structured_value() {
        let f = OcrField {
            content: Some("Rp67.998".into()),
            confidence: None,
            value: FieldValue::Money(StructuredMoney {
                amount: Some(dec("67.998")),
                currency_symbol: Some("Rp".into()),
                currency_code: Some("USD".into()),
            }),
        };
        let m = parser().currency(Some(&f));
        assert_eq!(m.amount, Some(dec("67998")));
        assert_eq!(m.currency, Currency::rupiah());
    }

    #[test]
    fn test_rupiah_unparseable_text_keeps_typed_amount() {
        let f = OcrField {
            content: Some("Rp 1,500,000.00".into()),
            confidence: None,
            value: FieldValue::Money(StructuredMoney {
                amount: Some(dec("1500000")),
                currency_symbol: Some("Rp".into()),
                currency_code: Some("IDR".into()),
            }),
        };
        let m = parser().currency(Some(&f));
        assert_eq!(m.amount, Some(dec("1500000")));
        assert_eq!(m.currency, Currency::rupiah());

        let f = OcrField {
            content: Some("Rp 1,500,000.00".into()),
            confidence: None,
            value: FieldValue::Scalar(Scalar::Number(dec("1500000"))),
        };
        let m = parser().currency(Some(&f));
        assert_eq!(m.amount, Some(dec("1500000")));
        assert_eq!(m.currency, Currency::rupiah());
    }

    #[test]
    fn test_rupiah_text_formats() {
        assert_eq!(parse_rupiah_amount("Rp67.998"), Some(dec("67998")));
        assert_eq!(parse_rupiah_amount("Rp 1.234.567,89"), Some(dec("1234567.89")));
        assert_eq!(parse_rupiah_amount("Rp. 10.000"), Some(dec("10000")));
        assert_eq!(parse_rupiah_amount("Rp"), None);
        assert!(!RUPIAH_MARKER.is_match("Corp 100"));
    }

    #[test]
    fn test_numeric() {
        let p = parser();
        let f = OcrField::with_value(FieldValue::Scalar(Scalar::Number(dec("3"))));
        assert_eq!(p.numeric(Some(&f)), Some(dec("3")));
        assert_eq!(p.numeric(Some(&OcrField::text("2.5 hrs"))), Some(dec("2.5")));
        assert_eq!(p.numeric(Some(&OcrField::text("two"))), None);
        assert_eq!(p.numeric(None), None);
    }

    #[test]
    fn test_due_date_from_terms() {
        let p = parser();
        let d = ymd(2023, 5, 15);
        assert_eq!(p.due_date(d, Some("Net 30")), ymd(2023, 6, 14));
        assert_eq!(p.due_date(d, Some("NET15")), ymd(2023, 5, 30));
        assert_eq!(p.due_date(d, Some("Payable within 10 days")), ymd(2023, 5, 25));
        assert_eq!(p.due_date(d, Some("14d")), ymd(2023, 5, 29));
        assert_eq!(p.due_date(d, Some("45")), ymd(2023, 6, 29));
    }

    #[test]
    fn test_due_date_defaults() {
        let p = parser();
        let d = ymd(2023, 5, 15);
        let default = ymd(2023, 6, 14);
        assert_eq!(p.due_date(d, Some("")), default);
        assert_eq!(p.due_date(d, None), default);
        assert_eq!(p.due_date(d, Some("Net -10")), default);
        assert_eq!(p.due_date(d, Some("Net 0")), default);
        assert_eq!(p.due_date(d, Some("Due on receipt")), default);

        let p = parser().with_default_payment_days(14);
        assert_eq!(p.due_date(d, None), ymd(2023, 5, 29));
    }

    #[test]
    fn test_due_date_overflow_uses_default() {
        let d = ymd(2023, 5, 15);
        assert_eq!(parser().due_date(d, Some("Net 999999999")), ymd(2023, 6, 14));

        let p = parser().with_default_payment_days(14);
        assert_eq!(p.due_date(d, Some("Net 999999999")), ymd(2023, 5, 29));
    }
}
