//! Common regex patterns for OCR field normalization.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Line breaks and the whitespace around them
    pub static ref LINE_BREAKS: Regex = Regex::new(r"\s*[\r\n]+\s*").unwrap();

    // Day-first slash dates: DD/MM/YY and DD/MM/YYYY
    pub static ref DATE_DMY_SHORT: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})/(\d{2})$"
    ).unwrap();

    pub static ref DATE_DMY_LONG: Regex = Regex::new(
        r"^(\d{1,2})/(\d{1,2})/(\d{4})$"
    ).unwrap();

    // ISO date, optionally followed by a time part
    pub static ref DATE_ISO_PREFIX: Regex = Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$"
    ).unwrap();

    // "15th", "1st", ...
    pub static ref ORDINAL_SUFFIX: Regex = Regex::new(
        r"(?i)(\d)(?:st|nd|rd|th)\b"
    ).unwrap();

    // Anything that is not part of a plain decimal number
    pub static ref NON_NUMERIC: Regex = Regex::new(r"[^\d.\-]").unwrap();

    // Leading currency symbol run: "$", "£", "USD ", "Rp"
    pub static ref LEADING_SYMBOL: Regex = Regex::new(r"^([^\d.\-]+)").unwrap();

    // Rupiah marker: "Rp67.998", "Rp. 10.000", "IDR Rp 5.000"
    pub static ref RUPIAH_MARKER: Regex = Regex::new(
        r"(?i)(?:^|[^a-z])rp\.?\s*-?\d"
    ).unwrap();

    // Anything that is not part of a rupiah-formatted number
    pub static ref NON_RUPIAH_NUMERIC: Regex = Regex::new(r"[^\d.,\-]").unwrap();

    // Payment terms
    pub static ref TERMS_NET: Regex = Regex::new(r"(?i)\bnet\s*(-?\d+)").unwrap();

    pub static ref TERMS_DAYS: Regex = Regex::new(
        r"(?i)(-?\d+)\s*(?:days?\b|d\b)"
    ).unwrap();

    pub static ref BARE_INTEGER: Regex = Regex::new(r"-?\d+").unwrap();

    // Slug separators
    pub static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}
