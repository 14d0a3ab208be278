//! Partner slug generation.

use super::patterns::NON_SLUG;

/// Slug used when a name yields nothing usable.
pub const UNKNOWN_PARTNER: &str = "unknown-vendor";

/// Maximum slug length.
pub const MAX_SLUG_LEN: usize = 44;

/// Lowercase, dash-separated key for a party name.
pub fn partner_slug(name: Option<&str>) -> String {
    let lowered = name.unwrap_or_default().to_lowercase();
    let dashed = NON_SLUG.replace_all(&lowered, "-");

    // Only ASCII remains, so chars and bytes line up.
    let truncated: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    let slug = truncated.trim_end_matches('-');

    if slug.is_empty() {
        UNKNOWN_PARTNER.to_string()
    } else {
        slug.to_string()
    }
}
