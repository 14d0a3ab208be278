//! Rendering of normalized documents.

use finscan_core::NormalizedDocument;
use finscan_core::models::document::PartyData;
use finscan_core::models::money::Currency;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn format_document(document: &NormalizedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Csv => format_csv(document),
        OutputFormat::Text => Ok(format_text(document)),
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn currency_label(currency: &Currency) -> String {
    currency
        .code
        .clone()
        .or_else(|| currency.symbol.clone())
        .unwrap_or_default()
}

fn format_csv(document: &NormalizedDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "kind",
        "partner_id",
        "document_number",
        "document_date",
        "due_date",
        "reference",
        "vendor_name",
        "vendor_tax_id",
        "customer_name",
        "customer_tax_id",
        "subtotal_amount",
        "discount_amount",
        "tax_amount",
        "total_amount",
        "currency_symbol",
        "currency_code",
        "line_items",
    ])?;

    let header = &document.header;
    let totals = &document.totals;
    wtr.write_record([
        document.kind.as_str().to_string(),
        document.partner_id.clone(),
        opt(&header.document_number),
        header.document_date.to_string(),
        header.due_date.to_string(),
        opt(&header.reference),
        opt(&document.vendor.name),
        opt(&document.vendor.tax_id),
        opt(&document.customer.name),
        opt(&document.customer.tax_id),
        opt(&totals.subtotal_amount),
        opt(&totals.discount_amount),
        opt(&totals.tax_amount),
        opt(&totals.total_amount),
        opt(&totals.currency.symbol),
        opt(&totals.currency.code),
        document.line_items.len().to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn push_party(output: &mut String, title: &str, party: &PartyData) {
    output.push_str(&format!("{}:\n", title));
    output.push_str(&format!("  {}\n", party.name.as_deref().unwrap_or("-")));
    if let Some(address) = &party.address {
        output.push_str(&format!("  {}\n", address));
    }
    if let Some(tax_id) = &party.tax_id {
        output.push_str(&format!("  Tax ID: {}\n", tax_id));
    }
    output.push('\n');
}

pub fn format_text(document: &NormalizedDocument) -> String {
    let mut output = String::new();
    let header = &document.header;
    let totals = &document.totals;
    let currency = currency_label(&totals.currency);

    output.push_str(&format!(
        "{}: {}\n",
        document.kind,
        header.document_number.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("Date: {}\n", header.document_date));
    output.push_str(&format!("Due:  {}\n", header.due_date));
    if let Some(reference) = &header.reference {
        output.push_str(&format!("Reference: {}\n", reference));
    }
    output.push('\n');

    push_party(&mut output, "Vendor", &document.vendor);
    push_party(&mut output, "Customer", &document.customer);

    if !document.line_items.is_empty() {
        output.push_str("Items:\n");
        for (i, item) in document.line_items.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} x{} = {}\n",
                i + 1,
                item.description.as_deref().unwrap_or("-"),
                opt(&item.quantity),
                opt(&item.amount)
            ));
        }
        output.push('\n');
    }

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal: {} {}\n", opt(&totals.subtotal_amount), currency));
    output.push_str(&format!("  Discount: {} {}\n", opt(&totals.discount_amount), currency));
    output.push_str(&format!("  Tax:      {} {}\n", opt(&totals.tax_amount), currency));
    output.push_str(&format!("  Total:    {} {}\n", opt(&totals.total_amount), currency));

    output
}
