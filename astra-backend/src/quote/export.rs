//! Comparison export
//!
//! Formatting only: the structured form is the comparison's own serialized
//! shape, and the markdown renderer neither recomputes nor reorders
//! anything, so an export always mirrors the engine's ranking exactly.

use crate::quote::types::Comparison;

/// Render a comparison as a markdown table, preceded by a listing of the
/// input specification's fields.
pub fn to_markdown(comparison: &Comparison) -> String {
    let mut lines = vec!["# Cloud Pricing Comparison".to_string(), String::new()];

    if let Some(spec) = comparison.spec.as_object() {
        lines.push("## Specification".to_string());
        for (key, value) in spec {
            lines.push(format!("- **{}**: {}", key, value));
        }
        lines.push(String::new());
    }

    lines.push("## Quotes".to_string());
    lines.push(String::new());
    lines.push("| Provider | Price (USD) | Billing Period |".to_string());
    lines.push("|----------|-------------|----------------|".to_string());
    for quote in &comparison.quotes {
        let price = quote
            .price_usd
            .map(|p| format!("${:.2}", p))
            .unwrap_or_else(|| "unknown".to_string());
        lines.push(format!(
            "| {} | {} | {} |",
            quote.provider, price, quote.billing_period
        ));
    }

    lines.join("\n")
}
