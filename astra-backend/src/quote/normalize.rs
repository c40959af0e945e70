//! Quote normalizer
//!
//! Merges an adapter's raw pricing fields into the canonical [`Quote`]
//! shape, applying the schema defaults and passing provider-specific
//! details through as metadata.

use chrono::Utc;
use serde_json::{Map, Value, json};

use crate::quote::types::{Quote, ResourceCategory};
use crate::x402::QuoteFragment;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_BILLING_PERIOD: &str = "month";

/// Assemble a canonical quote from raw adapter fields.
pub fn build_quote(
    provider: &str,
    category: ResourceCategory,
    price_usd: Option<f64>,
    currency: Option<String>,
    billing_period: Option<&str>,
    metadata: Map<String, Value>,
) -> Quote {
    Quote {
        provider: provider.to_string(),
        category,
        price_usd,
        currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        billing_period: billing_period.unwrap_or(DEFAULT_BILLING_PERIOD).to_string(),
        timestamp: Utc::now(),
        metadata,
    }
}

/// Fold an x402 probe fragment into a canonical quote. The fragment's
/// payment details and the original upstream response land in `metadata`
/// next to the adapter-provided entries; adapter entries win on key clash.
pub fn from_fragment(
    provider: &str,
    category: ResourceCategory,
    fragment: QuoteFragment,
    billing_period: Option<&str>,
    mut metadata: Map<String, Value>,
) -> Quote {
    if let Some(network) = &fragment.network {
        metadata.insert("network".to_string(), json!(network));
    }
    if let Some(recipient) = &fragment.recipient {
        metadata.insert("recipient".to_string(), json!(recipient));
    }
    if let Some(instructions) = &fragment.x402_instructions {
        metadata.insert(
            "x402_instructions".to_string(),
            serde_json::to_value(instructions).unwrap_or(Value::Null),
        );
    }
    if fragment.free {
        metadata.insert("free".to_string(), json!(true));
    }
    let currency = fragment.currency.clone();
    let price_usd = fragment.price_usd;
    for (key, value) in fragment.metadata {
        metadata.entry(key).or_insert(value);
    }
    build_quote(provider, category, price_usd, currency, billing_period, metadata)
}
