//! x402 Protocol data types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decimal places assumed for USD-pegged settlement assets (USDC)
pub const STABLECOIN_DECIMALS: u32 = 6;

/// Payment requirements returned by a server in a 402 response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    #[serde(default)]
    pub x402_version: Option<u8>,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
}

/// One acceptable payment option from the `accepts` list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    /// Amount in the asset's smallest unit. Servers send either a JSON
    /// string or a bare number.
    #[serde(default)]
    pub max_amount_required: Option<Value>,
    #[serde(default)]
    pub pay_to: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Provider-specific extension block (e.g. dynamic pricing details)
    #[serde(default)]
    pub extra: Option<Value>,
}

impl PaymentRequirements {
    /// Amount in smallest units, tolerant of string or numeric encoding.
    pub fn amount(&self) -> Option<f64> {
        match self.max_amount_required.as_ref()? {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

/// Payment instructions passed through to callers that want to settle the
/// quote later. Mirrors the `accepts` entry the quote was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X402Instructions {
    pub scheme: Option<String>,
    pub network: Option<String>,
    pub pay_to: Option<String>,
    pub asset: Option<String>,
    pub max_amount_required: Option<Value>,
    pub description: Option<String>,
}

/// Partial quote extracted from one probe of an upstream endpoint.
/// Transient: lives only for the duration of a single adapter call.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteFragment {
    pub price_usd: Option<f64>,
    pub currency: Option<String>,
    pub network: Option<String>,
    pub recipient: Option<String>,
    pub x402_instructions: Option<X402Instructions>,
    /// True when the endpoint answered without demanding payment
    pub free: bool,
    /// Original status code and decoded body, passed through untouched
    pub metadata: Map<String, Value>,
}
