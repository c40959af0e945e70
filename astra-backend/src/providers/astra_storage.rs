//! Astra Storage chain-archival uploads (x402-gated, dynamic pricing)
//!
//! Upload pricing is computed upstream per request: a fixed base fee plus a
//! storage cost that tracks the chain's byte price and the current AR/USD
//! rate. Retrieval and queries are flat-priced per request.

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter, round2};
use crate::quote::normalize;
use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};
use crate::x402::{ProbeMethod, QuoteFragment, X402Probe};

/// Fixed service fee included in every upload price
const BASE_FEE_USD: f64 = 0.01;

pub struct AstraStorageAdapter {
    base_url: String,
    probe: X402Probe,
}

impl AstraStorageAdapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            base_url: config.astra_storage_base_url.trim_end_matches('/').to_string(),
            probe: X402Probe::new(config.http_timeout)?,
        })
    }

    /// Pull the upstream `extra` block out of a challenge fragment, if the
    /// server attached one to its first payment option.
    fn challenge_extra(fragment: &QuoteFragment) -> Option<&Value> {
        fragment
            .metadata
            .get("response")?
            .get("accepts")?
            .get(0)?
            .get("extra")
    }

    /// Quote a flat-priced pay-per-request operation (retrieve, query).
    async fn operation_quote(
        &self,
        url: &str,
        method: ProbeMethod,
        payload: Option<&Value>,
        operation: &str,
    ) -> Result<Quote, String> {
        let fragment = self
            .probe
            .probe(url, method, payload)
            .await
            .map_err(|e| format!("Failed to get {} quote from Astra Storage: {}", operation, e))?;

        let mut metadata = Map::new();
        metadata.insert("operation".to_string(), json!(operation));
        metadata.insert("platform".to_string(), json!("arweave"));

        Ok(normalize::from_fragment(
            self.name(),
            ResourceCategory::Storage,
            fragment,
            Some("pay-per-request"),
            metadata,
        ))
    }

    /// Quote retrieving a stored transaction's data.
    pub async fn retrieve_quote(&self, tx_id: &str) -> Result<Quote, String> {
        let url = format!("{}/data/{}", self.base_url, tx_id);
        self.operation_quote(&url, ProbeMethod::Get, None, "retrieve").await
    }

    /// Quote a transaction metadata query.
    pub async fn query_quote(&self) -> Result<Quote, String> {
        let payload = json!({
            "op": "equals",
            "name": "Content-Type",
            "value": "application/json",
        });
        let url = format!("{}/query", self.base_url);
        self.operation_quote(&url, ProbeMethod::Post, Some(&payload), "query").await
    }
}

#[async_trait]
impl ProviderAdapter for AstraStorageAdapter {
    fn name(&self) -> &'static str {
        "astra_storage"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Storage
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        let Some(spec) = spec.as_storage() else {
            return Ok(None);
        };
        let bytes = spec.size_bytes();

        // Dynamic pricing is a function of the payload size, so the probe
        // carries a dummy body of the exact byte length being quoted.
        let payload = json!({
            "data": "x".repeat(bytes as usize),
            "content_type": "text/plain",
            "is_base64": false,
        });

        let url = format!("{}/upload", self.base_url);
        let fragment = match self.probe.probe(&url, ProbeMethod::Post, Some(&payload)).await {
            Ok(fragment) => fragment,
            Err(e) => {
                log::warn!("[ASTRA-STORAGE] {}", e);
                return Ok(None);
            }
        };

        let mut metadata = Map::new();
        metadata.insert("data_size_bytes".to_string(), json!(bytes));
        metadata.insert("data_size_kb".to_string(), json!(round2(bytes as f64 / 1024.0)));
        metadata.insert(
            "data_size_mb".to_string(),
            json!(round2(bytes as f64 / (1024.0 * 1024.0))),
        );
        metadata.insert("permanent".to_string(), json!(true));
        metadata.insert("platform".to_string(), json!("arweave"));

        // Split the quoted total into base fee and derived storage cost
        if let Some(extra) = Self::challenge_extra(&fragment) {
            metadata.insert(
                "dynamic_pricing".to_string(),
                extra.get("dynamicPricing").cloned().unwrap_or(json!(false)),
            );
            let total = extra.get("priceUSD").and_then(Value::as_f64);
            metadata.insert(
                "price_breakdown".to_string(),
                json!({
                    "total_usd": total,
                    "base_fee_usd": BASE_FEE_USD,
                    "storage_cost_usd": total.map(|t| t - BASE_FEE_USD).unwrap_or(0.0),
                }),
            );
        }

        Ok(Some(normalize::from_fragment(
            self.name(),
            ResourceCategory::Storage,
            fragment,
            Some("one-time"),
            metadata,
        )))
    }
}
