//! Akash Network compute pricing (direct REST, no payment challenge)

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter, http_client};
use crate::quote::normalize;
use crate::quote::types::{ComputeSpec, Quote, ResourceCategory, ResourceSpec};

pub struct AkashAdapter {
    pricing_url: String,
    client: reqwest::Client,
}

impl AkashAdapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            pricing_url: config.akash_pricing_url.clone(),
            client: http_client(config.http_timeout)?,
        })
    }

    /// Units expected upstream: CPU in millicores, memory/storage in bytes.
    async fn fetch_pricing(&self, spec: &ComputeSpec) -> Result<Value, String> {
        let payload = json!({
            "cpu": (spec.cpu_cores * 1000.0) as u64,
            "memory": (spec.memory_gb * 1_000_000_000.0) as u64,
            "storage": (spec.storage_gb * 1_000_000_000.0) as u64,
        });

        self.client
            .post(&self.pricing_url)
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Akash pricing unavailable: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Akash pricing returned an error: {}", e))?
            .json::<Value>()
            .await
            .map_err(|e| format!("Invalid response from Akash pricing: {}", e))
    }
}

#[async_trait]
impl ProviderAdapter for AkashAdapter {
    fn name(&self) -> &'static str {
        "akash"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Compute
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        let Some(spec) = spec.as_compute() else {
            return Ok(None);
        };

        let pricing = match self.fetch_pricing(spec).await {
            Ok(pricing) => pricing,
            Err(e) => {
                log::warn!("[AKASH] {}", e);
                return Ok(None);
            }
        };

        // The API prices the spec on Akash and on the big clouds for context
        let price_usd = pricing.get("akash").and_then(Value::as_f64).unwrap_or(0.0);

        let mut metadata = Map::new();
        metadata.insert(
            "spec".to_string(),
            json!({
                "cpu_cores": spec.cpu_cores,
                "memory_gb": spec.memory_gb,
                "storage_gb": spec.storage_gb,
            }),
        );
        metadata.insert(
            "competitors".to_string(),
            json!({
                "aws": pricing.get("aws"),
                "gcp": pricing.get("gcp"),
                "azure": pricing.get("azure"),
            }),
        );

        Ok(Some(normalize::build_quote(
            self.name(),
            ResourceCategory::Compute,
            Some(price_usd),
            None,
            Some("month"),
            metadata,
        )))
    }
}
