//! Pinata IPFS pinning (x402-gated, header-encoded pricing)

use async_trait::async_trait;
use serde_json::{Map, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter, round2};
use crate::quote::normalize;
use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};
use crate::x402::{ProbeMethod, X402Probe};

pub struct PinataAdapter {
    base_url: String,
    probe: X402Probe,
}

impl PinataAdapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            base_url: config.pinata_base_url.trim_end_matches('/').to_string(),
            probe: X402Probe::new(config.http_timeout)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for PinataAdapter {
    fn name(&self) -> &'static str {
        "pinata"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Storage
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        let Some(spec) = spec.as_storage() else {
            return Ok(None);
        };
        let bytes = spec.size_bytes();

        // Declaring the file size is enough to trigger the 402 challenge;
        // no actual content is uploaded for a quote.
        let payload = json!({
            "fileSize": bytes,
            "name": "astra-quote-probe",
            "keyvalues": {"purpose": "quote-probe"},
        });

        let url = format!("{}/pin/public", self.base_url);
        let mut fragment = match self.probe.probe(&url, ProbeMethod::Post, Some(&payload)).await {
            Ok(fragment) => fragment,
            Err(e) => {
                log::warn!("[PINATA] {}", e);
                return Ok(None);
            }
        };
        if fragment.currency.is_none() {
            fragment.currency = Some("USDC".to_string());
        }

        let mut metadata = Map::new();
        metadata.insert("spec".to_string(), json!({"size_gb": spec.size_gb}));
        metadata.insert("file_size_bytes".to_string(), json!(bytes));
        metadata.insert(
            "file_size_mb".to_string(),
            json!(round2(bytes as f64 / 1_000_000.0)),
        );

        Ok(Some(normalize::from_fragment(
            self.name(),
            ResourceCategory::Storage,
            fragment,
            Some("one-time"),
            metadata,
        )))
    }
}
