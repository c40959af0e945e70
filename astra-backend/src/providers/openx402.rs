//! OpenX402 IPFS pinning (x402-gated, fixed pricing)
//!
//! Two-step upstream flow: files are first uploaded to RAM for free, then
//! pinned to IPFS behind a 402 challenge. Quotes probe the pin endpoint.

use async_trait::async_trait;
use serde_json::{Map, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter, round2};
use crate::quote::normalize;
use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};
use crate::x402::{ProbeMethod, X402Probe};

pub const MAX_FILE_SIZE_MB: u64 = 100;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1_000_000;

/// Published flat rate per pin, used when a challenge carries no amount
const FIXED_PIN_PRICE_USD: f64 = 0.01;

pub struct OpenX402Adapter {
    base_url: String,
    probe: X402Probe,
}

impl OpenX402Adapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            base_url: config.openx402_base_url.trim_end_matches('/').to_string(),
            probe: X402Probe::new(config.http_timeout)?,
        })
    }

    fn size_limit_error(&self, requested: u64) -> AdapterError {
        AdapterError::SizeLimit {
            provider: self.name().to_string(),
            message: format!(
                "File too large for OpenX402. Max size: {}MB, requested: {}MB",
                MAX_FILE_SIZE_MB,
                round2(requested as f64 / 1_000_000.0)
            ),
            requested_size_bytes: requested,
            max_size_bytes: MAX_FILE_SIZE_BYTES,
            max_size_mb: MAX_FILE_SIZE_MB,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenX402Adapter {
    fn name(&self) -> &'static str {
        "openx402"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Storage
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        let Some(spec) = spec.as_storage() else {
            return Ok(None);
        };
        let bytes = spec.size_bytes();

        // Hard ceiling, checked before any network traffic
        if bytes > MAX_FILE_SIZE_BYTES {
            return Err(self.size_limit_error(bytes));
        }

        // A GET against the pin endpoint triggers the 402 challenge; the
        // path id is a placeholder, no file exists yet at quote time.
        let url = format!("{}/pin/quote_request", self.base_url);
        let mut fragment = match self.probe.probe(&url, ProbeMethod::Get, None).await {
            Ok(fragment) => fragment,
            Err(e) => {
                log::warn!("[OPENX402] {}", e);
                return Ok(None);
            }
        };
        if fragment.price_usd.is_none() {
            fragment.price_usd = Some(FIXED_PIN_PRICE_USD);
        }
        if fragment.currency.is_none() {
            fragment.currency = Some("USDC".to_string());
        }

        let mut metadata = Map::new();
        metadata.insert("file_size_bytes".to_string(), json!(bytes));
        metadata.insert(
            "file_size_mb".to_string(),
            json!(round2(bytes as f64 / 1_000_000.0)),
        );
        metadata.insert("permanent".to_string(), json!(true));
        metadata.insert("platform".to_string(), json!("ipfs"));
        metadata.insert("max_size_mb".to_string(), json!(MAX_FILE_SIZE_MB));
        metadata.insert(
            "workflow".to_string(),
            json!({
                "step_1": "POST /upload - upload file to RAM (free)",
                "step_2": "GET /pin/:id - pin to IPFS (payment required here)",
                "expiry": "Files in RAM expire after 1 hour if not pinned",
                "quote_endpoint": "/pin/:id",
            }),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::types::StorageSpec;
    use mockito::Server;
    use std::time::Duration;

    fn adapter_for(url: &str) -> OpenX402Adapter {
        let mut config = Config::from_env();
        config.openx402_base_url = url.to_string();
        config.http_timeout = Duration::from_secs(5);
        OpenX402Adapter::new(&config).expect("adapter")
    }

    fn storage_spec(size_gb: f64) -> ResourceSpec {
        ResourceSpec::Storage(StorageSpec {
            size_gb,
            duration_days: None,
            permanent: false,
        })
    }

    #[tokio::test]
    async fn oversized_request_is_a_structured_error_without_network() {
        // Unroutable base URL proves no call is attempted
        let adapter = adapter_for("http://127.0.0.1:9");
        let result = adapter.quote(&storage_spec(0.2)).await;

        match result {
            Err(AdapterError::SizeLimit {
                provider,
                requested_size_bytes,
                max_size_bytes,
                max_size_mb,
                ..
            }) => {
                assert_eq!(provider, "openx402");
                assert_eq!(requested_size_bytes, 200_000_000);
                assert_eq!(max_size_bytes, 100_000_000);
                assert_eq!(max_size_mb, 100);
            }
            other => panic!("expected size limit error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn pin_challenge_becomes_fixed_price_quote() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pin/quote_request")
            .with_status(402)
            .with_header("content-type", "application/json")
            .with_header("asset", "USDC")
            .with_header("network", "base")
            .with_header("payTo", "0xopen")
            .with_body(
                serde_json::json!({
                    "accepts": [{
                        "scheme": "exact",
                        "network": "base",
                        "maxAmountRequired": "10000",
                        "payTo": "0xopen",
                        "asset": "USDC",
                        "description": "Pin file to IPFS"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = adapter_for(&server.url());
        let quote = adapter
            .quote(&storage_spec(0.05))
            .await
            .expect("no structured error")
            .expect("quote");

        assert_eq!(quote.provider, "openx402");
        assert_eq!(quote.price_usd, Some(0.01));
        assert_eq!(quote.billing_period, "one-time");
        assert_eq!(quote.metadata["platform"], "ipfs");
        assert_eq!(quote.metadata["max_size_mb"], 100);
        assert_eq!(quote.metadata["permanent"], true);
    }
}
