//! Merit Systems sandboxed code execution pricing (x402-gated)

use async_trait::async_trait;
use serde_json::{Map, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter};
use crate::quote::normalize;
use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};
use crate::x402::{ProbeMethod, QuoteFragment, X402Probe};

const DEFAULT_LANGUAGE: &str = "python";

pub struct MeritAdapter {
    url: String,
    probe: X402Probe,
}

impl MeritAdapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            url: config.merit_systems_url.clone(),
            probe: X402Probe::new(config.http_timeout)?,
        })
    }

    /// A minimal snippet is enough to trigger the 402 challenge; the real
    /// code never leaves the caller at quote time.
    async fn fetch_fragment(&self, language: &str) -> Result<QuoteFragment, String> {
        let payload = json!({
            "snippet": "# pricing probe",
            "language": language,
        });
        self.probe.probe(&self.url, ProbeMethod::Post, Some(&payload)).await
    }

    fn normalize(
        &self,
        fragment: QuoteFragment,
        code_size_bytes: Option<u64>,
        language: &str,
    ) -> Quote {
        let mut metadata = Map::new();
        if let Some(size) = code_size_bytes {
            metadata.insert("code_size_bytes".to_string(), json!(size));
        }
        metadata.insert("language".to_string(), json!(language));
        metadata.insert("operation".to_string(), json!("execute"));

        normalize::from_fragment(
            self.name(),
            ResourceCategory::Compute,
            fragment,
            Some("pay-per-request"),
            metadata,
        )
    }

    /// Quote one code execution. Used by the run-quote route, where the
    /// caller knows the code size and language.
    pub async fn run_quote(&self, code_size_bytes: u64, language: &str) -> Result<Quote, String> {
        let fragment = self
            .fetch_fragment(language)
            .await
            .map_err(|e| format!("Failed to get quote from Merit Systems: {}", e))?;
        Ok(self.normalize(fragment, Some(code_size_bytes), language))
    }
}

#[async_trait]
impl ProviderAdapter for MeritAdapter {
    fn name(&self) -> &'static str {
        "merit-systems"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Compute
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        if spec.as_compute().is_none() {
            return Ok(None);
        }

        match self.fetch_fragment(DEFAULT_LANGUAGE).await {
            Ok(fragment) => Ok(Some(self.normalize(fragment, None, DEFAULT_LANGUAGE))),
            Err(e) => {
                log::warn!("[MERIT] {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    fn adapter_for(url: &str) -> MeritAdapter {
        let mut config = Config::from_env();
        config.merit_systems_url = url.to_string();
        config.http_timeout = Duration::from_secs(5);
        MeritAdapter::new(&config).expect("adapter")
    }

    #[tokio::test]
    async fn run_quote_carries_execution_details() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/execute")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "language": "javascript",
            })))
            .with_status(402)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "accepts": [{
                        "scheme": "exact",
                        "network": "base",
                        "maxAmountRequired": "50000",
                        "payTo": "0xmerit",
                        "asset": "USDC"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = adapter_for(&format!("{}/execute", server.url()));
        let quote = adapter.run_quote(2048, "javascript").await.expect("quote");

        assert_eq!(quote.provider, "merit-systems");
        assert_eq!(quote.category, ResourceCategory::Compute);
        assert_eq!(quote.price_usd, Some(0.05));
        assert_eq!(quote.billing_period, "pay-per-request");
        assert_eq!(quote.metadata["code_size_bytes"], 2048);
        assert_eq!(quote.metadata["language"], "javascript");
        assert_eq!(quote.metadata["operation"], "execute");
    }

    #[tokio::test]
    async fn free_tier_execution_quotes_zero() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/execute")
            .with_status(200)
            .with_body("{\"ok\":true}")
            .create_async()
            .await;

        let adapter = adapter_for(&format!("{}/execute", server.url()));
        let quote = adapter.run_quote(100, "python").await.expect("quote");

        assert_eq!(quote.price_usd, Some(0.0));
        assert_eq!(quote.metadata["free"], true);
    }
}
