//! xCache managed Redis instances (x402-gated cache creation)
//!
//! Creation is the only operation brokered here: a paid create returns a
//! cache instance with a bundle of included operations. Top-ups happen
//! directly with the provider.

use async_trait::async_trait;
use serde_json::{Map, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter};
use crate::quote::normalize;
use crate::quote::types::{CacheOperation, Quote, ResourceCategory, ResourceSpec};
use crate::x402::{ProbeMethod, X402Probe};

/// Operations bundled with every newly created instance
const OPERATIONS_INCLUDED: u64 = 50_000;

pub struct XCacheAdapter {
    base_url: String,
    default_region: String,
    probe: X402Probe,
}

impl XCacheAdapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            base_url: config.xcache_base_url.trim_end_matches('/').to_string(),
            default_region: config.xcache_default_region.clone(),
            probe: X402Probe::new(config.http_timeout)?,
        })
    }

    /// Quote creating a new cache instance in the given region.
    pub async fn create_quote(&self, region: &str) -> Result<Quote, String> {
        let payload = json!({"region": region});
        let url = format!("{}/create", self.base_url);
        let fragment = self
            .probe
            .probe(&url, ProbeMethod::Post, Some(&payload))
            .await
            .map_err(|e| format!("Failed to get quote from xCache: {}", e))?;

        let mut metadata = Map::new();
        metadata.insert("operation".to_string(), json!("create"));
        metadata.insert("region".to_string(), json!(region));
        metadata.insert("operations_included".to_string(), json!(OPERATIONS_INCLUDED));

        Ok(normalize::from_fragment(
            self.name(),
            ResourceCategory::Cache,
            fragment,
            Some("one-time"),
            metadata,
        ))
    }
}

#[async_trait]
impl ProviderAdapter for XCacheAdapter {
    fn name(&self) -> &'static str {
        "xcache"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Cache
    }

    /// Only the create operation is wired to an upstream; the rest of the
    /// protocol's operations quote empty rather than failing.
    fn applicable(&self, spec: &ResourceSpec) -> bool {
        spec.as_cache().is_some_and(|c| c.operation == CacheOperation::Create)
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        let Some(spec) = spec.as_cache() else {
            return Ok(None);
        };
        if spec.operation != CacheOperation::Create {
            return Ok(None);
        }

        match self.create_quote(&self.default_region).await {
            Ok(mut quote) => {
                quote.metadata.insert("size_mb".to_string(), json!(spec.size_mb));
                if let Some(ttl) = spec.ttl_hours {
                    quote.metadata.insert("ttl_hours".to_string(), json!(ttl));
                }
                Ok(Some(quote))
            }
            Err(e) => {
                log::warn!("[XCACHE] {}", e);
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

    fn adapter_for(url: &str) -> XCacheAdapter {
        let mut config = Config::from_env();
        config.xcache_base_url = url.to_string();
        config.http_timeout = Duration::from_secs(5);
        XCacheAdapter::new(&config).expect("adapter")
    }

    fn cache_spec(operation: CacheOperation) -> ResourceSpec {
        ResourceSpec::Cache(crate::quote::types::CacheSpec {
            size_mb: 100.0,
            operation,
            ttl_hours: Some(24),
        })
    }

    #[tokio::test]
    async fn create_challenge_becomes_cache_quote() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/create")
            .match_body(mockito::Matcher::Json(serde_json::json!({"region": "us-east-1"})))
            .with_status(402)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "accepts": [{
                        "scheme": "exact",
                        "network": "base",
                        "maxAmountRequired": "990000",
                        "payTo": "0xxcache",
                        "asset": "USDC"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = adapter_for(&server.url());
        let quote = adapter
            .quote(&cache_spec(CacheOperation::Create))
            .await
            .expect("no structured error")
            .expect("quote");

        assert_eq!(quote.provider, "xcache");
        assert_eq!(quote.category, ResourceCategory::Cache);
        assert_eq!(quote.price_usd, Some(0.99));
        assert_eq!(quote.metadata["operation"], "create");
        assert_eq!(quote.metadata["region"], "us-east-1");
        assert_eq!(quote.metadata["operations_included"], 50_000);
        assert_eq!(quote.metadata["ttl_hours"], 24);
    }

    #[tokio::test]
    async fn non_create_operations_quote_empty_without_error() {
        // Unroutable base URL proves no call is attempted either
        let adapter = adapter_for("http://127.0.0.1:9");
        for operation in [
            CacheOperation::Get,
            CacheOperation::Set,
            CacheOperation::Delete,
            CacheOperation::List,
            CacheOperation::Ttl,
        ] {
            let spec = cache_spec(operation);
            assert!(!adapter.applicable(&spec));
            let result = adapter.quote(&spec).await;
            assert!(matches!(result, Ok(None)));
        }
    }
}
