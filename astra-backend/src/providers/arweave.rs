//! Arweave permanent storage pricing (direct REST plus AR/USD price feed)

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::providers::{AdapterError, ProviderAdapter, http_client};
use crate::quote::normalize;
use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};

/// 1 AR = 1e12 winston
const WINSTON_PER_AR: f64 = 1e12;

pub struct ArweaveAdapter {
    price_url: String,
    feed_url: String,
    client: reqwest::Client,
}

impl ArweaveAdapter {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            price_url: config.arweave_price_url.clone(),
            feed_url: config.coingecko_price_url.clone(),
            client: http_client(config.http_timeout)?,
        })
    }

    /// The network prices storage in winston for an exact byte count.
    async fn fetch_price_winston(&self, bytes: u64) -> Result<u64, String> {
        let body = self
            .client
            .get(format!("{}/{}", self.price_url, bytes))
            .send()
            .await
            .map_err(|e| format!("Arweave pricing unavailable: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Arweave pricing returned an error: {}", e))?
            .text()
            .await
            .map_err(|e| format!("Failed to read Arweave price response: {}", e))?;

        body.trim()
            .parse::<u64>()
            .map_err(|e| format!("Arweave price '{}' is not a number: {}", body.trim(), e))
    }

    /// AR/USD spot rate. A missing or zero rate is not an error here; it
    /// means the USD price is unknown.
    async fn fetch_usd_rate(&self) -> Result<Option<f64>, String> {
        let body: Value = self
            .client
            .get(&self.feed_url)
            .query(&[("ids", "arweave"), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| format!("AR/USD price feed unavailable: {}", e))?
            .json()
            .await
            .map_err(|e| format!("Invalid response from AR/USD price feed: {}", e))?;

        let rate = body
            .get("arweave")
            .and_then(|v| v.get("usd"))
            .and_then(Value::as_f64);
        Ok(rate.filter(|r| *r > 0.0))
    }
}

#[async_trait]
impl ProviderAdapter for ArweaveAdapter {
    fn name(&self) -> &'static str {
        "arweave"
    }

    fn category(&self) -> ResourceCategory {
        ResourceCategory::Storage
    }

    /// Permanent-storage-only: never quoted for ephemeral requests.
    fn applicable(&self, spec: &ResourceSpec) -> bool {
        spec.as_storage().is_some_and(|s| s.permanent)
    }

    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError> {
        let Some(spec) = spec.as_storage() else {
            return Ok(None);
        };
        let bytes = spec.size_bytes();

        let price_winston = match self.fetch_price_winston(bytes).await {
            Ok(price) => price,
            Err(e) => {
                log::warn!("[ARWEAVE] {}", e);
                return Ok(None);
            }
        };
        let price_ar = price_winston as f64 / WINSTON_PER_AR;

        let rate = match self.fetch_usd_rate().await {
            Ok(rate) => rate,
            Err(e) => {
                log::warn!("[ARWEAVE] {}", e);
                return Ok(None);
            }
        };
        // No rate: report the AR price with an unknown USD price rather
        // than fabricating zero. The engine disqualifies it from ranking.
        let price_usd = rate.map(|r| price_ar * r);
        if price_usd.is_none() {
            log::warn!("[ARWEAVE] AR/USD rate unavailable, USD price unknown");
        }

        let mut metadata = Map::new();
        metadata.insert("spec".to_string(), json!({"size_gb": spec.size_gb}));
        metadata.insert("bytes".to_string(), json!(bytes));
        metadata.insert("price_winston".to_string(), json!(price_winston));
        metadata.insert("price_ar".to_string(), json!(price_ar));
        metadata.insert("permanent".to_string(), json!(true));

        Ok(Some(normalize::build_quote(
            self.name(),
            ResourceCategory::Storage,
            price_usd,
            Some("AR".to_string()),
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

    fn adapter_for(server: &Server) -> ArweaveAdapter {
        let mut config = Config::from_env();
        config.arweave_price_url = format!("{}/price", server.url());
        config.coingecko_price_url = format!("{}/simple/price", server.url());
        config.http_timeout = Duration::from_secs(5);
        ArweaveAdapter::new(&config).expect("adapter")
    }

    fn storage_spec(size_gb: f64, permanent: bool) -> ResourceSpec {
        ResourceSpec::Storage(StorageSpec {
            size_gb,
            duration_days: None,
            permanent,
        })
    }

    #[test]
    fn only_applicable_to_permanent_storage() {
        // applicable() is pure, no server needed
        let mut config = Config::from_env();
        config.http_timeout = Duration::from_secs(5);
        let adapter = ArweaveAdapter::new(&config).expect("adapter");
        assert!(adapter.applicable(&storage_spec(1.0, true)));
        assert!(!adapter.applicable(&storage_spec(1.0, false)));
    }

    #[tokio::test]
    async fn converts_winston_through_the_usd_feed() {
        let mut server = Server::new_async().await;
        let _price = server
            .mock("GET", "/price/1000000000")
            .with_status(200)
            .with_body("2000000000000")
            .create_async()
            .await;
        let _feed = server
            .mock("GET", "/simple/price")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("ids".into(), "arweave".into()),
                mockito::Matcher::UrlEncoded("vs_currencies".into(), "usd".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"arweave\": {\"usd\": 6.5}}")
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let quote = adapter
            .quote(&storage_spec(1.0, true))
            .await
            .expect("no structured error")
            .expect("quote");

        // 2e12 winston = 2 AR, at $6.50 = $13
        assert_eq!(quote.price_usd, Some(13.0));
        assert_eq!(quote.currency, "AR");
        assert_eq!(quote.billing_period, "one-time");
        assert_eq!(quote.metadata["price_winston"], 2_000_000_000_000u64);
        assert_eq!(quote.metadata["price_ar"], 2.0);
    }

    #[tokio::test]
    async fn missing_rate_reports_unknown_usd_price() {
        let mut server = Server::new_async().await;
        let _price = server
            .mock("GET", "/price/1000000000")
            .with_status(200)
            .with_body("2000000000000")
            .create_async()
            .await;
        let _feed = server
            .mock("GET", "/simple/price")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let quote = adapter
            .quote(&storage_spec(1.0, true))
            .await
            .expect("no structured error")
            .expect("quote");

        // Price is unknown, not zero: zero would win every comparison
        assert_eq!(quote.price_usd, None);
        assert_eq!(quote.metadata["price_ar"], 2.0);
    }

    #[tokio::test]
    async fn network_price_failure_means_unavailable() {
        let mut server = Server::new_async().await;
        let _price = server
            .mock("GET", "/price/1000000000")
            .with_status(503)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let result = adapter.quote(&storage_spec(1.0, true)).await;
        assert!(matches!(result, Ok(None)));
    }
}
