use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub akash_pricing_url: String,
    pub arweave_price_url: String,
    pub coingecko_price_url: String,
    pub pinata_base_url: String,
    pub openx402_base_url: String,
    pub astra_storage_base_url: String,
    pub merit_systems_url: String,
    pub xcache_base_url: String,
    pub xcache_default_region: String,
    /// Per-upstream-call timeout
    pub http_timeout: Duration,
    /// Per-adapter deadline inside one comparison request
    pub compare_deadline: Duration,
    /// Quote cache TTL; the cache is only wired up when this is set
    pub quote_cache_ttl: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            akash_pricing_url: env::var("AKASH_PRICING_URL")
                .unwrap_or_else(|_| "https://console-api.akash.network/v1/pricing".to_string()),
            arweave_price_url: env::var("ARWEAVE_PRICE_URL")
                .unwrap_or_else(|_| "https://arweave.net/price".to_string()),
            coingecko_price_url: env::var("COINGECKO_PRICE_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3/simple/price".to_string()),
            pinata_base_url: env::var("PINATA_BASE_URL")
                .unwrap_or_else(|_| "https://402.pinata.cloud/v1".to_string()),
            openx402_base_url: env::var("OPENX402_BASE_URL")
                .unwrap_or_else(|_| "https://ipfs.openx402.ai".to_string()),
            astra_storage_base_url: env::var("ASTRA_STORAGE_BASE_URL")
                .unwrap_or_else(|_| "https://storage.astra.cloud".to_string()),
            merit_systems_url: env::var("MERIT_SYSTEMS_URL")
                .unwrap_or_else(|_| "https://api.merit.systems/execute".to_string()),
            xcache_base_url: env::var("XCACHE_BASE_URL")
                .unwrap_or_else(|_| "https://api.xcache.io".to_string()),
            xcache_default_region: env::var("XCACHE_DEFAULT_REGION")
                .unwrap_or_else(|_| "us-east-1".to_string()),
            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .expect("HTTP_TIMEOUT_SECS must be a valid number"),
            ),
            compare_deadline: Duration::from_secs(
                env::var("COMPARE_DEADLINE_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("COMPARE_DEADLINE_SECS must be a valid number"),
            ),
            quote_cache_ttl: env::var("QUOTE_CACHE_TTL_SECS").ok().map(|v| {
                Duration::from_secs(v.parse().expect("QUOTE_CACHE_TTL_SECS must be a valid number"))
            }),
        }
    }
}
