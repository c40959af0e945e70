//! Provider adapters
//!
//! One adapter per upstream pricing source. Every adapter implements the
//! same capability — produce zero or one quote for a resource spec — while
//! hiding its upstream protocol (plain REST, x402 challenge, price feeds).

pub mod akash;
pub mod arweave;
pub mod astra_storage;
pub mod merit;
pub mod openx402;
pub mod pinata;
pub mod xcache;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};

/// Structured, inspectable adapter failure. Transport and schema problems
/// are not errors at this boundary — adapters report those as `Ok(None)`
/// (provider unavailable) so one bad upstream never aborts its siblings.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterError {
    /// Requested size exceeds a hard provider ceiling. Raised before any
    /// network call is made.
    SizeLimit {
        provider: String,
        message: String,
        requested_size_bytes: u64,
        max_size_bytes: u64,
        max_size_mb: u64,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::SizeLimit { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Capability shared by all provider adapters.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider identifier, unique within its category
    fn name(&self) -> &'static str;

    /// The single resource category this adapter serves
    fn category(&self) -> ResourceCategory;

    /// Whether this adapter can serve the given spec at all. Checked before
    /// any network traffic; an inapplicable adapter is simply skipped.
    fn applicable(&self, spec: &ResourceSpec) -> bool {
        let _ = spec;
        true
    }

    /// Produce zero or one normalized quote. `Ok(None)` means the provider
    /// is unavailable for this request (upstream down, bad response shape);
    /// `Err` carries a structured error the caller may inspect.
    async fn quote(&self, spec: &ResourceSpec) -> Result<Option<Quote>, AdapterError>;
}

/// Build a reqwest client with the shared upstream timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

/// Round to two decimals for display-oriented size fields.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-category dispatch table. Registration order is the invocation order,
/// which is also the tie-break order for equal-priced quotes.
#[derive(Default)]
pub struct ProviderRegistry {
    compute: Vec<Arc<dyn ProviderAdapter>>,
    storage: Vec<Arc<dyn ProviderAdapter>>,
    cache: Vec<Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        match adapter.category() {
            ResourceCategory::Compute => self.compute.push(adapter),
            ResourceCategory::Storage => self.storage.push(adapter),
            ResourceCategory::Cache => self.cache.push(adapter),
            ResourceCategory::Hybrid => {
                log::warn!(
                    "[REGISTRY] Ignoring adapter '{}': hybrid is not a dispatch category",
                    adapter.name()
                );
            }
        }
    }

    pub fn for_category(&self, category: ResourceCategory) -> &[Arc<dyn ProviderAdapter>] {
        match category {
            ResourceCategory::Compute => &self.compute,
            ResourceCategory::Storage => &self.storage,
            ResourceCategory::Cache => &self.cache,
            ResourceCategory::Hybrid => &[],
        }
    }

    pub fn provider_names(&self, category: ResourceCategory) -> Vec<&'static str> {
        self.for_category(category).iter().map(|a| a.name()).collect()
    }
}

/// All configured adapters, individually addressable for the broker routes
/// and bundled into the engine's dispatch table.
#[derive(Clone)]
pub struct Providers {
    pub akash: Arc<akash::AkashAdapter>,
    pub merit: Arc<merit::MeritAdapter>,
    pub arweave: Arc<arweave::ArweaveAdapter>,
    pub pinata: Arc<pinata::PinataAdapter>,
    pub openx402: Arc<openx402::OpenX402Adapter>,
    pub astra_storage: Arc<astra_storage::AstraStorageAdapter>,
    pub xcache: Arc<xcache::XCacheAdapter>,
}

impl Providers {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            akash: Arc::new(akash::AkashAdapter::new(config)?),
            merit: Arc::new(merit::MeritAdapter::new(config)?),
            arweave: Arc::new(arweave::ArweaveAdapter::new(config)?),
            pinata: Arc::new(pinata::PinataAdapter::new(config)?),
            openx402: Arc::new(openx402::OpenX402Adapter::new(config)?),
            astra_storage: Arc::new(astra_storage::AstraStorageAdapter::new(config)?),
            xcache: Arc::new(xcache::XCacheAdapter::new(config)?),
        })
    }

    /// Build the dispatch table. The order here is load-bearing: it fixes
    /// both invocation order and the comparison tie-break.
    pub fn registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(self.akash.clone());
        registry.register(self.merit.clone());
        registry.register(self.arweave.clone());
        registry.register(self.pinata.clone());
        registry.register(self.openx402.clone());
        registry.register(self.astra_storage.clone());
        registry.register(self.xcache.clone());
        registry
    }
}
