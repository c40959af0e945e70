//! Quote engine
//!
//! Fans a resource spec out to every applicable provider adapter, collects
//! the surviving quotes, and ranks them by normalized USD price. One slow or
//! broken upstream never fails a comparison; it is simply absent from it.

use futures_util::future;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::providers::{ProviderAdapter, ProviderRegistry};
use crate::quote::cache::QuoteCache;
use crate::quote::types::{
    CacheSpec, Comparison, ComputeSpec, Quote, ResourceCategory, ResourceSpec, StorageSpec,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Every adapter failed, timed out, or was excluded
    NoQuotes,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoQuotes => write!(f, "No quotes available"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Earliest-wins minimum by USD price: on ties the quote produced earlier
/// in invocation order is kept.
pub fn cheapest(quotes: &[Quote]) -> Option<&Quote> {
    let mut best: Option<&Quote> = None;
    for quote in quotes {
        let better = match best {
            None => true,
            Some(current) => quote.price_usd < current.price_usd,
        };
        if better {
            best = Some(quote);
        }
    }
    best
}

pub struct QuoteEngine {
    registry: ProviderRegistry,
    /// Per-adapter deadline within one comparison request
    deadline: Duration,
    /// Optional TTL cache; absent unless explicitly configured
    cache: Option<QuoteCache>,
}

impl QuoteEngine {
    pub fn new(registry: ProviderRegistry, deadline: Duration) -> Self {
        Self {
            registry,
            deadline,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: QuoteCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider_names(&self, category: ResourceCategory) -> Vec<&'static str> {
        self.registry.provider_names(category)
    }

    /// Fetch quotes for one spec from its category's adapters, optionally
    /// restricted to a subset of provider names. Results come back in
    /// registry order, unsorted. Adapters that are inapplicable, error out,
    /// time out, or cannot state a USD price are absent from the result.
    pub async fn get_quotes(
        &self,
        spec: &ResourceSpec,
        providers: Option<&[String]>,
    ) -> Vec<Quote> {
        let category = spec.category();

        // Only unfiltered lookups are cacheable: a filtered result must not
        // shadow the full provider set for later callers.
        let cacheable = providers.is_none();
        if cacheable {
            if let Some(cache) = &self.cache {
                if let Some(hit) = cache.get(category, spec) {
                    log::debug!("[ENGINE] Cache hit for {} quotes", category);
                    return hit;
                }
            }
        }

        let adapters: Vec<&Arc<dyn ProviderAdapter>> = self
            .registry
            .for_category(category)
            .iter()
            .filter(|a| providers.is_none_or(|names| names.iter().any(|n| n.as_str() == a.name())))
            .filter(|a| a.applicable(spec))
            .collect();

        // Concurrent fan-out. join_all preserves input order, so the
        // result order (and with it the tie-break) stays deterministic no
        // matter which upstream answers first.
        let results = future::join_all(adapters.iter().map(|a| self.quote_one(a, spec))).await;
        let quotes: Vec<Quote> = results.into_iter().flatten().collect();

        if cacheable {
            if let Some(cache) = &self.cache {
                cache.insert(category, spec, quotes.clone());
            }
        }
        quotes
    }

    async fn quote_one(
        &self,
        adapter: &Arc<dyn ProviderAdapter>,
        spec: &ResourceSpec,
    ) -> Option<Quote> {
        match tokio::time::timeout(self.deadline, adapter.quote(spec)).await {
            Ok(Ok(Some(quote))) => {
                if quote.price_usd.is_none() {
                    // Unknown USD price disqualifies the quote from ranking
                    log::warn!(
                        "[ENGINE] Dropping '{}' quote with unknown USD price",
                        adapter.name()
                    );
                    return None;
                }
                Some(quote)
            }
            Ok(Ok(None)) => {
                log::info!("[ENGINE] Provider '{}' unavailable for this request", adapter.name());
                None
            }
            Ok(Err(e)) => {
                log::warn!("[ENGINE] Provider '{}' excluded: {}", adapter.name(), e);
                None
            }
            Err(_) => {
                log::warn!(
                    "[ENGINE] Provider '{}' timed out after {:?}",
                    adapter.name(),
                    self.deadline
                );
                None
            }
        }
    }

    /// Compare one spec across its category's providers. Quotes come back
    /// sorted ascending by price; the stable sort breaks price ties in
    /// favor of the provider earlier in the registry.
    pub async fn compare(&self, spec: &ResourceSpec) -> Result<Comparison, EngineError> {
        let mut quotes = self.get_quotes(spec, None).await;
        if quotes.is_empty() {
            return Err(EngineError::NoQuotes);
        }

        quotes.sort_by(|a, b| {
            a.price_usd
                .partial_cmp(&b.price_usd)
                .unwrap_or(Ordering::Equal)
        });
        let best_offer = quotes[0].clone();
        let total_providers = quotes.len();

        Ok(Comparison {
            spec: serde_json::to_value(spec).unwrap_or(serde_json::Value::Null),
            quotes,
            best_offer,
            total_providers,
            timestamp: chrono::Utc::now(),
        })
    }

    /// The single cheapest quote across any subset of categories, or `None`
    /// when no spec was supplied or every provider came back empty. Ties go
    /// to the quote produced earlier in invocation order.
    pub async fn get_best_offer(
        &self,
        compute: Option<ComputeSpec>,
        storage: Option<StorageSpec>,
        cache: Option<CacheSpec>,
    ) -> Option<Quote> {
        let mut all = Vec::new();
        if let Some(spec) = compute {
            all.extend(self.get_quotes(&ResourceSpec::Compute(spec), None).await);
        }
        if let Some(spec) = storage {
            all.extend(self.get_quotes(&ResourceSpec::Storage(spec), None).await);
        }
        if let Some(spec) = cache {
            all.extend(self.get_quotes(&ResourceSpec::Cache(spec), None).await);
        }

        cheapest(&all).cloned()
    }
}
