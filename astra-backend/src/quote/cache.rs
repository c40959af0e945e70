//! Optional TTL cache for quote lookups
//!
//! Injected into the engine only when a TTL is configured; the default
//! engine carries no cache and every request hits the upstreams.

use moka::sync::Cache;
use std::time::Duration;

use crate::quote::types::{Quote, ResourceCategory, ResourceSpec};

#[derive(Clone)]
pub struct QuoteCache {
    inner: Cache<String, Vec<Quote>>,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(1024)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cache key: category plus the canonical JSON form of the spec.
    /// Field order in the JSON is declaration order, so equal specs always
    /// produce equal keys.
    fn key(category: ResourceCategory, spec: &ResourceSpec) -> String {
        format!(
            "{}:{}",
            category,
            serde_json::to_string(spec).unwrap_or_default()
        )
    }

    pub fn get(&self, category: ResourceCategory, spec: &ResourceSpec) -> Option<Vec<Quote>> {
        self.inner.get(&Self::key(category, spec))
    }

    pub fn insert(&self, category: ResourceCategory, spec: &ResourceSpec, quotes: Vec<Quote>) {
        self.inner.insert(Self::key(category, spec), quotes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::types::StorageSpec;

    fn storage_spec(size_gb: f64) -> ResourceSpec {
        ResourceSpec::Storage(StorageSpec {
            size_gb,
            duration_days: None,
            permanent: false,
        })
    }

    #[test]
    fn equal_specs_share_an_entry_and_different_specs_do_not() {
        let cache = QuoteCache::new(Duration::from_secs(300));
        cache.insert(ResourceCategory::Storage, &storage_spec(1.0), vec![]);

        assert!(cache.get(ResourceCategory::Storage, &storage_spec(1.0)).is_some());
        assert!(cache.get(ResourceCategory::Storage, &storage_spec(2.0)).is_none());
    }
}
