//! Canonical quote data model shared by the adapters, the engine, and the
//! HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Resource category a quote belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceCategory {
    Compute,
    Storage,
    Cache,
    Hybrid,
}

/// Cache operations defined by the protocol. Only `create` is currently
/// wired to an adapter; the engine returns an empty quote list for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheOperation {
    Create,
    Get,
    Set,
    Delete,
    List,
    Ttl,
}

fn default_cores() -> f64 {
    1.0
}

fn default_gb() -> f64 {
    1.0
}

fn default_cache_mb() -> f64 {
    100.0
}

fn default_cache_operation() -> CacheOperation {
    CacheOperation::Create
}

/// Compute resource requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeSpec {
    #[serde(default = "default_cores")]
    pub cpu_cores: f64,
    #[serde(default = "default_gb")]
    pub memory_gb: f64,
    #[serde(default = "default_gb")]
    pub storage_gb: f64,
    #[serde(default)]
    pub gpu: Option<String>,
}

impl ComputeSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.cpu_cores <= 0.0 {
            return Err("cpu_cores must be positive".to_string());
        }
        if self.memory_gb <= 0.0 {
            return Err("memory_gb must be positive".to_string());
        }
        if self.storage_gb < 0.0 {
            return Err("storage_gb must not be negative".to_string());
        }
        Ok(())
    }
}

/// Storage resource requirements. `permanent` distinguishes chain-archival
/// storage from ephemeral pinning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSpec {
    #[serde(default = "default_gb")]
    pub size_gb: f64,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub permanent: bool,
}

impl StorageSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.size_gb <= 0.0 {
            return Err("size_gb must be positive".to_string());
        }
        if self.duration_days == Some(0) {
            return Err("duration_days must be at least 1".to_string());
        }
        Ok(())
    }

    /// Requested size in bytes, decimal convention (1 GB = 1e9 bytes).
    /// Upstream provider APIs are calibrated to decimal units.
    pub fn size_bytes(&self) -> u64 {
        (self.size_gb * 1_000_000_000.0) as u64
    }
}

/// Cache resource requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSpec {
    #[serde(default = "default_cache_mb")]
    pub size_mb: f64,
    #[serde(default = "default_cache_operation")]
    pub operation: CacheOperation,
    #[serde(default)]
    pub ttl_hours: Option<u32>,
}

impl CacheSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.size_mb <= 0.0 {
            return Err("size_mb must be positive".to_string());
        }
        if self.ttl_hours == Some(0) {
            return Err("ttl_hours must be at least 1".to_string());
        }
        Ok(())
    }
}

/// A resource specification for exactly one category. Hybrid requests are
/// served by running multiple categories independently and merging the
/// results, never by a combined spec.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    Compute(ComputeSpec),
    Storage(StorageSpec),
    Cache(CacheSpec),
}

impl ResourceSpec {
    pub fn category(&self) -> ResourceCategory {
        match self {
            ResourceSpec::Compute(_) => ResourceCategory::Compute,
            ResourceSpec::Storage(_) => ResourceCategory::Storage,
            ResourceSpec::Cache(_) => ResourceCategory::Cache,
        }
    }

    pub fn as_compute(&self) -> Option<&ComputeSpec> {
        match self {
            ResourceSpec::Compute(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&StorageSpec> {
        match self {
            ResourceSpec::Storage(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_cache(&self) -> Option<&CacheSpec> {
        match self {
            ResourceSpec::Cache(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Normalized quote from one provider for one resource specification.
///
/// Fixed schema on the canonical fields; everything provider-specific goes
/// into the open `metadata` map, which the engine never interprets.
/// `price_usd` of `None` means the USD price is unknown — such quotes are
/// excluded from comparison instead of competing as free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub provider: String,
    pub category: ResourceCategory,
    pub price_usd: Option<f64>,
    pub currency: String,
    pub billing_period: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Result of comparing one spec across a provider set. Quotes are sorted
/// ascending by price; `best_offer` is always `quotes[0]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub spec: Value,
    pub quotes: Vec<Quote>,
    pub best_offer: Quote,
    pub total_providers: usize,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResourceCategory::Storage).unwrap(),
            "\"storage\""
        );
        assert_eq!(ResourceCategory::Compute.to_string(), "compute");
    }

    #[test]
    fn cache_operation_parses_from_wire_form() {
        use std::str::FromStr;
        assert_eq!(CacheOperation::from_str("create").unwrap(), CacheOperation::Create);
        assert_eq!(CacheOperation::from_str("ttl").unwrap(), CacheOperation::Ttl);
        assert!(CacheOperation::from_str("flush").is_err());
    }

    #[test]
    fn storage_spec_uses_decimal_bytes() {
        let spec = StorageSpec {
            size_gb: 1.0,
            duration_days: None,
            permanent: false,
        };
        assert_eq!(spec.size_bytes(), 1_000_000_000);
    }

    #[test]
    fn spec_defaults_fill_from_empty_body() {
        let spec: ComputeSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.cpu_cores, 1.0);
        assert_eq!(spec.memory_gb, 1.0);
        assert_eq!(spec.storage_gb, 1.0);
        assert!(spec.gpu.is_none());

        let spec: CacheSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.size_mb, 100.0);
        assert_eq!(spec.operation, CacheOperation::Create);
    }

    #[test]
    fn validation_rejects_non_positive_figures() {
        let spec = ComputeSpec {
            cpu_cores: 0.0,
            memory_gb: 1.0,
            storage_gb: 0.0,
            gpu: None,
        };
        assert!(spec.validate().is_err());

        let spec = StorageSpec {
            size_gb: -1.0,
            duration_days: None,
            permanent: false,
        };
        assert!(spec.validate().is_err());

        let spec = CacheSpec {
            size_mb: 100.0,
            operation: CacheOperation::Create,
            ttl_hours: Some(0),
        };
        assert!(spec.validate().is_err());
    }
}
