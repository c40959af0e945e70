//! Quote domain: canonical data model, fragment normalization, the
//! comparison engine, the optional TTL cache, and export formatting.

pub mod cache;
pub mod engine;
pub mod export;
pub mod normalize;
pub mod types;
