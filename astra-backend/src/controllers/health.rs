use actix_web::{HttpResponse, Responder, web};

use crate::AppState;
use crate::quote::types::ResourceCategory;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)));
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/providers").route(web::get().to(list_providers)));
}

async fn root(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "Astra Quote Engine",
        "version": VERSION,
        "description": "Multi-cloud pricing aggregator for direct and x402 payment-gated providers",
        "endpoints": {
            "health": "/health",
            "providers": "/providers",
            "store": "/quote/store",
            "run": "/quote/run",
            "cache": "/quote/cache",
            "best": "/quote/best",
            "compare_compute": "/quotes/compute",
            "compare_storage": "/quotes/storage",
            "compare_cache": "/quotes/cache",
            "best_offer": "/quotes/best-offer"
        },
        "providers": {
            "compute": state.engine.provider_names(ResourceCategory::Compute),
            "storage": state.engine.provider_names(ResourceCategory::Storage),
            "cache": state.engine.provider_names(ResourceCategory::Cache)
        }
    }))
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "astra-quote-engine",
        "version": VERSION,
        "timestamp": chrono::Utc::now()
    }))
}

async fn list_providers(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "compute_providers": state.engine.provider_names(ResourceCategory::Compute),
        "storage_providers": state.engine.provider_names(ResourceCategory::Storage),
        "cache_providers": state.engine.provider_names(ResourceCategory::Cache)
    }))
}
