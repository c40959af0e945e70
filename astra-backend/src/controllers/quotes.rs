//! Quote API endpoints
//!
//! Two surfaces share the engine: the broker-facing `/quote/*` routes
//! (single category, flat request shapes, 503 on failure) and the
//! comparison `/quotes/*` routes (full ranked comparisons, 404 when no
//! provider yields a usable quote).

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::AppState;
use crate::providers::round2;
use crate::quote::engine::{EngineError, cheapest};
use crate::quote::export;
use crate::quote::types::{CacheSpec, ComputeSpec, Quote, ResourceSpec, StorageSpec};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quote")
            .route("/store", web::post().to(store_quote))
            .route("/run", web::post().to(run_quote))
            .route("/cache", web::post().to(cache_quote))
            .route("/retrieve", web::post().to(retrieve_quote))
            .route("/query", web::post().to(query_quote))
            .route("/best", web::post().to(best_quote)),
    );
    cfg.service(
        web::scope("/quotes")
            .route("/compute", web::post().to(compare_compute))
            .route("/storage", web::post().to(compare_storage))
            .route("/cache", web::post().to(compare_cache))
            .route("/best-offer", web::post().to(best_offer)),
    );
}

fn bad_request(detail: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({"detail": detail.into()}))
}

fn not_found(detail: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({"detail": detail}))
}

fn unavailable(detail: &str) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(json!({"detail": detail}))
}

// ==================== Broker-facing quote routes ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuoteRequest {
    file_size: u64,
    #[serde(default)]
    permanent: bool,
    /// Retention hint in seconds; quotes ignore it beyond the spec mapping
    #[serde(default)]
    ttl: Option<u64>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQuoteRequest {
    code_size: u64,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "python".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CacheQuoteRequest {
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveQuoteRequest {
    #[serde(default)]
    tx_id: Option<String>,
}

/// Fan a storage request out and pick the cheapest usable quote.
/// Shared by `/quote/store` and the `/quote/best` dispatcher.
async fn collect_store_quotes(
    state: &AppState,
    req: &StoreQuoteRequest,
) -> Result<(Vec<Quote>, Quote), HttpResponse> {
    if req.file_size == 0 {
        return Err(bad_request("fileSize must be positive"));
    }

    let spec = StorageSpec {
        size_gb: req.file_size as f64 / 1_000_000_000.0,
        duration_days: req.ttl.map(|t| t.div_ceil(86_400).max(1) as u32),
        permanent: req.permanent,
    };
    let filter = req.provider.clone().map(|p| vec![p]);
    let quotes = state
        .engine
        .get_quotes(&ResourceSpec::Storage(spec), filter.as_deref())
        .await;

    match cheapest(&quotes).cloned() {
        Some(best) => Ok((quotes, best)),
        None => Err(unavailable("No storage providers available for this file size")),
    }
}

async fn store_quote(
    state: web::Data<AppState>,
    req: web::Json<StoreQuoteRequest>,
) -> HttpResponse {
    let req = req.into_inner();
    if let Some(name) = &req.file_name {
        log::debug!("[QUOTES] Store quote for '{}' ({} bytes)", name, req.file_size);
    }

    match collect_store_quotes(&state, &req).await {
        Ok((quotes, best)) => {
            let count = quotes.len();
            HttpResponse::Ok().json(json!({
                "quotes": quotes,
                "best": best,
                "count": count,
                "file_size_mb": round2(req.file_size as f64 / 1_000_000.0),
            }))
        }
        Err(response) => response,
    }
}

async fn run_quote(state: web::Data<AppState>, req: web::Json<RunQuoteRequest>) -> HttpResponse {
    let req = req.into_inner();
    match state.providers.merit.run_quote(req.code_size, &req.language).await {
        Ok(quote) => HttpResponse::Ok().json(quote),
        Err(detail) => unavailable(&detail),
    }
}

async fn cache_quote(state: web::Data<AppState>, req: web::Json<CacheQuoteRequest>) -> HttpResponse {
    let region = req
        .into_inner()
        .region
        .unwrap_or_else(|| state.config.xcache_default_region.clone());
    match state.providers.xcache.create_quote(&region).await {
        Ok(quote) => HttpResponse::Ok().json(quote),
        Err(detail) => unavailable(&detail),
    }
}

async fn retrieve_quote(
    state: web::Data<AppState>,
    req: web::Json<RetrieveQuoteRequest>,
) -> HttpResponse {
    let tx_id = req.into_inner().tx_id.unwrap_or_else(|| "quote-probe".to_string());
    match state.providers.astra_storage.retrieve_quote(&tx_id).await {
        Ok(quote) => HttpResponse::Ok().json(quote),
        Err(detail) => unavailable(&detail),
    }
}

async fn query_quote(state: web::Data<AppState>) -> HttpResponse {
    match state.providers.astra_storage.query_quote().await {
        Ok(quote) => HttpResponse::Ok().json(quote),
        Err(detail) => unavailable(&detail),
    }
}

/// Orchestration endpoint: one envelope, dispatched on `operation`.
async fn best_quote(state: web::Data<AppState>, body: web::Json<Value>) -> HttpResponse {
    let body = body.into_inner();
    let operation = body.get("operation").and_then(Value::as_str);

    match operation {
        Some("store") => {
            let req = StoreQuoteRequest {
                file_size: body
                    .get("fileSize")
                    .or_else(|| body.get("file_size"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                permanent: body.get("permanent").and_then(Value::as_bool).unwrap_or(false),
                ttl: body.get("ttl").and_then(Value::as_u64),
                file_name: None,
                provider: None,
            };
            match collect_store_quotes(&state, &req).await {
                Ok((_, best)) => HttpResponse::Ok().json(best),
                Err(response) => response,
            }
        }
        Some("run") => {
            let code_size = body
                .get("codeSize")
                .or_else(|| body.get("code_size"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let language = body
                .get("language")
                .and_then(Value::as_str)
                .unwrap_or("python");
            match state.providers.merit.run_quote(code_size, language).await {
                Ok(quote) => HttpResponse::Ok().json(quote),
                Err(detail) => unavailable(&detail),
            }
        }
        Some("cache") => {
            let region = body
                .get("region")
                .and_then(Value::as_str)
                .unwrap_or(&state.config.xcache_default_region)
                .to_string();
            match state.providers.xcache.create_quote(&region).await {
                Ok(quote) => HttpResponse::Ok().json(quote),
                Err(detail) => unavailable(&detail),
            }
        }
        other => bad_request(format!(
            "Unknown operation type: {}. Supported: 'store', 'run', 'cache'",
            other.unwrap_or("<missing>")
        )),
    }
}

// ==================== Comparison routes ====================

/// Output selector for the comparison routes: structured JSON (default) or
/// a rendered markdown table via `?format=markdown`.
#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    format: Option<String>,
}

async fn compare_compute(
    state: web::Data<AppState>,
    req: web::Json<ComputeSpec>,
    format: web::Query<FormatQuery>,
) -> HttpResponse {
    let spec = req.into_inner();
    if let Err(detail) = spec.validate() {
        return bad_request(detail);
    }
    respond_with_comparison(&state, ResourceSpec::Compute(spec), &format).await
}

async fn compare_storage(
    state: web::Data<AppState>,
    req: web::Json<StorageSpec>,
    format: web::Query<FormatQuery>,
) -> HttpResponse {
    let spec = req.into_inner();
    if let Err(detail) = spec.validate() {
        return bad_request(detail);
    }
    respond_with_comparison(&state, ResourceSpec::Storage(spec), &format).await
}

async fn compare_cache(
    state: web::Data<AppState>,
    req: web::Json<CacheSpec>,
    format: web::Query<FormatQuery>,
) -> HttpResponse {
    let spec = req.into_inner();
    if let Err(detail) = spec.validate() {
        return bad_request(detail);
    }
    respond_with_comparison(&state, ResourceSpec::Cache(spec), &format).await
}

async fn respond_with_comparison(
    state: &AppState,
    spec: ResourceSpec,
    format: &FormatQuery,
) -> HttpResponse {
    match state.engine.compare(&spec).await {
        Ok(comparison) => match format.format.as_deref() {
            Some("markdown") => HttpResponse::Ok()
                .content_type("text/markdown; charset=utf-8")
                .body(export::to_markdown(&comparison)),
            _ => HttpResponse::Ok().json(comparison),
        },
        Err(EngineError::NoQuotes) => not_found("No quotes available"),
    }
}

#[derive(Debug, Deserialize)]
pub struct BestOfferRequest {
    #[serde(default)]
    compute: Option<ComputeSpec>,
    #[serde(default)]
    storage: Option<StorageSpec>,
    #[serde(default)]
    cache: Option<CacheSpec>,
}

async fn best_offer(state: web::Data<AppState>, req: web::Json<BestOfferRequest>) -> HttpResponse {
    let req = req.into_inner();
    for validation in [
        req.compute.as_ref().map(ComputeSpec::validate),
        req.storage.as_ref().map(StorageSpec::validate),
        req.cache.as_ref().map(CacheSpec::validate),
    ]
    .into_iter()
    .flatten()
    {
        if let Err(detail) = validation {
            return bad_request(detail);
        }
    }

    match state.engine.get_best_offer(req.compute, req.storage, req.cache).await {
        Some(best) => HttpResponse::Ok().json(best),
        None => not_found("No quotes available"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::providers::Providers;
    use crate::quote::engine::QuoteEngine;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use std::sync::Arc;

    /// State with real adapters pointing at their default URLs. Only
    /// handlers that reject before any network call are exercised here;
    /// upstream behavior is covered by the adapter and engine tests.
    fn test_state() -> AppState {
        let config = Config::from_env();
        let providers = Providers::new(&config).expect("providers");
        let engine = Arc::new(QuoteEngine::new(
            providers.registry(),
            config.compare_deadline,
        ));
        AppState {
            config,
            engine,
            providers,
        }
    }

    #[actix_web::test]
    async fn unknown_best_operation_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/quote/best")
            .set_json(serde_json::json!({"operation": "teleport"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["detail"].as_str().unwrap().contains("teleport"));
    }

    #[actix_web::test]
    async fn zero_file_size_is_rejected_before_any_fan_out() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/quote/store")
            .set_json(serde_json::json!({"fileSize": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn invalid_compute_spec_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/quotes/compute")
            .set_json(serde_json::json!({"cpu_cores": 0.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "cpu_cores must be positive");
    }
}
