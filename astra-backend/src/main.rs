use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod providers;
mod quote;
mod x402;

use config::Config;
use providers::Providers;
use quote::cache::QuoteCache;
use quote::engine::QuoteEngine;

pub struct AppState {
    pub config: Config,
    pub engine: Arc<QuoteEngine>,
    pub providers: Providers,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing provider adapters");
    let providers = Providers::new(&config).expect("Failed to initialize provider adapters");

    let mut engine = QuoteEngine::new(providers.registry(), config.compare_deadline);
    if let Some(ttl) = config.quote_cache_ttl {
        log::info!("Quote cache enabled with TTL {:?}", ttl);
        engine = engine.with_cache(QuoteCache::new(ttl));
    }
    let engine = Arc::new(engine);

    log::info!("Starting Astra quote engine on port {}", port);

    let providers_handle = providers.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                config: config.clone(),
                engine: Arc::clone(&engine),
                providers: providers_handle.clone(),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::quotes::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
