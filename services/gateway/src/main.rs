use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use gateway::{config::Config, handlers, metrics, sweeper, SessionAuth};
use risk_engine::{HttpRiskClassifier, ResilientRiskResolver};
use security::SessionStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    info!("Starting CashPlus gateway...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    metrics::init();

    // Initialize components
    let resolver_config = config.risk.resolver_config();
    let classifier = HttpRiskClassifier::new(config.risk.api_url.clone(), resolver_config.timeout)
        .context("Failed to build risk classifier client")?;
    let resolver = Arc::new(ResilientRiskResolver::new(resolver_config, Arc::new(classifier)));
    info!(
        "Risk resolver ready (external: {}, url: {})",
        config.risk.external_enabled, config.risk.api_url
    );

    let store = Arc::new(SessionStore::new(config.session.session_config()));
    actix_web::rt::spawn(sweeper::run_session_sweeper(
        store.clone(),
        config.session.sweep_interval(),
    ));

    let server_config = config.server.clone();

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(store.clone()))
            .wrap(SessionAuth::new(store.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await?;

    Ok(())
}
