pub mod cli;
pub mod core;
pub mod providers;
pub mod server;
pub mod service;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::config::AppConfig;
use crate::providers::ExchangeRateApiProvider;
use crate::service::RateService;

/// Wires the provider, service and router together from `config`.
pub fn build_app(config: &AppConfig) -> Result<Router> {
    let provider =
        ExchangeRateApiProvider::new(&config.provider.base_url, config.provider.timeout())?;
    let service = RateService::new(config.api_key.clone(), Arc::new(provider));

    if !service.is_configured() {
        warn!(
            "{} is not set; /rates and /convert will answer 503",
            crate::core::config::ENV_API_KEY
        );
    }

    Ok(server::app_router(Arc::new(service), &config.cors_origins))
}

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("Rate proxy starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let router = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Rate proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
