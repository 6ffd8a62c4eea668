mod admin;
mod bootstrap;
mod health;
mod proxy;
mod storefront;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use quizlite_core::config::{AppConfig, LoadOptions};
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::bootstrap::Application;

fn init_logging(config: &AppConfig) {
    use quizlite_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn app_router(app: &Application) -> Router {
    let proxy_state = proxy::ProxyState::new(app.recommendations.clone(), app.config.catalog.shop.clone());
    let admin_state = admin::AdminState::new(app.store.clone(), app.config.admin.password.clone());

    Router::new()
        .merge(health::router(app.store.clone()))
        .merge(proxy::router(proxy_state, &app.config.server.static_dir))
        .merge(admin::router(admin_state))
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = app_router(&app);

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        public_url = %app.config.server.public_url(),
        admin_enabled = app.config.admin.is_enabled(),
        "quizlite-server started"
    );

    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.notified().await })
            .await
    });

    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "quizlite-server stopping"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not drain before the shutdown deadline"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
