// Main entry point for the collector HTTP server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::kernel::{
    connect_database, start_scheduler, ErrorAlertLayer, RunLock, ServerDeps,
};
use server_core::server::{build_app, AppState};
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; ERROR events also go to Telegram once deps exist
    let (alert_layer, error_alerts) = ErrorAlertLayer::new();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(alert_layer)
        .init();

    tracing::info!("Starting listing collector server");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(mode = %config.mode, credentials = config.credentials.len(), "Configuration loaded");
    if config.credentials.is_empty() {
        tracing::warn!("No Naver API credentials configured, collection runs will fail");
    }

    let pool = connect_database(&config.database_url).await?;
    let deps = Arc::new(ServerDeps::from_config(&config, pool).await?);
    error_alerts.attach(deps.notifier.clone());
    let run_lock = RunLock::new();

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = match &config.collect_cron {
        Some(cron) => Some(
            start_scheduler(deps.clone(), run_lock.clone(), cron)
                .await
                .context("Failed to start scheduler")?,
        ),
        None => {
            tracing::info!("COLLECT_CRON not set, runs are only started over HTTP");
            None
        }
    };

    let app = build_app(AppState::new(deps, run_lock));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Trigger a run: http://localhost:{}/complex_load", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
