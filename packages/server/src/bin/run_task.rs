//! Batch runner: one collection or summary task, then exit.
//!
//! Exit code 0 when the task completed, 1 on configuration errors (including
//! missing credentials) or when the task failed.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use server_core::config::Config;
use server_core::domains::collection::{run_collection, run_summary};
use server_core::kernel::{connect_database, ErrorAlerts, ErrorAlertLayer, ServerDeps};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "run_task")]
#[command(about = "Run one listing collector task from the command line")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand, Clone, Copy)]
enum Task {
    /// Collect listings for every complex in the sheet, then republish the summary
    Collect,

    /// Republish today's summary without collecting
    Summary,
}

#[tokio::main]
async fn main() -> ExitCode {
    // ERROR events also go to Telegram once deps exist
    let (alert_layer, error_alerts) = ErrorAlertLayer::new();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(alert_layer)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli.task, &error_alerts).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Task failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(task: Task, error_alerts: &ErrorAlerts) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    match task {
        Task::Collect => {
            if config.credentials.is_empty() {
                bail!(
                    "No Naver API credentials found. Set NAVER_API_COOKIE_1 and NAVER_API_AUTHORIZATION_1 (then _2, _3, ...)"
                );
            }
            tracing::info!(
                credentials = config.credentials.len(),
                "Starting task 'collect'"
            );

            let pool = connect_database(&config.database_url).await?;
            let deps = Arc::new(ServerDeps::from_config(&config, pool.clone()).await?);
            error_alerts.attach(deps.notifier.clone());

            let result = run_collection(deps).await;
            pool.close().await;

            let summary = result?;
            tracing::info!(
                run_id = %summary.run_id,
                processed = summary.totals.targets_processed,
                listings = summary.totals.listings_inserted,
                summary_rows = summary.summary_rows,
                "All collection tasks finished"
            );
        }
        Task::Summary => {
            tracing::info!("Starting task 'summary'");

            let pool = connect_database(&config.database_url).await?;
            let deps = ServerDeps::from_config(&config, pool.clone()).await?;
            error_alerts.attach(deps.notifier.clone());

            let result = run_summary(&deps).await;
            pool.close().await;

            let rows = result?;
            tracing::info!(rows, "Summary task finished");
        }
    }

    Ok(())
}
