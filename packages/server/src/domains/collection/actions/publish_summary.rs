//! Republish today's aggregate to the summary sheet.

use tokio::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info};

use crate::common::utils::format_elapsed;
use crate::kernel::ServerDeps;

/// Read today's summary from storage and overwrite the summary sheet.
///
/// The sheet is always fully replaced, so a day without listings leaves only
/// the header row. Returns the number of data rows written.
pub async fn publish_summary(deps: &ServerDeps) -> Result<usize> {
    let rows = deps
        .listing_store
        .query_summary()
        .await
        .context("Failed to query today's summary")?;
    info!(rows = rows.len(), "Fetched summary rows");

    deps.target_sheet
        .clear_and_write_summary(&rows)
        .await
        .context("Failed to write summary sheet")?;

    Ok(rows.len())
}

/// Standalone summary task: publish and report start, completion and failure.
pub async fn run_summary(deps: &ServerDeps) -> Result<usize> {
    let started = Instant::now();
    let today = Local::now().format("%Y-%m-%d");

    info!("Starting summary and upload");
    deps.notifier
        .notify(&format!("[{}] Updating the summary sheet", today))
        .await;

    match publish_summary(deps).await {
        Ok(rows) => {
            info!(rows, "Summary and upload finished");
            deps.notifier
                .notify(&format!(
                    "[{}] Summary sheet updated with {} rows in {}",
                    today,
                    rows,
                    format_elapsed(started.elapsed())
                ))
                .await;
            Ok(rows)
        }
        Err(e) => {
            error!(error = %e, "Summary and upload failed");
            deps.notifier
                .notify(&format!(
                    "[{}] Summary sheet update failed after {}: {:#}",
                    today,
                    format_elapsed(started.elapsed()),
                    e
                ))
                .await;
            Err(e)
        }
    }
}
