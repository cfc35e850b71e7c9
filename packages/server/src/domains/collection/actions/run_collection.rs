//! One full collection run.

use std::sync::Arc;
use tokio::time::Instant;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::publish_summary::publish_summary;
use super::worker_pool::run_workers;
use crate::common::utils::format_elapsed;
use crate::common::CaptureStamp;
use crate::domains::collection::error::CollectionError;
use crate::domains::collection::types::{RunResult, RunSummary};
use crate::kernel::deps::dedup_targets;
use crate::kernel::{RunLock, ServerDeps};

/// Read targets, collect them across all workers, then republish the summary.
///
/// Every transition is mirrored to the notifier. An empty target list ends
/// the run successfully without starting workers; no credentials fails it.
/// Per-target failures never surface here, only failures outside the worker
/// loop (sheet, summary) do, and those are reported with the elapsed time
/// before being returned.
pub async fn run_collection(deps: Arc<ServerDeps>) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let stamp = CaptureStamp::now();
    let started = Instant::now();

    info!(run_id = %run_id, "Collection run starting");
    deps.notifier
        .notify(&format!("[{}] Listing collection run started", stamp.date))
        .await;

    match execute_run(&deps, run_id, &stamp, started).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            let elapsed = format_elapsed(started.elapsed());
            error!(run_id = %run_id, error = %e, elapsed = %elapsed, "Collection run failed");
            deps.notifier
                .notify(&format!(
                    "[{}] Collection run failed after {}: {:#}",
                    stamp.date, elapsed, e
                ))
                .await;
            Err(e)
        }
    }
}

async fn execute_run(
    deps: &Arc<ServerDeps>,
    run_id: Uuid,
    stamp: &CaptureStamp,
    started: Instant,
) -> Result<RunSummary> {
    let targets = dedup_targets(
        deps.target_sheet
            .read_targets()
            .await
            .context("Failed to read targets")?,
    );

    if targets.is_empty() {
        warn!(run_id = %run_id, "No complex numbers to process");
        deps.notifier
            .notify(&format!(
                "[{}] No complexes listed in the sheet, nothing to collect",
                stamp.date
            ))
            .await;
        return Ok(RunSummary {
            run_id,
            totals: RunResult::default(),
            workers: Vec::new(),
            summary_rows: 0,
            elapsed_secs: started.elapsed().as_secs(),
        });
    }

    if deps.credentials.is_empty() {
        return Err(CollectionError::NoCredentials.into());
    }

    info!(
        run_id = %run_id,
        targets = targets.len(),
        credentials = deps.credentials.len(),
        "Starting parallel collection"
    );

    let dispatched = Instant::now();
    let (totals, workers) = run_workers(deps.clone(), &targets, &deps.credentials, stamp).await;

    info!(
        run_id = %run_id,
        processed = totals.targets_processed,
        listings = totals.listings_inserted,
        "All workers finished, publishing summary"
    );

    let summary_rows = publish_summary(deps).await?;
    let elapsed = dispatched.elapsed();

    deps.notifier
        .notify(&format!(
            "[{}] Collection run finished in {}. Complexes processed: {}/{}, listings stored: {}, summary rows: {}",
            stamp.date,
            format_elapsed(elapsed),
            totals.targets_processed,
            totals.targets_assigned,
            totals.listings_inserted,
            summary_rows
        ))
        .await;
    info!(run_id = %run_id, elapsed = %format_elapsed(elapsed), "Collection run finished");

    Ok(RunSummary {
        run_id,
        totals,
        workers,
        summary_rows,
        elapsed_secs: elapsed.as_secs(),
    })
}

/// Start a run in the background unless one is already in flight.
///
/// The lock is held by the spawned task and released when it ends, however
/// it ends.
pub fn start_background_run(
    deps: Arc<ServerDeps>,
    run_lock: &RunLock,
) -> Result<JoinHandle<()>, CollectionError> {
    let guard = run_lock
        .try_acquire()
        .ok_or(CollectionError::RunInProgress)?;

    Ok(tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = run_collection(deps).await {
            error!(error = %e, "Background collection run failed");
        }
    }))
}
