//! Scheduled collection runs using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (COLLECT_CRON)
//!     │
//!     └─► start_background_run()
//!             ├─► RunLock free  → full collection run
//!             └─► RunLock taken → skipped, logged
//! ```
//!
//! Scheduled runs share the RunLock with the HTTP trigger, so a cron tick
//! never overlaps a manually started run.

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::collection::{start_background_run, CollectionError};
use crate::kernel::{RunLock, ServerDeps};

/// Start the collection schedule.
///
/// `cron` uses the six-field syntax with seconds first, e.g. `0 0 6 * * *`.
pub async fn start_scheduler(
    deps: Arc<ServerDeps>,
    run_lock: RunLock,
    cron: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let collect_job = Job::new_async(cron, move |_uuid, _lock| {
        let deps = deps.clone();
        let run_lock = run_lock.clone();
        Box::pin(async move {
            tracing::info!("Scheduled collection run triggered");
            match start_background_run(deps, &run_lock) {
                Ok(_) => {}
                Err(CollectionError::RunInProgress) => {
                    tracing::warn!("Previous collection run still active, skipping this tick");
                }
                Err(e) => tracing::error!("Scheduled collection run failed to start: {}", e),
            }
        })
    })?;

    scheduler.add(collect_job).await?;
    scheduler.start().await?;

    tracing::info!(cron = %cron, "Scheduled collection started");
    Ok(scheduler)
}
