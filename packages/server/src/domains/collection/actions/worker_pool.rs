//! Fan targets out over one worker per credential.

use std::sync::Arc;
use tokio::time::Instant;

use futures::future::join_all;
use tracing::{error, info, warn};

use super::collect_target::collect_target;
use crate::common::utils::format_elapsed;
use crate::common::{CaptureStamp, Credential, Target};
use crate::domains::collection::types::{RunResult, WorkerReport};
use crate::kernel::ServerDeps;

/// Split `targets` into contiguous chunks of `ceil(T / W)`.
///
/// Only non-empty chunks are returned, so there are `min(W, T)` of them
/// (fewer when the chunk size leaves the last workers without targets).
/// Concatenating the chunks in order reproduces `targets`.
pub fn partition_targets(targets: &[Target], workers: usize) -> Vec<&[Target]> {
    if targets.is_empty() || workers == 0 {
        return Vec::new();
    }

    let chunk_size = targets.len().div_ceil(workers);
    targets.chunks(chunk_size).collect()
}

/// Process a slice of targets sequentially with one credential.
///
/// Holds one storage writer for the whole loop. A failed fetch or a failed
/// insert costs that target only: it is reported, the worker cools down and
/// moves on.
pub async fn run_worker(
    deps: &ServerDeps,
    credential: &Credential,
    targets: &[Target],
    stamp: &CaptureStamp,
) -> WorkerReport {
    let worker = credential.id.as_str();
    let settings = &deps.settings;
    let mut report = WorkerReport::new(worker, targets.len());
    let started = Instant::now();

    info!(worker = %worker, targets = targets.len(), "Worker starting");
    deps.notifier
        .notify(&format!(
            "[{}] [{}] Starting collection for {} complexes",
            stamp.date,
            worker,
            targets.len()
        ))
        .await;

    let mut writer = match deps.listing_store.writer().await {
        Ok(writer) => writer,
        Err(e) => {
            error!(worker = %worker, error = %e, "Could not acquire a storage connection");
            deps.notifier
                .notify(&format!(
                    "[{}] Collection aborted, storage unavailable: {:#}",
                    worker, e
                ))
                .await;
            return report;
        }
    };

    for (index, target) in targets.iter().enumerate() {
        tokio::time::sleep(settings.target_delay).await;

        info!(
            worker = %worker,
            target = %target,
            position = index + 1,
            of = targets.len(),
            "Processing complex"
        );

        let harvest = collect_target(
            deps.listing_source.as_ref(),
            target,
            credential,
            settings,
            stamp,
        )
        .await;

        let inserted = if harvest.listings.is_empty() {
            info!(worker = %worker, target = %target, "No sale or lease listings found");
            0
        } else {
            match writer.insert_listings(&harvest.listings).await {
                Ok(count) => count,
                Err(e) => {
                    error!(worker = %worker, target = %target, error = %e, "Failed to store listings");
                    deps.notifier
                        .notify(&format!(
                            "[{}] Complex {}: failed to store {} listings: {:#}",
                            worker,
                            target,
                            harvest.listings.len(),
                            e
                        ))
                        .await;
                    tokio::time::sleep(settings.error_cooldown).await;
                    continue;
                }
            }
        };
        report.listings_inserted += inserted;

        if let Some(failure) = &harvest.failure {
            if harvest.credential_rejected {
                error!(worker = %worker, target = %target, "Credential rejected by the source");
                deps.notifier
                    .notify(&format!(
                        "[{}] Credential rejected while fetching complex {}. Refresh NAVER_API_COOKIE / NAVER_API_AUTHORIZATION for this worker",
                        worker, target
                    ))
                    .await;
            }
            warn!(
                worker = %worker,
                target = %target,
                kept = inserted,
                failure = %failure,
                "Complex only partially collected"
            );
            deps.notifier
                .notify(&format!(
                    "[{}] Complex {}: fetch failed ({}), kept {} listings",
                    worker, target, failure, inserted
                ))
                .await;
            tokio::time::sleep(settings.error_cooldown).await;
            continue;
        }

        report.targets_processed += 1;
        info!(worker = %worker, target = %target, inserted, "Complex stored");
        deps.notifier
            .notify(&format!(
                "[{}] Complex {}: {} listings stored",
                worker, target, inserted
            ))
            .await;
    }

    drop(writer);

    info!(
        worker = %worker,
        processed = report.targets_processed,
        listings = report.listings_inserted,
        "Worker finished"
    );
    deps.notifier
        .notify(&format!(
            "[{}] [{}] Collection finished in {}. Complexes: {}/{}, listings: {}",
            stamp.date,
            worker,
            format_elapsed(started.elapsed()),
            report.targets_processed,
            report.targets_assigned,
            report.listings_inserted
        ))
        .await;

    report
}

/// Run one worker per credential concurrently and wait for all of them.
///
/// Credentials beyond the number of non-empty chunks are not started. A
/// worker that panics is logged and contributes an empty report; its
/// siblings keep running.
pub async fn run_workers(
    deps: Arc<ServerDeps>,
    targets: &[Target],
    credentials: &[Credential],
    stamp: &CaptureStamp,
) -> (RunResult, Vec<WorkerReport>) {
    let chunks = partition_targets(targets, credentials.len());

    info!(
        targets = targets.len(),
        workers = chunks.len(),
        "Dispatching targets to workers"
    );

    let handles: Vec<_> = chunks
        .into_iter()
        .zip(credentials)
        .map(|(chunk, credential)| {
            let deps = deps.clone();
            let worker = credential.id.clone();
            let credential = credential.clone();
            let chunk = chunk.to_vec();
            let stamp = stamp.clone();
            let assigned = chunk.len();
            let handle = tokio::spawn(async move {
                run_worker(&deps, &credential, &chunk, &stamp).await
            });
            (worker, assigned, handle)
        })
        .collect();

    let reports = join_all(handles.into_iter().map(|(worker, assigned, handle)| {
        let deps = deps.clone();
        async move {
            match handle.await {
                Ok(report) => report,
                Err(e) => {
                    error!(worker = %worker, error = %e, "Worker task failed");
                    deps.notifier
                        .notify(&format!(
                            "[{}] Worker stopped unexpectedly, its remaining complexes were not collected: {}",
                            worker, e
                        ))
                        .await;
                    WorkerReport::new(worker, assigned)
                }
            }
        }
    }))
    .await;

    let totals: RunResult = reports.iter().collect();
    (totals, reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_five_targets_two_workers() {
        let targets = targets(5);
        let chunks = partition_targets(&targets, 2);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 2]);
    }

    #[test]
    fn test_more_workers_than_targets() {
        let targets = targets(2);
        let chunks = partition_targets(&targets, 5);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_four_targets_three_workers_leaves_one_idle() {
        let targets = targets(4);
        let chunks = partition_targets(&targets, 3);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(partition_targets(&[], 3).is_empty());
        assert!(partition_targets(&targets(4), 0).is_empty());
    }

    #[test]
    fn test_partition_covers_targets_in_order() {
        for t in 0..=23 {
            for w in 1..=6 {
                let targets = targets(t);
                let chunks = partition_targets(&targets, w);

                assert!(chunks.len() <= w.min(t));
                assert!(chunks.iter().all(|c| !c.is_empty()));
                let joined: Vec<String> = chunks.concat();
                assert_eq!(joined, targets, "t={} w={}", t, w);
            }
        }
    }
}
