//! Collection pipeline tests against in-memory collaborators.
//!
//! Delays run on tokio's paused clock, so elapsed times are exact.

mod common;

use std::sync::Arc;
use std::time::Duration;

use server_core::domains::collection::{
    collect_target, run_collection, run_summary, run_workers, start_background_run,
    CollectionError, CollectorSettings,
};
use server_core::kernel::test_dependencies::{
    test_article, test_credentials, test_page, MemoryListingStore, MockListingSource,
    MockTargetSheet,
};
use server_core::kernel::{RunLock, TestDependencies};
use tokio::time::Instant;

use common::{fixed_stamp, summary_row};

/// Settings with the production delays.
fn paced() -> CollectorSettings {
    CollectorSettings::default()
}

/// Five complexes: 101 (1 kept of 2), 102 (2 kept), 103 (none kept),
/// 104 (1 kept), 105 (2 kept over two pages).
fn five_target_source() -> MockListingSource {
    MockListingSource::new()
        .with_page(
            "101",
            test_page(
                vec![
                    test_article("매매", "10억 2,000", Some("5/15")),
                    test_article("월세", "1,000/80", Some("3/15")),
                ],
                false,
            ),
        )
        .with_page(
            "102",
            test_page(
                vec![
                    test_article("전세", "5억", Some("7/20")),
                    test_article("전세", "4억 8,000", None),
                ],
                false,
            ),
        )
        .with_page(
            "103",
            test_page(vec![test_article("월세", "500/40", Some("2/10"))], false),
        )
        .with_page(
            "104",
            test_page(vec![test_article("매매", "9,500", Some("저/12"))], false),
        )
        .with_page(
            "105",
            test_page(vec![test_article("매매", "12억", Some("10/25"))], true),
        )
        .with_page(
            "105",
            test_page(vec![test_article("전세", "6억 500", Some("11/25"))], false),
        )
}

#[tokio::test(start_paused = true)]
async fn test_five_targets_two_workers_end_to_end() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101", "102", "103", "104", "105"]))
        .with_store(MemoryListingStore::new().with_summary(vec![summary_row("101", "매매", 102000, 102000)]))
        .with_credentials(2)
        .with_settings(paced());

    let started = Instant::now();
    let summary = run_collection(Arc::new(deps.server_deps()))
        .await
        .expect("run should succeed");

    // Worker 1: three targets at 2s each. Worker 2: 2s + (2s + 1s page delay).
    // Run concurrently, the slower worker bounds the run.
    assert_eq!(started.elapsed(), Duration::from_secs(6));

    let assigned: Vec<usize> = summary.workers.iter().map(|w| w.targets_assigned).collect();
    assert_eq!(assigned, vec![3, 2]);
    assert_eq!(summary.workers[0].listings_inserted, 3);
    assert_eq!(summary.workers[1].listings_inserted, 3);

    assert_eq!(summary.totals.targets_assigned, 5);
    assert_eq!(summary.totals.targets_processed, 5);
    assert_eq!(summary.totals.listings_inserted, 6);
    assert_eq!(summary.summary_rows, 1);

    let inserted = deps.store.inserted();
    assert_eq!(inserted.len(), 6);
    assert!(inserted
        .iter()
        .all(|l| l.trade_type_name == "매매" || l.trade_type_name == "전세"));
    assert!(inserted.iter().all(|l| l.collected_date == inserted[0].collected_date
        && l.collected_time == inserted[0].collected_time));

    // One batch per target with kept listings; 103 writes nothing
    let mut batch_targets: Vec<String> = deps.store.batches().into_iter().map(|(t, _)| t).collect();
    batch_targets.sort();
    assert_eq!(batch_targets, vec!["101", "102", "104", "105"]);

    // Each worker only saw its own slice
    for target in ["101", "102", "103"] {
        assert!(deps
            .source
            .calls_for(target)
            .iter()
            .all(|c| c.credential_id == "worker-1"));
    }
    for target in ["104", "105"] {
        assert!(deps
            .source
            .calls_for(target)
            .iter()
            .all(|c| c.credential_id == "worker-2"));
    }

    assert_eq!(deps.store.writers_acquired(), 2);
    assert_eq!(deps.store.writers_released(), 2);
    assert_eq!(deps.sheet.written().len(), 1);
    assert!(deps.notifier.was_notified("Listing collection run started"));
    assert!(deps.notifier.was_notified("Collection run finished in 6s"));
}

#[tokio::test(start_paused = true)]
async fn test_normalized_fields() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101", "104"]));

    run_collection(Arc::new(deps.server_deps())).await.unwrap();

    let inserted = deps.store.inserted();
    assert_eq!(inserted.len(), 2);

    let first = &inserted[0];
    assert_eq!(first.complex_no, "101");
    assert_eq!(first.price, "102000");
    assert_eq!(first.floor.as_deref(), Some("5"));
    assert_eq!(first.max_floor.as_deref(), Some("15"));

    let second = &inserted[1];
    assert_eq!(second.price, "9500");
    assert_eq!(second.floor.as_deref(), Some("저"));
}

#[tokio::test(start_paused = true)]
async fn test_zero_allowed_listings_still_processed() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["103"]));

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_processed, 1);
    assert_eq!(summary.totals.listings_inserted, 0);
    assert!(deps.store.batches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_then_next_target_after_cooldown() {
    let source = MockListingSource::new()
        .with_failure("101", "status 401")
        .with_page(
            "102",
            test_page(vec![test_article("매매", "3억", Some("1/5"))], false),
        );
    let deps = TestDependencies::new()
        .with_source(source)
        .with_settings(paced());
    let server_deps = Arc::new(deps.server_deps());

    let started = Instant::now();
    let (totals, reports) = run_workers(
        server_deps,
        &["101".to_string(), "102".to_string()],
        &test_credentials(1),
        &fixed_stamp(),
    )
    .await;

    // 2s before 101, 5s cooldown after its failure, 2s before 102
    assert_eq!(started.elapsed(), Duration::from_secs(9));
    assert_eq!(reports.len(), 1);
    assert_eq!(totals.targets_assigned, 2);
    assert_eq!(totals.targets_processed, 1);
    assert_eq!(totals.listings_inserted, 1);
    assert_eq!(deps.source.calls_for("101").len(), 1);
    assert_eq!(deps.source.calls_for("102").len(), 1);
    assert!(deps.notifier.was_notified("Complex 101: fetch failed"));
    assert!(deps.notifier.was_notified("Complex 102: 1 listings stored"));
}

#[tokio::test(start_paused = true)]
async fn test_partial_fetch_keeps_earlier_pages() {
    let source = MockListingSource::new()
        .with_page(
            "101",
            test_page(vec![test_article("전세", "2억", None)], true),
        )
        .with_failure("101", "timeout");
    let deps = TestDependencies::new()
        .with_source(source)
        .with_sheet(MockTargetSheet::new(&["101"]));

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(deps.store.inserted().len(), 1);
    assert_eq!(summary.totals.listings_inserted, 1);
    assert_eq!(summary.totals.targets_processed, 0);
    assert!(deps.notifier.was_notified("kept 1 listings"));
}

#[tokio::test(start_paused = true)]
async fn test_storage_error_does_not_stop_worker() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101", "102"]))
        .with_store(MemoryListingStore::new().with_failing_insert("101"));

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_processed, 1);
    assert_eq!(summary.totals.listings_inserted, 2);
    assert_eq!(deps.store.batches(), vec![("102".to_string(), 2)]);
    assert!(deps.notifier.was_notified("Complex 101: failed to store"));
}

#[tokio::test(start_paused = true)]
async fn test_storage_unavailable_skips_worker_not_run() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101", "102"]))
        .with_store(MemoryListingStore::new().without_connections());

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_assigned, 2);
    assert_eq!(summary.totals.targets_processed, 0);
    assert!(deps.source.calls().is_empty());
    assert!(deps.notifier.was_notified("storage unavailable"));
}

#[tokio::test]
async fn test_empty_target_list_succeeds_without_work() {
    let deps = TestDependencies::new().with_sheet(MockTargetSheet::new(&[]));

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_assigned, 0);
    assert!(summary.workers.is_empty());
    assert_eq!(deps.store.writers_acquired(), 0);
    assert!(deps.sheet.written().is_empty());
    assert!(deps.notifier.was_notified("nothing to collect"));
}

#[tokio::test]
async fn test_missing_credentials_fails_run() {
    let deps = TestDependencies::new()
        .with_sheet(MockTargetSheet::new(&["101"]))
        .with_credentials(0);

    let err = run_collection(Arc::new(deps.server_deps()))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CollectionError>(),
        Some(CollectionError::NoCredentials)
    ));
    assert!(deps.source.calls().is_empty());
    assert!(deps.notifier.was_notified("Collection run failed"));
}

#[tokio::test]
async fn test_sheet_failure_is_reported() {
    let deps = TestDependencies::new().with_sheet(MockTargetSheet::failing());

    let result = run_collection(Arc::new(deps.server_deps())).await;

    assert!(result.is_err());
    assert!(deps.notifier.was_notified("Collection run failed after 0s"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_targets_fetched_once() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101", "102", "101", "102"]))
        .with_credentials(2);

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_assigned, 2);
    assert_eq!(deps.source.calls_for("101").len(), 1);
    assert_eq!(deps.source.calls_for("102").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_more_credentials_than_targets() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101", "102"]))
        .with_credentials(5);

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.workers.len(), 2);
    assert_eq!(deps.store.writers_acquired(), 2);
    assert!(!deps.notifier.was_notified("[worker-3]"));
}

#[tokio::test(start_paused = true)]
async fn test_collect_target_direct() {
    let deps = TestDependencies::new().with_source(five_target_source());
    let credential = &test_credentials(1)[0];

    let harvest = collect_target(
        deps.source.as_ref(),
        "105",
        credential,
        &paced(),
        &fixed_stamp(),
    )
    .await;

    assert_eq!(harvest.pages_fetched, 2);
    assert_eq!(harvest.listings.len(), 2);
    assert_eq!(harvest.listings[1].price, "60500");
}

#[tokio::test]
async fn test_run_summary_overwrites_sheet() {
    let rows = vec![
        summary_row("101", "매매", 95000, 102000),
        summary_row("102", "전세", 48000, 50000),
    ];
    let deps = TestDependencies::new().with_store(MemoryListingStore::new().with_summary(rows.clone()));

    let written = run_summary(&deps.server_deps()).await.unwrap();

    assert_eq!(written, 2);
    assert_eq!(deps.sheet.written(), vec![rows]);
    assert!(deps.notifier.was_notified("Summary sheet updated with 2 rows"));
}

#[tokio::test]
async fn test_run_summary_with_no_rows_still_clears_sheet() {
    let deps = TestDependencies::new();

    let written = run_summary(&deps.server_deps()).await.unwrap();

    assert_eq!(written, 0);
    assert_eq!(deps.sheet.written(), vec![Vec::new()]);
}

#[tokio::test(start_paused = true)]
async fn test_background_run_holds_lock_until_done() {
    let deps = TestDependencies::new()
        .with_source(five_target_source())
        .with_sheet(MockTargetSheet::new(&["101"]))
        .with_settings(paced());
    let server_deps = Arc::new(deps.server_deps());
    let lock = RunLock::new();

    let handle = start_background_run(server_deps.clone(), &lock).expect("first run starts");
    assert!(lock.is_active());
    assert!(matches!(
        start_background_run(server_deps.clone(), &lock),
        Err(CollectionError::RunInProgress)
    ));

    handle.await.unwrap();
    assert!(!lock.is_active());
    assert_eq!(deps.store.inserted().len(), 1);

    // The lock can be taken again once the run has ended
    let handle = start_background_run(server_deps, &lock).expect("second run starts");
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_background_run_releases_lock_on_failure() {
    let deps = TestDependencies::new().with_sheet(MockTargetSheet::failing());
    let lock = RunLock::new();

    let handle = start_background_run(Arc::new(deps.server_deps()), &lock).unwrap();
    handle.await.unwrap();

    assert!(!lock.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_price_does_not_stop_worker() {
    let source = MockListingSource::new()
        .with_page(
            "101",
            test_page(vec![test_article("매매", "1000000000000000억", None)], false),
        )
        .with_page(
            "102",
            test_page(vec![test_article("전세", "4억", None)], false),
        );
    let deps = TestDependencies::new()
        .with_source(source)
        .with_sheet(MockTargetSheet::new(&["101", "102"]));

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_processed, 2);
    assert_eq!(summary.totals.listings_inserted, 2);
    assert_eq!(deps.source.calls_for("102").len(), 1);

    let prices: Vec<String> = deps.store.inserted().into_iter().map(|l| l.price).collect();
    assert_eq!(prices, vec!["1000000000000000억", "40000"]);
}

#[tokio::test(start_paused = true)]
async fn test_worker_panic_is_reported_and_siblings_finish() {
    // 103 and 104 have no scripted pages and come back empty
    let source = MockListingSource::new().with_panic("101", "source exploded");
    let deps = TestDependencies::new()
        .with_source(source)
        .with_sheet(MockTargetSheet::new(&["101", "102", "103", "104"]))
        .with_credentials(2);

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    // worker-1 owned 101 and 102 and died on 101; worker-2 owned 103 and 104
    assert_eq!(summary.workers[0].targets_assigned, 2);
    assert_eq!(summary.workers[0].targets_processed, 0);
    assert_eq!(summary.workers[1].targets_processed, 2);
    assert!(deps.source.calls_for("102").is_empty());
    assert!(deps
        .notifier
        .was_notified("[worker-1] Worker stopped unexpectedly"));
    assert_eq!(deps.store.writers_released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credential_is_called_out() {
    let source = MockListingSource::new()
        .with_rejection("101", 401)
        .with_page(
            "102",
            test_page(vec![test_article("매매", "7억", None)], false),
        );
    let deps = TestDependencies::new()
        .with_source(source)
        .with_sheet(MockTargetSheet::new(&["101", "102"]));

    let summary = run_collection(Arc::new(deps.server_deps())).await.unwrap();

    assert_eq!(summary.totals.targets_processed, 1);
    assert!(deps
        .notifier
        .was_notified("[worker-1] Credential rejected while fetching complex 101"));
    assert!(!deps.notifier.was_notified("Credential rejected while fetching complex 102"));
}
