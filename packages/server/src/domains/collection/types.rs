use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::models::NormalizedListing;

/// Pacing and safety limits for the collection pipeline.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Wait between consecutive pages of one target.
    pub page_delay: Duration,
    /// Wait after a target failed before moving on to the next one.
    pub error_cooldown: Duration,
    /// Wait before starting each target.
    pub target_delay: Duration,
    /// Hard stop for a target whose source never reports the last page.
    pub max_pages: u32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(1),
            error_cooldown: Duration::from_secs(5),
            target_delay: Duration::from_secs(2),
            max_pages: 100,
        }
    }
}

impl CollectorSettings {
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_error_cooldown(mut self, cooldown: Duration) -> Self {
        self.error_cooldown = cooldown;
        self
    }

    pub fn with_target_delay(mut self, delay: Duration) -> Self {
        self.target_delay = delay;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Everything collected for one target.
#[derive(Debug, Clone)]
pub struct TargetHarvest {
    pub target: String,
    /// Allow-listed, normalized listings in page order.
    pub listings: Vec<NormalizedListing>,
    pub pages_fetched: u32,
    /// Set when a page fetch failed; `listings` then holds the earlier pages.
    pub failure: Option<String>,
    /// The failure was the source refusing the credential (401/403).
    pub credential_rejected: bool,
}

impl TargetHarvest {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Counters for one worker (one credential, one slice of targets).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker_id: String,
    pub targets_assigned: usize,
    pub targets_processed: usize,
    pub listings_inserted: u64,
}

impl WorkerReport {
    pub fn new(worker_id: impl Into<String>, targets_assigned: usize) -> Self {
        Self {
            worker_id: worker_id.into(),
            targets_assigned,
            ..Default::default()
        }
    }
}

/// Counters summed over every worker of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub targets_assigned: usize,
    pub targets_processed: usize,
    pub listings_inserted: u64,
}

impl RunResult {
    pub fn absorb(&mut self, report: &WorkerReport) {
        self.targets_assigned += report.targets_assigned;
        self.targets_processed += report.targets_processed;
        self.listings_inserted += report.listings_inserted;
    }
}

impl<'a> FromIterator<&'a WorkerReport> for RunResult {
    fn from_iter<I: IntoIterator<Item = &'a WorkerReport>>(iter: I) -> Self {
        let mut total = RunResult::default();
        for report in iter {
            total.absorb(report);
        }
        total
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub totals: RunResult,
    pub workers: Vec<WorkerReport>,
    pub summary_rows: usize,
    pub elapsed_secs: u64,
}
