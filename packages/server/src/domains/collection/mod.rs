//! Collection domain - harvesting listings from the Naver Land API
//!
//! # Pipeline
//!
//! ```text
//! run_collection (one run, guarded by RunLock)
//!     ├─► BaseTargetSheet::read_targets()
//!     ├─► run_workers (one tokio task per credential)
//!     │       └─► run_worker (sequential over its slice of targets)
//!     │               ├─► collect_target (page loop + filter + normalize)
//!     │               └─► ListingWriter::insert_listings (one batch per target)
//!     └─► publish_summary (sum_today view → summary sheet)
//! ```
//!
//! # Components
//!
//! - `actions/` - Pipeline steps
//! - `models/` - Stored rows (NormalizedListing, SummaryRow)
//! - `types` - Settings and per-run result types
//! - `error` - Run outcomes callers branch on

pub mod actions;
pub mod error;
pub mod models;
pub mod types;

pub use actions::{
    collect_target, partition_targets, publish_summary, run_collection, run_summary, run_worker,
    run_workers, start_background_run,
};
pub use error::CollectionError;
pub use models::{NormalizedListing, SummaryRow};
pub use types::{CollectorSettings, RunResult, RunSummary, TargetHarvest, WorkerReport};
