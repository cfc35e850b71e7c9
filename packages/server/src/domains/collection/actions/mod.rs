//! Collection domain actions
//!
//! Plain async functions over `ServerDeps`; no action talks to a concrete
//! client directly.

pub mod collect_target;
pub mod publish_summary;
pub mod run_collection;
pub mod worker_pool;

pub use collect_target::collect_target;
pub use publish_summary::{publish_summary, run_summary};
pub use run_collection::{run_collection, start_background_run};
pub use worker_pool::{partition_targets, run_worker, run_workers};
