//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod error_alerts;
pub mod run_lock;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{
    connect_database, GoogleSheetAdapter, LandClientAdapter, PostgresListingStore, ServerDeps,
    TelegramNotifier,
};
pub use error_alerts::{ErrorAlertLayer, ErrorAlerts};
pub use run_lock::{RunGuard, RunLock};
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::TestDependencies;
pub use traits::*;
