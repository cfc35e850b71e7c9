// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Pagination, filtering and failure policy live in domains/collection/actions.
//
// Naming convention: Base* for trait names (e.g., BaseListingSource, BaseNotifier)

use anyhow::Result;
use async_trait::async_trait;
use land_client::ArticlePage;

use crate::common::Credential;
use crate::domains::collection::models::{NormalizedListing, SummaryRow};

// =============================================================================
// Listing Source Trait (one page of one target under one credential)
// =============================================================================

#[async_trait]
pub trait BaseListingSource: Send + Sync {
    /// Fetch one page (1-based) of raw listings for a target.
    ///
    /// Implementations must not retry; any transport or status failure is
    /// returned as `Err` and the caller decides what to keep.
    async fn fetch_page(
        &self,
        target: &str,
        credential: &Credential,
        page: u32,
    ) -> Result<ArticlePage>;
}

// =============================================================================
// Target Sheet Trait (spreadsheet collaborator)
// =============================================================================

#[async_trait]
pub trait BaseTargetSheet: Send + Sync {
    /// Read the list of targets (blanks removed, duplicates removed).
    async fn read_targets(&self) -> Result<Vec<String>>;

    /// Replace the whole summary sheet with a header row plus `rows`.
    async fn clear_and_write_summary(&self, rows: &[SummaryRow]) -> Result<()>;
}

// =============================================================================
// Listing Store Traits (storage collaborator)
// =============================================================================

/// A storage handle held exclusively by one worker for its whole target loop.
///
/// Dropping the writer returns the underlying connection to the pool.
#[async_trait]
pub trait ListingWriter: Send {
    /// Append a batch of listings; returns the number of rows written.
    async fn insert_listings(&mut self, batch: &[NormalizedListing]) -> Result<u64>;
}

#[async_trait]
pub trait BaseListingStore: Send + Sync {
    /// Acquire a dedicated writer (one pooled connection).
    async fn writer(&self) -> Result<Box<dyn ListingWriter>>;

    /// Today's aggregate, as computed by the store's summary view.
    async fn query_summary(&self) -> Result<Vec<SummaryRow>>;

    /// Cheap connectivity check for the health endpoint.
    async fn ping(&self) -> Result<()>;
}

// =============================================================================
// Notifier Trait (operator channel)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Fire-and-forget: implementations log their own failures and never
    /// report them to the caller.
    async fn notify(&self, text: &str);
}
