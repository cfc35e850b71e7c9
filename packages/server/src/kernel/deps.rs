//! Server dependencies for the collection pipeline (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! pipeline action, plus the adapters that bind the infrastructure traits to
//! the real services (Naver Land, Google Sheets, Postgres, Telegram).

use anyhow::{Context, Result};
use async_trait::async_trait;
use land_client::{ArticlePage, LandClient};
use sheets_client::SheetsClient;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::collections::HashSet;
use std::sync::Arc;
use telegram::{TelegramOptions, TelegramService};

use crate::common::Credential;
use crate::config::Config;
use crate::domains::collection::models::{summary_sheet_values, NormalizedListing, SummaryRow};
use crate::domains::collection::CollectorSettings;
use crate::kernel::error_alerts::NOTIFY_FAILURE_TARGET;
use crate::kernel::{
    BaseListingSource, BaseListingStore, BaseNotifier, BaseTargetSheet, ListingWriter,
};

// =============================================================================
// LandClient Adapter (implements BaseListingSource trait)
// =============================================================================

/// Wrapper around LandClient that implements BaseListingSource trait
pub struct LandClientAdapter(pub Arc<LandClient>);

impl LandClientAdapter {
    pub fn new(client: Arc<LandClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseListingSource for LandClientAdapter {
    async fn fetch_page(
        &self,
        target: &str,
        credential: &Credential,
        page: u32,
    ) -> Result<ArticlePage> {
        let page_data = self
            .0
            .fetch_articles_page(target, &credential.to_land_auth(), page)
            .await?;
        Ok(page_data)
    }
}

// =============================================================================
// Google Sheets Adapter (implements BaseTargetSheet trait)
// =============================================================================

/// Targets live in column E of the list sheet, below a three-row header.
const TARGET_COLUMN_RANGE: &str = "E4:E";

pub struct GoogleSheetAdapter {
    client: Arc<SheetsClient>,
    spreadsheet_id: String,
    complex_list_sheet: String,
    summary_sheet: String,
}

impl GoogleSheetAdapter {
    pub fn new(
        client: Arc<SheetsClient>,
        spreadsheet_id: String,
        complex_list_sheet: String,
        summary_sheet: String,
    ) -> Self {
        Self {
            client,
            spreadsheet_id,
            complex_list_sheet,
            summary_sheet,
        }
    }
}

#[async_trait]
impl BaseTargetSheet for GoogleSheetAdapter {
    async fn read_targets(&self) -> Result<Vec<String>> {
        let range = format!("{}!{}", self.complex_list_sheet, TARGET_COLUMN_RANGE);
        tracing::info!(range = %range, "Fetching complex numbers from sheet");

        let values = self
            .client
            .get_values(&self.spreadsheet_id, &range)
            .await
            .with_context(|| format!("Failed to read targets from {}", range))?;

        let targets = dedup_targets(values.non_empty_cells());
        tracing::info!(count = targets.len(), "Found unique complex numbers");
        Ok(targets)
    }

    async fn clear_and_write_summary(&self, rows: &[SummaryRow]) -> Result<()> {
        tracing::info!(sheet = %self.summary_sheet, "Updating summary sheet");

        self.client
            .clear_values(&self.spreadsheet_id, &self.summary_sheet)
            .await
            .with_context(|| format!("Failed to clear sheet {}", self.summary_sheet))?;

        let values = summary_sheet_values(rows);
        self.client
            .append_values(
                &self.spreadsheet_id,
                &format!("{}!A1", self.summary_sheet),
                &values,
            )
            .await
            .with_context(|| format!("Failed to write sheet {}", self.summary_sheet))?;

        tracing::info!(sheet = %self.summary_sheet, rows = rows.len(), "Summary sheet updated");
        Ok(())
    }
}

/// Drop duplicates, keeping the first occurrence and the original order.
pub fn dedup_targets(targets: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    targets
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

// =============================================================================
// Postgres Listing Store (implements BaseListingStore trait)
// =============================================================================

pub struct PostgresListingStore {
    pool: PgPool,
}

impl PostgresListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One pooled connection, returned to the pool when dropped.
pub struct PostgresListingWriter {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl ListingWriter for PostgresListingWriter {
    async fn insert_listings(&mut self, batch: &[NormalizedListing]) -> Result<u64> {
        NormalizedListing::insert_batch(batch, &mut *self.conn).await
    }
}

#[async_trait]
impl BaseListingStore for PostgresListingStore {
    async fn writer(&self) -> Result<Box<dyn ListingWriter>> {
        let conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire database connection")?;
        Ok(Box::new(PostgresListingWriter { conn }))
    }

    async fn query_summary(&self) -> Result<Vec<SummaryRow>> {
        SummaryRow::find_today(&self.pool).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Telegram Notifier (implements BaseNotifier trait)
// =============================================================================

/// Sends notifications to a Telegram chat; a no-op (with a warning) when the
/// bot is not configured.
pub struct TelegramNotifier(pub Option<Arc<TelegramService>>);

impl TelegramNotifier {
    pub fn from_parts(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Self(Some(Arc::new(TelegramService::new(
                TelegramOptions { bot_token, chat_id },
            )))),
            _ => Self(None),
        }
    }
}

#[async_trait]
impl BaseNotifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        let Some(service) = self.0.as_ref() else {
            tracing::warn!("Telegram bot token or chat id is not set, skipping message");
            return;
        };

        if let Err(e) = service.send_message(text).await {
            tracing::error!(target: NOTIFY_FAILURE_TARGET, error = %e, "Failed to send Telegram message");
        }
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies shared by every run (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub listing_source: Arc<dyn BaseListingSource>,
    pub target_sheet: Arc<dyn BaseTargetSheet>,
    pub listing_store: Arc<dyn BaseListingStore>,
    pub notifier: Arc<dyn BaseNotifier>,
    /// Worker credentials, one worker per entry.
    pub credentials: Vec<Credential>,
    pub settings: CollectorSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        listing_source: Arc<dyn BaseListingSource>,
        target_sheet: Arc<dyn BaseTargetSheet>,
        listing_store: Arc<dyn BaseListingStore>,
        notifier: Arc<dyn BaseNotifier>,
        credentials: Vec<Credential>,
        settings: CollectorSettings,
    ) -> Self {
        Self {
            listing_source,
            target_sheet,
            listing_store,
            notifier,
            credentials,
            settings,
        }
    }

    /// Wire the production adapters from configuration.
    pub async fn from_config(config: &Config, pool: PgPool) -> Result<Self> {
        let sheets = SheetsClient::from_key_file(&config.google_auth_file)
            .await
            .with_context(|| {
                format!(
                    "Failed to load Google service account from {}",
                    config.google_auth_file
                )
            })?;

        Ok(Self::new(
            Arc::new(LandClientAdapter::new(Arc::new(LandClient::new()))),
            Arc::new(GoogleSheetAdapter::new(
                Arc::new(sheets),
                config.google_sheet_id.clone(),
                config.complex_list_sheet.clone(),
                config.summary_sheet.clone(),
            )),
            Arc::new(PostgresListingStore::new(pool)),
            Arc::new(TelegramNotifier::from_parts(
                config.telegram_bot_token.clone(),
                config.telegram_chat_id.clone(),
            )),
            config.credentials.clone(),
            CollectorSettings::default(),
        ))
    }
}

/// Connect to Postgres and bring the schema up to date.
pub async fn connect_database(database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_targets_keeps_first_occurrence() {
        let targets = dedup_targets(
            ["101", "202", "101", " 303 ", "", "202"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(targets, vec!["101", "202", "303"]);
    }

    #[tokio::test]
    async fn test_unconfigured_telegram_is_silent() {
        let notifier = TelegramNotifier::from_parts(Some("token".to_string()), None);
        assert!(notifier.0.is_none());
        notifier.notify("hello").await;
    }
}
