// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use land_client::{Article, ArticlePage, LandError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use super::{
    BaseListingSource, BaseListingStore, BaseNotifier, BaseTargetSheet, ListingWriter, ServerDeps,
};
use crate::common::Credential;
use crate::domains::collection::models::{NormalizedListing, SummaryRow};
use crate::domains::collection::CollectorSettings;

/// Build a raw article with the fields the collector cares about.
pub fn test_article(trade_type: &str, price: &str, floor_info: Option<&str>) -> Article {
    Article {
        article_name: Some("테스트단지".to_string()),
        real_estate_type_name: Some("아파트".to_string()),
        trade_type_name: Some(trade_type.to_string()),
        floor_info: floor_info.map(str::to_string),
        deal_or_warrant_prc: Some(price.to_string()),
        area_name: Some("84A".to_string()),
        area1: Some("112".to_string()),
        area2: Some("84".to_string()),
        direction: Some("남향".to_string()),
        building_name: Some("101동".to_string()),
    }
}

/// Build a page from articles.
pub fn test_page(articles: Vec<Article>, has_more: bool) -> ArticlePage {
    ArticlePage {
        article_list: articles,
        is_more_data: has_more,
    }
}

// =============================================================================
// Mock Listing Source
// =============================================================================

/// Arguments captured from a fetch_page call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub target: String,
    pub credential_id: String,
    pub page: u32,
}

enum ScriptedFetch {
    Page(ArticlePage),
    Failure(String),
    Rejected(u16),
    Panic(String),
}

/// Scripted page source. Each target replays its queued responses in order;
/// once a target's script is exhausted (or was never set) it answers with an
/// empty last page.
#[derive(Default)]
pub struct MockListingSource {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedFetch>>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MockListingSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, target: &str, fetch: ScriptedFetch) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .push_back(fetch);
        self
    }

    /// Queue a successful page for a target.
    pub fn with_page(self, target: &str, page: ArticlePage) -> Self {
        self.push(target, ScriptedFetch::Page(page))
    }

    /// Queue a failing fetch for a target.
    pub fn with_failure(self, target: &str, message: &str) -> Self {
        self.push(target, ScriptedFetch::Failure(message.to_string()))
    }

    /// Queue an API error with the given HTTP status, as the real client
    /// reports it.
    pub fn with_rejection(self, target: &str, status: u16) -> Self {
        self.push(target, ScriptedFetch::Rejected(status))
    }

    /// Queue a fetch that panics inside the worker task.
    pub fn with_panic(self, target: &str, message: &str) -> Self {
        self.push(target, ScriptedFetch::Panic(message.to_string()))
    }

    /// Get all fetch calls in the order they happened
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Fetch calls made for one target
    pub fn calls_for(&self, target: &str) -> Vec<FetchCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.target == target)
            .collect()
    }
}

#[async_trait]
impl BaseListingSource for MockListingSource {
    async fn fetch_page(
        &self,
        target: &str,
        credential: &Credential,
        page: u32,
    ) -> Result<ArticlePage> {
        self.calls.lock().unwrap().push(FetchCall {
            target: target.to_string(),
            credential_id: credential.id.clone(),
            page,
        });

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(target)
            .and_then(|script| script.pop_front());

        match next {
            Some(ScriptedFetch::Page(page)) => Ok(page),
            Some(ScriptedFetch::Failure(message)) => Err(anyhow!(message)),
            Some(ScriptedFetch::Rejected(status)) => Err(LandError::Api {
                status,
                message: "rejected".to_string(),
            }
            .into()),
            Some(ScriptedFetch::Panic(message)) => panic!("{}", message),
            None => Ok(ArticlePage::default()),
        }
    }
}

// =============================================================================
// Mock Target Sheet
// =============================================================================

#[derive(Default)]
pub struct MockTargetSheet {
    targets: Vec<String>,
    fail_read: bool,
    written: Mutex<Vec<Vec<SummaryRow>>>,
}

impl MockTargetSheet {
    pub fn new(targets: &[&str]) -> Self {
        Self {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_read: true,
            ..Default::default()
        }
    }

    /// Every summary written, one entry per clear_and_write_summary call
    pub fn written(&self) -> Vec<Vec<SummaryRow>> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseTargetSheet for MockTargetSheet {
    async fn read_targets(&self) -> Result<Vec<String>> {
        if self.fail_read {
            return Err(anyhow!("sheet unavailable"));
        }
        Ok(self.targets.clone())
    }

    async fn clear_and_write_summary(&self, rows: &[SummaryRow]) -> Result<()> {
        self.written.lock().unwrap().push(rows.to_vec());
        Ok(())
    }
}

// =============================================================================
// Memory Listing Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    inserted: Vec<NormalizedListing>,
    batches: Vec<(String, usize)>,
    writers_acquired: usize,
    writers_released: usize,
}

/// In-memory store that records every batch.
///
/// Inserting a batch for a target listed in `fail_inserts_for` fails, which
/// simulates a storage write error for that target only.
#[derive(Default)]
pub struct MemoryListingStore {
    state: Arc<Mutex<StoreState>>,
    fail_inserts_for: HashSet<String>,
    fail_writer: bool,
    summary: Vec<SummaryRow>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_insert(mut self, target: &str) -> Self {
        self.fail_inserts_for.insert(target.to_string());
        self
    }

    /// Make writer() fail, as if the pool could not hand out a connection.
    pub fn without_connections(mut self) -> Self {
        self.fail_writer = true;
        self
    }

    pub fn with_summary(mut self, rows: Vec<SummaryRow>) -> Self {
        self.summary = rows;
        self
    }

    pub fn inserted(&self) -> Vec<NormalizedListing> {
        self.state.lock().unwrap().inserted.clone()
    }

    /// (target, row count) for every successful batch, in insertion order
    pub fn batches(&self) -> Vec<(String, usize)> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn writers_acquired(&self) -> usize {
        self.state.lock().unwrap().writers_acquired
    }

    pub fn writers_released(&self) -> usize {
        self.state.lock().unwrap().writers_released
    }
}

pub struct MemoryListingWriter {
    state: Arc<Mutex<StoreState>>,
    fail_inserts_for: HashSet<String>,
}

impl Drop for MemoryListingWriter {
    fn drop(&mut self) {
        self.state.lock().unwrap().writers_released += 1;
    }
}

#[async_trait]
impl ListingWriter for MemoryListingWriter {
    async fn insert_listings(&mut self, batch: &[NormalizedListing]) -> Result<u64> {
        let Some(first) = batch.first() else {
            return Ok(0);
        };

        if self.fail_inserts_for.contains(&first.complex_no) {
            return Err(anyhow!("insert failed for {}", first.complex_no));
        }

        let mut state = self.state.lock().unwrap();
        state.inserted.extend_from_slice(batch);
        state.batches.push((first.complex_no.clone(), batch.len()));
        Ok(batch.len() as u64)
    }
}

#[async_trait]
impl BaseListingStore for MemoryListingStore {
    async fn writer(&self) -> Result<Box<dyn ListingWriter>> {
        if self.fail_writer {
            return Err(anyhow!("connection pool exhausted"));
        }
        self.state.lock().unwrap().writers_acquired += 1;
        Ok(Box::new(MemoryListingWriter {
            state: self.state.clone(),
            fail_inserts_for: self.fail_inserts_for.clone(),
        }))
    }

    async fn query_summary(&self) -> Result<Vec<SummaryRow>> {
        Ok(self.summary.clone())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Mock Notifier
// =============================================================================

#[derive(Default)]
pub struct MockNotifier {
    messages: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Check if any message contains the given text
    pub fn was_notified(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock services plus the ServerDeps wired from them.
///
/// Keeps typed handles so tests can inspect calls after a run.
pub struct TestDependencies {
    pub source: Arc<MockListingSource>,
    pub sheet: Arc<MockTargetSheet>,
    pub store: Arc<MemoryListingStore>,
    pub notifier: Arc<MockNotifier>,
    pub credentials: Vec<Credential>,
    pub settings: CollectorSettings,
}

impl TestDependencies {
    /// Defaults: no targets, no scripted pages, one credential, no delays.
    pub fn new() -> Self {
        Self {
            source: Arc::new(MockListingSource::new()),
            sheet: Arc::new(MockTargetSheet::default()),
            store: Arc::new(MemoryListingStore::new()),
            notifier: Arc::new(MockNotifier::new()),
            credentials: test_credentials(1),
            settings: CollectorSettings::default()
                .with_page_delay(std::time::Duration::ZERO)
                .with_error_cooldown(std::time::Duration::ZERO)
                .with_target_delay(std::time::Duration::ZERO),
        }
    }

    pub fn with_source(mut self, source: MockListingSource) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_sheet(mut self, sheet: MockTargetSheet) -> Self {
        self.sheet = Arc::new(sheet);
        self
    }

    pub fn with_store(mut self, store: MemoryListingStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_credentials(mut self, count: usize) -> Self {
        self.credentials = test_credentials(count);
        self
    }

    pub fn with_settings(mut self, settings: CollectorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.source.clone(),
            self.sheet.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.credentials.clone(),
            self.settings.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` credentials named `worker-1`, `worker-2`, ...
pub fn test_credentials(count: usize) -> Vec<Credential> {
    (1..=count)
        .map(|i| {
            Credential::new(
                format!("worker-{}", i),
                format!("Bearer token-{}", i),
                format!("NNB=cookie-{}", i),
            )
        })
        .collect()
}
