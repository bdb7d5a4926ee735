//! Sync engine state machine.
//!
//! A pass walks the sync endpoint page by page, folding every page into a
//! snapshot that belongs to the pass alone. Only a pass that reaches a page
//! with a next sync token publishes its snapshot; any failure drops it and
//! leaves the previously completed snapshot as it was.

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult};
use crate::executor::RequestExecutor;
use parking_lot::RwLock;
use spacekit_model::{Asset, Entry, LocalizationContext, Resource};
use spacekit_protocol::{Request, SyncFilter, SyncRequest, SyncToken};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No pass has completed yet.
    Idle,
    /// An initial pass is running.
    InitialSyncInProgress,
    /// An incremental pass is running.
    IncrementalSyncInProgress,
    /// The last pass completed.
    SyncComplete,
}

impl SyncState {
    /// Returns true while a pass is running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::InitialSyncInProgress | SyncState::IncrementalSyncInProgress
        )
    }

    /// Returns true if a new pass may start.
    pub fn can_start_sync(&self) -> bool {
        !self.is_active()
    }
}

/// Statistics about sync passes.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Passes that completed.
    pub passes_completed: u64,
    /// Pages fetched by completed passes.
    pub pages_fetched: u64,
    /// Items merged by completed passes.
    pub items_merged: u64,
    /// Items that could not be decoded and were left out.
    pub skipped_items: u64,
    /// Whole-pass retries.
    pub retries: u64,
    /// When the last pass completed.
    pub last_sync_time: Option<Instant>,
    /// Message of the last failed pass, cleared on success.
    pub last_error: Option<String>,
}

/// Ids touched by the pass that produced a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncChanges {
    /// Entries created or updated.
    pub upserted_entries: BTreeSet<String>,
    /// Assets created or updated.
    pub upserted_assets: BTreeSet<String>,
    /// Entries deleted.
    pub deleted_entries: BTreeSet<String>,
    /// Assets deleted.
    pub deleted_assets: BTreeSet<String>,
}

impl SyncChanges {
    /// Returns true when the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.upserted_entries.is_empty()
            && self.upserted_assets.is_empty()
            && self.deleted_entries.is_empty()
            && self.deleted_assets.is_empty()
    }
}

/// A completed sync snapshot.
#[derive(Debug, Clone, Default)]
pub struct SyncSpace {
    entries: HashMap<String, Entry>,
    assets: HashMap<String, Asset>,
    deleted_entry_ids: HashSet<String>,
    deleted_asset_ids: HashSet<String>,
    sync_token: Option<SyncToken>,
    has_more_pages: bool,
    changes: SyncChanges,
}

impl SyncSpace {
    /// Entries by id.
    pub fn entries(&self) -> &HashMap<String, Entry> {
        &self.entries
    }

    /// Assets by id.
    pub fn assets(&self) -> &HashMap<String, Asset> {
        &self.assets
    }

    /// One entry.
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// One asset.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    /// Entry ids reported deleted and not re-added as entries since.
    pub fn deleted_entry_ids(&self) -> &HashSet<String> {
        &self.deleted_entry_ids
    }

    /// Asset ids reported deleted and not re-added as assets since.
    pub fn deleted_asset_ids(&self) -> &HashSet<String> {
        &self.deleted_asset_ids
    }

    /// Returns true if `id` was reported deleted as either kind.
    pub fn is_deleted(&self, id: &str) -> bool {
        self.deleted_entry_ids.contains(id) || self.deleted_asset_ids.contains(id)
    }

    /// Token for the next incremental pass.
    pub fn sync_token(&self) -> Option<&SyncToken> {
        self.sync_token.as_ref()
    }

    /// Returns true if pages were still pending. Never set on a snapshot a
    /// caller can observe.
    pub fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    /// What the pass that produced this snapshot changed.
    pub fn changes(&self) -> &SyncChanges {
        &self.changes
    }

    /// Runs an incremental pass from this snapshot.
    ///
    /// Returns a new snapshot; `self` is not modified.
    pub async fn sync<E: RequestExecutor>(
        &self,
        engine: &SyncEngine<E>,
    ) -> ClientResult<Arc<SyncSpace>> {
        engine.sync(self).await
    }

    /// Folds one decoded item into the snapshot. The most recent verdict
    /// on an id wins; an upsert only clears a deletion of its own kind.
    fn merge(&mut self, resource: Resource) {
        match resource {
            Resource::Entry(entry) => {
                let id = entry.id().to_string();
                self.deleted_entry_ids.remove(&id);
                self.changes.deleted_entries.remove(&id);
                self.changes.upserted_entries.insert(id.clone());
                self.entries.insert(id, entry);
            }
            Resource::Asset(asset) => {
                let id = asset.id().to_string();
                self.deleted_asset_ids.remove(&id);
                self.changes.deleted_assets.remove(&id);
                self.changes.upserted_assets.insert(id.clone());
                self.assets.insert(id, asset);
            }
            Resource::DeletedEntry(marker) => {
                let id = marker.id().to_string();
                self.remove(&id);
                self.changes.upserted_entries.remove(&id);
                self.changes.deleted_entries.insert(id.clone());
                self.deleted_entry_ids.insert(id);
            }
            Resource::DeletedAsset(marker) => {
                let id = marker.id().to_string();
                self.remove(&id);
                self.changes.upserted_assets.remove(&id);
                self.changes.deleted_assets.insert(id.clone());
                self.deleted_asset_ids.insert(id);
            }
        }
    }

    fn remove(&mut self, id: &str) {
        self.entries.remove(id);
        self.assets.remove(id);
    }
}

/// Counters of one pass, committed to [`SyncStats`] on success.
#[derive(Debug, Default)]
struct PassTally {
    pages: u64,
    merged: u64,
    skipped: u64,
}

/// Handle that cancels the engine's running pass from anywhere.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation. Takes effect before the next page request.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Restores the resting state if a pass ends without committing.
struct PassGuard<'a> {
    state: &'a RwLock<SyncState>,
    resting: SyncState,
    committed: bool,
}

impl PassGuard<'_> {
    fn commit(mut self) {
        *self.state.write() = SyncState::SyncComplete;
        self.committed = true;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            *self.state.write() = self.resting;
        }
    }
}

/// The sync engine pulls a space through the sync endpoint.
///
/// One pass runs at a time. The latest completed snapshot is kept and can
/// be read at any time with [`SyncEngine::latest`].
pub struct SyncEngine<E: RequestExecutor> {
    executor: Arc<E>,
    context: Arc<LocalizationContext>,
    retry: RetryConfig,
    preview: bool,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    latest: RwLock<Option<Arc<SyncSpace>>>,
    cancelled: Arc<AtomicBool>,
}

impl<E: RequestExecutor> SyncEngine<E> {
    /// Creates a new sync engine.
    pub fn new(executor: E, context: Arc<LocalizationContext>) -> Self {
        Self::from_shared(Arc::new(executor), context)
    }

    /// Creates an engine over a shared executor.
    pub fn from_shared(executor: Arc<E>, context: Arc<LocalizationContext>) -> Self {
        Self {
            executor,
            context,
            retry: RetryConfig::default(),
            preview: false,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            latest: RwLock::new(None),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sets the retry configuration used by the `*_with_retry` methods.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Marks the executor as talking to the preview API.
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// The latest completed snapshot.
    pub fn latest(&self) -> Option<Arc<SyncSpace>> {
        self.latest.read().clone()
    }

    /// The localization context resources are built with.
    pub fn context(&self) -> &Arc<LocalizationContext> {
        &self.context
    }

    /// The executor pages are requested through.
    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Cancels any ongoing pass.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// A handle that cancels this engine's passes.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancelled))
    }

    fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    fn check_cancelled(&self) -> ClientResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Performs an initial sync.
    pub async fn initial_sync(&self, filter: SyncFilter) -> ClientResult<Arc<SyncSpace>> {
        self.run_initial(filter, true).await
    }

    /// Performs an incremental sync from a completed snapshot.
    ///
    /// `previous` is left untouched; the result is a new snapshot.
    pub async fn sync(&self, previous: &SyncSpace) -> ClientResult<Arc<SyncSpace>> {
        self.run_incremental(previous, true).await
    }

    /// Performs an incremental sync from a persisted token into an empty
    /// snapshot.
    pub async fn resume(&self, token: SyncToken) -> ClientResult<Arc<SyncSpace>> {
        self.run_pass(
            SyncSpace::default(),
            SyncRequest::Continue(token),
            SyncState::IncrementalSyncInProgress,
            true,
        )
        .await
    }

    /// Performs an initial sync, rerunning the pass on retryable errors.
    pub async fn initial_sync_with_retry(
        &self,
        filter: SyncFilter,
    ) -> ClientResult<Arc<SyncSpace>> {
        self.with_retry_loop(|fresh| self.run_initial(filter.clone(), fresh)).await
    }

    /// Performs an incremental sync, rerunning the pass on retryable errors.
    pub async fn sync_with_retry(&self, previous: &SyncSpace) -> ClientResult<Arc<SyncSpace>> {
        self.with_retry_loop(|fresh| self.run_incremental(previous, fresh)).await
    }

    async fn with_retry_loop<F, Fut>(&self, mut run: F) -> ClientResult<Arc<SyncSpace>>
    where
        F: FnMut(bool) -> Fut,
        Fut: Future<Output = ClientResult<Arc<SyncSpace>>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.retry.delay_for_attempt(attempt);
                tokio::time::sleep(delay).await;
                self.stats.write().retries += 1;
                self.check_cancelled()?;
            }

            match run(attempt == 0).await {
                Ok(space) => return Ok(space),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    warn!(attempt, error = %e, "sync pass failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn run_initial(&self, filter: SyncFilter, fresh: bool) -> ClientResult<Arc<SyncSpace>> {
        self.run_pass(
            SyncSpace::default(),
            SyncRequest::Initial(filter),
            SyncState::InitialSyncInProgress,
            fresh,
        )
        .await
    }

    async fn run_incremental(
        &self,
        previous: &SyncSpace,
        fresh: bool,
    ) -> ClientResult<Arc<SyncSpace>> {
        let token = previous.sync_token.clone().ok_or_else(|| {
            ClientError::InvalidStateTransition {
                from: "snapshot without sync token".into(),
                to: format!("{:?}", SyncState::IncrementalSyncInProgress),
            }
        })?;

        let mut space = previous.clone();
        space.changes = SyncChanges::default();
        self.run_pass(
            space,
            SyncRequest::Continue(token),
            SyncState::IncrementalSyncInProgress,
            fresh,
        )
        .await
    }

    /// Claims the engine for a pass. A fresh pass clears a cancel request
    /// left over from an earlier pass, and only once the claim succeeds;
    /// retry attempts keep it.
    fn begin_pass(&self, target: SyncState, fresh: bool) -> ClientResult<PassGuard<'_>> {
        if self.preview {
            return Err(ClientError::PreviewApiDoesNotSupportSync);
        }

        let mut state = self.state.write();
        if !state.can_start_sync() {
            return Err(ClientError::InvalidStateTransition {
                from: format!("{:?}", *state),
                to: format!("{target:?}"),
            });
        }
        let resting = *state;
        *state = target;
        if fresh {
            self.reset_cancel();
        }

        Ok(PassGuard {
            state: &self.state,
            resting,
            committed: false,
        })
    }

    async fn run_pass(
        &self,
        space: SyncSpace,
        first: SyncRequest,
        target: SyncState,
        fresh: bool,
    ) -> ClientResult<Arc<SyncSpace>> {
        let guard = self.begin_pass(target, fresh)?;
        let start = Instant::now();
        info!(state = ?target, "sync pass started");

        let mut tally = PassTally::default();
        match self.fetch_pages(space, first, &mut tally).await {
            Ok(space) => {
                let space = Arc::new(space);
                *self.latest.write() = Some(Arc::clone(&space));
                {
                    let mut stats = self.stats.write();
                    stats.passes_completed += 1;
                    stats.pages_fetched += tally.pages;
                    stats.items_merged += tally.merged;
                    stats.skipped_items += tally.skipped;
                    stats.last_sync_time = Some(Instant::now());
                    stats.last_error = None;
                }
                guard.commit();
                info!(
                    pages = tally.pages,
                    items = tally.merged,
                    skipped = tally.skipped,
                    entries = space.entries.len(),
                    assets = space.assets.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "sync pass completed"
                );
                Ok(space)
            }
            Err(e) => {
                warn!(pages = tally.pages, error = %e, "sync pass aborted");
                self.stats.write().last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_pages(
        &self,
        mut space: SyncSpace,
        first: SyncRequest,
        tally: &mut PassTally,
    ) -> ClientResult<SyncSpace> {
        let mut next = first;
        space.has_more_pages = true;

        loop {
            self.check_cancelled()?;

            let page = self.executor.execute(&Request::sync(&next)).await?;
            tally.pages += 1;
            let item_count = page.items.len();

            for item in &page.items {
                match Resource::from_json(item, &self.context) {
                    Ok(resource) => {
                        space.merge(resource);
                        tally.merged += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping undecodable sync item");
                        tally.skipped += 1;
                    }
                }
            }

            debug!(
                page = tally.pages,
                items = item_count,
                has_next_page = page.next_page_token.is_some(),
                has_sync_token = page.next_sync_token.is_some(),
                "merged sync page"
            );

            match (page.next_page_token, page.next_sync_token) {
                (Some(token), _) => next = SyncRequest::Continue(token),
                (None, Some(token)) => {
                    space.sync_token = Some(token);
                    space.has_more_pages = false;
                    return Ok(space);
                }
                (None, None) => return Err(ClientError::MissingContinuation),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockExecutor;
    use serde_json::json;
    use spacekit_model::Locale;
    use spacekit_protocol::ResponsePage;

    fn context() -> Arc<LocalizationContext> {
        Arc::new(LocalizationContext::new(vec![Locale::new("en-US").as_default()]).unwrap())
    }

    fn entry(id: &str) -> serde_json::Value {
        json!({ "sys": { "id": id, "type": "Entry" }, "fields": { "name": { "en-US": id } } })
    }

    #[test]
    fn sync_state_transitions() {
        assert!(SyncState::Idle.can_start_sync());
        assert!(SyncState::SyncComplete.can_start_sync());
        assert!(!SyncState::InitialSyncInProgress.can_start_sync());
        assert!(SyncState::IncrementalSyncInProgress.is_active());
    }

    #[test]
    fn merge_latest_verdict_wins() {
        let ctx = context();
        let mut space = SyncSpace::default();

        space.merge(Resource::from_json(&entry("e1"), &ctx).unwrap());
        space.merge(
            Resource::from_json(&json!({ "sys": { "id": "e1", "type": "DeletedEntry" } }), &ctx)
                .unwrap(),
        );
        assert!(space.entry("e1").is_none());
        assert!(space.deleted_entry_ids().contains("e1"));
        assert!(space.changes().upserted_entries.is_empty());

        space.merge(Resource::from_json(&entry("e1"), &ctx).unwrap());
        assert!(space.entry("e1").is_some());
        assert!(!space.is_deleted("e1"));
        assert!(space.changes().deleted_entries.is_empty());
    }

    #[test]
    fn upsert_keeps_deletion_of_other_kind() {
        let ctx = context();
        let mut space = SyncSpace::default();

        space.merge(
            Resource::from_json(&json!({ "sys": { "id": "x", "type": "DeletedAsset" } }), &ctx)
                .unwrap(),
        );
        space.merge(Resource::from_json(&entry("x"), &ctx).unwrap());

        assert!(space.entry("x").is_some());
        assert!(space.deleted_asset_ids().contains("x"));
        assert!(space.changes().deleted_assets.contains("x"));
        assert!(!space.deleted_entry_ids().contains("x"));
    }

    #[tokio::test]
    async fn pass_guard_restores_resting_state() {
        let executor = MockExecutor::new();
        executor.push_error(spacekit_protocol::SYNC_PATH, ClientError::Timeout);
        let engine = SyncEngine::new(executor, context());

        assert!(engine.initial_sync(SyncFilter::Everything).await.is_err());
        assert_eq!(engine.state(), SyncState::Idle);
        assert!(engine.stats().last_error.is_some());
    }

    #[tokio::test]
    async fn completed_pass_reports_stats() {
        let executor = MockExecutor::new();
        executor.push_sync_page(
            ResponsePage::new(vec![entry("a"), json!({ "bad": true })]).with_next_sync("t"),
        );
        let engine = SyncEngine::new(executor, context());

        let space = engine.initial_sync(SyncFilter::Everything).await.unwrap();
        assert!(!space.has_more_pages());

        let stats = engine.stats();
        assert_eq!(stats.passes_completed, 1);
        assert_eq!(stats.pages_fetched, 1);
        assert_eq!(stats.items_merged, 1);
        assert_eq!(stats.skipped_items, 1);
        assert!(stats.last_sync_time.is_some());
    }
}
