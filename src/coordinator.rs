//! # Lazy Search Coordinator Module
//!
//! ## Purpose
//! Owns the search worker handle, triggers corpus warming only when search
//! is first opened, debounces query input, and discards stale in-flight
//! responses so that only the latest query's results ever become visible.
//!
//! ## State Machine
//! `Closed -> LoadingCorpus -> Idle <-> Searching`, with `close_search`
//! returning to `Closed` from anywhere. The warmed corpus is retained across
//! close/reopen.
//!
//! ## Ordering
//! Every dispatch takes the next value of a monotonic sequence counter; a
//! response is applied only while its sequence number is still the latest.
//! The worker itself is never aborted mid-scan, its reply is simply ignored.
//! A dispatch that receives no reply within the timeout resolves back to
//! idle without an error state.

use crate::config::SearchConfig;
use crate::corpus::FlattenedVerse;
use crate::errors::Result;
use crate::loader::CorpusLoader;
use crate::search::SearchFilters;
use crate::utils::retry_with_backoff;
use crate::worker::{SearchRequest, SearchResponse, SearchWorker};
use crate::BOOK_COUNT;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Search view lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Search view not open
    Closed,
    /// First open is warming the corpus into memory
    LoadingCorpus,
    /// Open and waiting for input
    Idle,
    /// A query is dispatched and awaiting results
    Searching,
}

struct Inner {
    state: SearchState,
    query: String,
    filters: SearchFilters,
    results: Vec<FlattenedVerse>,
    debounce: Option<JoinHandle<()>>,
    warm: Option<JoinHandle<()>>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: SearchState::Closed,
            query: String::new(),
            filters: SearchFilters::default(),
            results: Vec::new(),
            debounce: None,
            warm: None,
        }
    }
}

struct Shared {
    loader: Arc<CorpusLoader>,
    worker: SearchWorker,
    config: SearchConfig,
    seq: AtomicU64,
    inner: Mutex<Inner>,
}

/// Debounced, last-query-wins front end over the search worker
pub struct SearchCoordinator {
    shared: Arc<Shared>,
}

impl SearchCoordinator {
    /// Create the coordinator and spawn its worker thread
    pub fn new(loader: Arc<CorpusLoader>, config: SearchConfig) -> Result<Self> {
        let worker = SearchWorker::spawn(config.max_results)?;
        Ok(Self {
            shared: Arc::new(Shared {
                loader,
                worker,
                config,
                seq: AtomicU64::new(0),
                inner: Mutex::new(Inner::default()),
            }),
        })
    }

    /// Open the search view, warming the corpus on first use
    pub fn open_search(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.state != SearchState::Closed {
            return;
        }

        if self.shared.loader.resident_count() == BOOK_COUNT {
            inner.state = SearchState::Idle;
            return;
        }

        inner.state = SearchState::LoadingCorpus;

        // A warm task from a previous open may still be running
        let warm_running = inner
            .warm
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false);
        if warm_running {
            return;
        }

        let shared = Arc::clone(&self.shared);
        inner.warm = Some(tokio::spawn(async move {
            let resident = shared.loader.warm_all().await;
            tracing::info!("Search corpus ready ({}/{} books)", resident, BOOK_COUNT);
            let mut inner = shared.inner.lock();
            if inner.state == SearchState::LoadingCorpus {
                inner.state = SearchState::Idle;
            }
        }));
    }

    /// Close the search view, clearing query and results.
    ///
    /// Books already warmed stay resident so reopening is cheap.
    pub fn close_search(&self) {
        // Invalidate any in-flight response before touching state
        self.shared.seq.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.shared.inner.lock();
        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        inner.query.clear();
        inner.results.clear();
        inner.state = SearchState::Closed;
    }

    /// Update the query text, debounced before dispatch
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        let mut inner = self.shared.inner.lock();
        if inner.state == SearchState::Closed {
            return;
        }

        inner.query = text.clone();
        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }

        if text.trim().is_empty() {
            // Empty query short-circuits without touching the worker
            self.shared.seq.fetch_add(1, Ordering::SeqCst);
            inner.results.clear();
            if inner.state == SearchState::Searching {
                inner.state = SearchState::Idle;
            }
            return;
        }

        self.shared.schedule_dispatch(&mut inner);
    }

    /// Update the filters, re-dispatching the current query if any
    pub fn set_filters(&self, filters: SearchFilters) {
        let mut inner = self.shared.inner.lock();
        inner.filters = filters;
        if inner.state == SearchState::Closed || inner.query.trim().is_empty() {
            return;
        }
        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        self.shared.schedule_dispatch(&mut inner);
    }

    /// Latest applied result set
    pub fn results(&self) -> Vec<FlattenedVerse> {
        self.shared.inner.lock().results.clone()
    }

    /// Whether the coordinator is loading the corpus or awaiting results
    pub fn is_searching(&self) -> bool {
        matches!(
            self.shared.inner.lock().state,
            SearchState::LoadingCorpus | SearchState::Searching
        )
    }

    /// Current lifecycle state
    pub fn state(&self) -> SearchState {
        self.shared.inner.lock().state
    }

    /// Current query text
    pub fn query(&self) -> String {
        self.shared.inner.lock().query.clone()
    }

    /// Current filters
    pub fn filters(&self) -> SearchFilters {
        self.shared.inner.lock().filters.clone()
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock();
        if let Some(handle) = inner.debounce.take() {
            handle.abort();
        }
        if let Some(handle) = inner.warm.take() {
            handle.abort();
        }
    }
}

impl Shared {
    /// Arm the debounce timer; the dispatch runs after the quiet period
    fn schedule_dispatch(self: &Arc<Self>, inner: &mut Inner) {
        let shared = Arc::clone(self);
        let debounce = Duration::from_millis(self.config.debounce_ms);
        inner.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            Shared::dispatch(shared).await;
        }));
    }

    /// Run one debounced search round trip
    async fn dispatch(shared: Arc<Shared>) {
        // The corpus may still be warming; wait with a bounded backoff
        // instead of rescheduling unboundedly
        let ready = retry_with_backoff(
            shared.config.corpus_wait_attempts,
            Duration::from_millis(shared.config.corpus_wait_initial_delay_ms),
            || async {
                if shared.inner.lock().state == SearchState::LoadingCorpus {
                    Err("corpus still loading")
                } else {
                    Ok(())
                }
            },
        )
        .await;

        let seq = shared.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let (query, filters) = {
            let mut inner = shared.inner.lock();
            if inner.state == SearchState::Closed {
                return;
            }
            if ready.is_err() {
                tracing::warn!("Corpus not ready in time, degrading to empty results");
                inner.results.clear();
                return;
            }
            inner.state = SearchState::Searching;
            (inner.query.clone(), inner.filters.clone())
        };

        let verses = Arc::new(shared.loader.flattened_corpus());
        let (reply_tx, reply_rx) = oneshot::channel();
        let submitted = shared.worker.submit(SearchRequest {
            seq,
            verses,
            query,
            filters,
            reply: reply_tx,
        });
        if submitted.is_err() {
            tracing::warn!("Search worker unavailable, resolving to empty results");
            shared.finish_soft(seq, true);
            return;
        }

        let timeout = Duration::from_millis(shared.config.timeout_ms);
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(response)) => shared.apply_response(response),
            Ok(Err(_)) => {
                tracing::warn!("Search {} reply channel closed", seq);
                shared.finish_soft(seq, true);
            }
            Err(_) => {
                // Soft failure: keep the last-known results
                tracing::warn!("Search {} timed out after {:?}", seq, timeout);
                shared.finish_soft(seq, false);
            }
        }
    }

    /// Apply a worker response under the last-query-wins rule
    fn apply_response(&self, response: SearchResponse) {
        let latest = self.seq.load(Ordering::SeqCst);
        if response.seq != latest {
            tracing::debug!(
                "Discarding stale search response (seq {}, latest {})",
                response.seq,
                latest
            );
            return;
        }

        let mut inner = self.inner.lock();
        if inner.state == SearchState::Closed {
            return;
        }
        inner.results = response.results;
        inner.state = SearchState::Idle;
    }

    /// Resolve a failed dispatch back to idle if it is still the latest
    fn finish_soft(&self, seq: u64, clear_results: bool) {
        if self.seq.load(Ordering::SeqCst) != seq {
            return;
        }
        let mut inner = self.inner.lock();
        if clear_results {
            inner.results.clear();
        }
        if inner.state == SearchState::Searching {
            inner.state = SearchState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PersistentCache;
    use crate::config::CacheConfig;
    use crate::store::testing::MockBookStore;
    use crate::worker::SearchResponse;
    use crate::BOOK_IDS;
    use tempfile::TempDir;

    fn fast_config() -> SearchConfig {
        SearchConfig {
            debounce_ms: 20,
            timeout_ms: 2_000,
            max_results: 50,
            corpus_wait_attempts: 10,
            corpus_wait_initial_delay_ms: 10,
        }
    }

    fn build(store: MockBookStore) -> (SearchCoordinator, Arc<CorpusLoader>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(
            PersistentCache::open(CacheConfig {
                db_path: dir.path().join("cache.db"),
                ttl_days: 7,
                enable_compression: true,
            })
            .unwrap(),
        );
        let loader = Arc::new(CorpusLoader::new(Arc::new(store), cache).unwrap());
        let coordinator = SearchCoordinator::new(Arc::clone(&loader), fast_config()).unwrap();
        (coordinator, loader, dir)
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_open_warms_corpus_then_idles() {
        let (coordinator, loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        assert_eq!(coordinator.state(), SearchState::Closed);

        coordinator.open_search();
        assert!(coordinator.is_searching());

        wait_until(|| coordinator.state() == SearchState::Idle).await;
        assert_eq!(loader.resident_count(), 5);
    }

    #[tokio::test]
    async fn test_open_with_partial_corpus_still_idles() {
        let (coordinator, loader, _dir) =
            build(MockBookStore::with_books(&BOOK_IDS).failing(&[2, 5]));

        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;
        assert_eq!(loader.resident_count(), 3);
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let (coordinator, _loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;

        coordinator.set_query("mountain");
        wait_until(|| !coordinator.results().is_empty()).await;

        let results = coordinator.results();
        assert!(results.iter().all(|v| v.text.contains("mountain")));
        assert!(!coordinator.is_searching());
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let (coordinator, _loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;

        coordinator.set_query("light");
        wait_until(|| !coordinator.results().is_empty()).await;

        // Whitespace-only query clears immediately, with no dispatch to wait on
        coordinator.set_query("   ");
        assert!(coordinator.results().is_empty());
        assert_eq!(coordinator.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_rapid_queries_apply_only_the_last() {
        let (coordinator, _loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;

        // Both setters land within one debounce window; only the second
        // query may ever produce visible results
        coordinator.set_query("mountain");
        coordinator.set_query("waters");
        wait_until(|| !coordinator.results().is_empty()).await;

        let results = coordinator.results();
        assert!(results.iter().all(|v| v.text.contains("waters")));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (coordinator, _loader, _dir) = build(MockBookStore::with_books(&[1]));
        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;

        let shared = &coordinator.shared;
        shared.seq.store(2, Ordering::SeqCst);

        let stale = vec![crate::corpus::flatten_book(
            &crate::corpus::fixtures::sample_book(1),
        )[0]
        .clone()];
        shared.apply_response(SearchResponse {
            seq: 1,
            results: stale,
        });
        assert!(coordinator.results().is_empty());

        let fresh = vec![crate::corpus::flatten_book(
            &crate::corpus::fixtures::sample_book(1),
        )[1]
        .clone()];
        shared.apply_response(SearchResponse {
            seq: 2,
            results: fresh.clone(),
        });
        assert_eq!(coordinator.results(), fresh);
    }

    #[tokio::test]
    async fn test_filters_rescope_results() {
        let (coordinator, _loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;

        coordinator.set_query("light");
        wait_until(|| !coordinator.results().is_empty()).await;

        coordinator.set_filters(SearchFilters {
            book: Some(3),
            ..SearchFilters::default()
        });
        wait_until(|| {
            let results = coordinator.results();
            !results.is_empty() && results.iter().all(|v| v.book == 3)
        })
        .await;
    }

    #[tokio::test]
    async fn test_close_resets_but_keeps_corpus() {
        let (coordinator, loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        coordinator.open_search();
        wait_until(|| coordinator.state() == SearchState::Idle).await;

        coordinator.set_query("light");
        wait_until(|| !coordinator.results().is_empty()).await;

        coordinator.close_search();
        assert_eq!(coordinator.state(), SearchState::Closed);
        assert!(coordinator.query().is_empty());
        assert!(coordinator.results().is_empty());

        // The warmed corpus survives, so reopening skips LoadingCorpus
        assert_eq!(loader.resident_count(), 5);
        coordinator.open_search();
        assert_eq!(coordinator.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_query_ignored_while_closed() {
        let (coordinator, _loader, _dir) = build(MockBookStore::with_books(&BOOK_IDS));
        coordinator.set_query("light");
        assert!(coordinator.query().is_empty());
        assert_eq!(coordinator.state(), SearchState::Closed);
    }
}
