//! # Search Worker Module
//!
//! ## Purpose
//! Runs the search engine on a dedicated OS thread so that scanning a
//! multi-thousand-verse corpus never blocks the caller's executor.
//!
//! ## Message Contract
//! Requests carry a monotonic sequence number, the flattened corpus, the
//! query, and the filters; replies echo the sequence number with the ranked
//! result list. Requests are processed strictly in submission order. The
//! worker never touches cache state. Dropping the worker closes the request
//! channel and the thread exits on its own.

use crate::corpus::FlattenedVerse;
use crate::errors::{ReaderError, Result};
use crate::search::{rank_verses, SearchFilters};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One search invocation
pub struct SearchRequest {
    pub seq: u64,
    pub verses: Arc<Vec<FlattenedVerse>>,
    pub query: String,
    pub filters: SearchFilters,
    pub reply: oneshot::Sender<SearchResponse>,
}

/// Ranked reply for one request
#[derive(Debug)]
pub struct SearchResponse {
    pub seq: u64,
    pub results: Vec<FlattenedVerse>,
}

/// Handle to the dedicated search thread
pub struct SearchWorker {
    tx: mpsc::UnboundedSender<SearchRequest>,
}

impl SearchWorker {
    /// Spawn the worker thread
    pub fn spawn(max_results: usize) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<SearchRequest>();

        std::thread::Builder::new()
            .name("search-worker".to_string())
            .spawn(move || {
                while let Some(request) = rx.blocking_recv() {
                    let results =
                        rank_verses(&request.verses, &request.query, &request.filters, max_results);
                    tracing::debug!(
                        "Search {} scanned {} verses, {} results",
                        request.seq,
                        request.verses.len(),
                        results.len()
                    );
                    // The receiver may be gone if the query was superseded
                    let _ = request.reply.send(SearchResponse {
                        seq: request.seq,
                        results,
                    });
                }
                tracing::debug!("Search worker thread exiting");
            })?;

        Ok(Self { tx })
    }

    /// Queue a request for processing
    pub fn submit(&self, request: SearchRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| ReaderError::WorkerUnavailable {
                reason: "request channel closed".to_string(),
            })
    }
}
