//! # Background Prefetch Module
//!
//! ## Purpose
//! Opportunistically warms the books the user has not opened yet, without
//! competing with interactive loads.
//!
//! ## Behavior
//! - Waits a settle delay after spawn before doing anything.
//! - Iterates the book identifiers in ascending order, skipping any already
//!   resident in memory, with a pacing delay between loads.
//! - Every load goes through the cache orchestrator, so the persistent tier
//!   is consulted before the document store and both tiers are populated.
//! - A single book's failure is logged and the loop continues; this
//!   scheduler never surfaces errors.
//! - The returned handle cancels the task on `cancel()` or on drop, so no
//!   timer outlives the owning view.

use crate::config::PrefetchConfig;
use crate::loader::CorpusLoader;
use crate::BOOK_IDS;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Paced background warmer for the remaining books
pub struct PrefetchScheduler {
    loader: Arc<CorpusLoader>,
    config: PrefetchConfig,
}

/// Handle to a running prefetch task; aborts the task when dropped
pub struct PrefetchHandle {
    handle: JoinHandle<()>,
}

impl PrefetchScheduler {
    pub fn new(loader: Arc<CorpusLoader>, config: PrefetchConfig) -> Self {
        Self { loader, config }
    }

    /// Spawn the prefetch task onto the current runtime
    pub fn spawn(&self) -> PrefetchHandle {
        let loader = Arc::clone(&self.loader);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(config.settle_delay_ms)).await;
            tracing::info!("Starting background prefetch");

            for &book_id in BOOK_IDS.iter() {
                if loader.resident(book_id) {
                    tracing::debug!("Book {} already resident, skipping prefetch", book_id);
                    continue;
                }

                // Pace loads so prefetch never bursts alongside interactive work
                sleep(Duration::from_millis(config.pacing_delay_ms)).await;

                match loader.resolve(book_id).await {
                    Ok(_) => tracing::debug!("Prefetched book {}", book_id),
                    Err(e) => tracing::error!("Failed to prefetch book {}: {}", book_id, e),
                }
            }

            tracing::info!(
                "Background prefetch complete ({} books resident)",
                loader.resident_count()
            );
        });

        PrefetchHandle { handle }
    }
}

impl PrefetchHandle {
    /// Cancel the prefetch task
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task has run to completion or been cancelled
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the prefetch loop to finish
    pub async fn wait(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for PrefetchHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
