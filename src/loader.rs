//! # Cache Orchestrator Module
//!
//! ## Purpose
//! Resolves a single book by identifier through the tiered cache with
//! minimal latency and mandatory population of faster tiers.
//!
//! ## Resolution Algorithm
//! 1. In-memory map hit: return immediately, no further side effects.
//! 2. Persistent cache hit: apply the text-correction pass, populate the
//!    in-memory map, return.
//! 3. Document store fallback: apply the text-correction pass, populate both
//!    the persistent cache (best effort) and the in-memory map, return.
//!
//! Tier checks are strictly sequential per call. Concurrent resolutions of
//! the same identifier are not deduplicated here; callers needing at-most-once
//! semantics coordinate externally.
//!
//! ## Error Policy
//! Only a document store failure for the requested book reaches the caller.
//! Persistent cache read and write failures are logged and treated as misses.

use crate::cache::{MemoryCache, PersistentCache};
use crate::corpus::{flatten_book, Book, FlattenedVerse};
use crate::errors::Result;
use crate::store::BookStore;
use crate::text_fix::TextCorrector;
use crate::utils::Timer;
use crate::{BookId, BOOK_IDS};
use std::sync::Arc;

/// Tiered book resolver owning both cache tiers
pub struct CorpusLoader {
    store: Arc<dyn BookStore>,
    persistent: Arc<PersistentCache>,
    memory: MemoryCache,
    corrector: TextCorrector,
}

impl CorpusLoader {
    /// Create a loader with an empty in-memory tier
    pub fn new(store: Arc<dyn BookStore>, persistent: Arc<PersistentCache>) -> Result<Self> {
        Ok(Self {
            store,
            persistent,
            memory: MemoryCache::new(),
            corrector: TextCorrector::new()?,
        })
    }

    /// Resolve a book through the cache tiers
    pub async fn resolve(&self, book_id: BookId) -> Result<Arc<Book>> {
        // 1. In-memory map (instant)
        if let Some(book) = self.memory.get(book_id) {
            tracing::debug!("Book {} served from memory", book_id);
            return Ok(book);
        }

        let timer = Timer::new(format!("resolve book {}", book_id));

        // 2. Persistent cache (fast)
        match self.persistent.get(book_id).await {
            Ok(Some(book)) => {
                let book = Arc::new(self.corrector.correct_book(book));
                self.memory.insert(book_id, Arc::clone(&book));
                timer.stop();
                return Ok(book);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Persistent cache read failed for book {}: {}", book_id, e);
            }
        }

        // 3. Document store (slower)
        let book = self.store.load_book(book_id).await?;
        let book = Arc::new(self.corrector.correct_book(book));

        // Cache population is best-effort and never fails the resolution
        self.persistent.put(book_id, book.as_ref()).await;
        self.memory.insert(book_id, Arc::clone(&book));

        timer.stop();
        tracing::info!("Book {} resolved from the document store", book_id);
        Ok(book)
    }

    /// Whether a book is resident in the in-memory tier
    pub fn resident(&self, book_id: BookId) -> bool {
        self.memory.contains(book_id)
    }

    /// Number of books resident in the in-memory tier
    pub fn resident_count(&self) -> usize {
        self.memory.len()
    }

    /// Resolve every known book, tolerating individual failures.
    ///
    /// Used to warm the corpus before search. A partial corpus is acceptable;
    /// returns the resident count afterwards.
    pub async fn warm_all(&self) -> usize {
        for &book_id in BOOK_IDS.iter() {
            if self.resident(book_id) {
                continue;
            }
            if let Err(e) = self.resolve(book_id).await {
                tracing::warn!("Failed to warm book {}: {}", book_id, e);
            }
        }
        self.resident_count()
    }

    /// Flatten every resident book into one verse list, in book order
    pub fn flattened_corpus(&self) -> Vec<FlattenedVerse> {
        let mut verses = Vec::new();
        for &book_id in BOOK_IDS.iter() {
            if let Some(book) = self.memory.get(book_id) {
                verses.extend(flatten_book(&book));
            }
        }
        verses
    }

    /// Handle to the persistent tier (shared with the preload path)
    pub fn persistent(&self) -> &Arc<PersistentCache> {
        &self.persistent
    }
}
