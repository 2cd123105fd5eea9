//! # Document Store Module
//!
//! ## Purpose
//! Boundary to the static corpus assets. Each of the five books ships as one
//! immutable JSON document loaded by numeric identifier.
//!
//! ## Error Policy
//! A load failure (missing asset, malformed JSON) is surfaced to the caller
//! as `ReaderError::CorpusLoad` with no built-in retry; the UI layer owns the
//! retry affordance for books the user explicitly requested.

use crate::config::StoreConfig;
use crate::corpus::Book;
use crate::errors::{ReaderError, Result};
use crate::{BookId, BOOK_IDS};
use async_trait::async_trait;
use std::path::PathBuf;

/// Common interface for book asset sources
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Load the raw document for a book by identifier
    async fn load_book(&self, book_id: BookId) -> Result<Book>;
}

/// Book store reading JSON assets from a local directory
pub struct JsonAssetStore {
    data_dir: PathBuf,
}

impl JsonAssetStore {
    /// Create a store over the configured asset directory
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
        }
    }

    fn asset_path(&self, book_id: BookId) -> PathBuf {
        self.data_dir.join(format!("book_{}.json", book_id))
    }
}

#[async_trait]
impl BookStore for JsonAssetStore {
    async fn load_book(&self, book_id: BookId) -> Result<Book> {
        if !BOOK_IDS.contains(&book_id) {
            return Err(ReaderError::UnknownBook { book_id });
        }

        let path = self.asset_path(book_id);
        tracing::debug!("Loading book {} from {:?}", book_id, path);

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ReaderError::CorpusLoad {
                book_id,
                reason: format!("failed to read {:?}: {}", path, e),
            })?;

        let book: Book = serde_json::from_str(&raw).map_err(|e| ReaderError::CorpusLoad {
            book_id,
            reason: format!("malformed asset {:?}: {}", path, e),
        })?;

        if book.book_id != book_id {
            return Err(ReaderError::CorpusLoad {
                book_id,
                reason: format!("asset declares book_id {}", book.book_id),
            });
        }

        tracing::debug!(
            "Loaded book {} ({} sections, {} bytes)",
            book_id,
            book.sections.len(),
            raw.len()
        );
        Ok(book)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::corpus::fixtures::sample_book;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store with call counting and per-book failure injection
    pub struct MockBookStore {
        books: HashMap<BookId, Book>,
        fail_ids: HashSet<BookId>,
        load_calls: AtomicUsize,
    }

    impl MockBookStore {
        pub fn with_books(ids: &[BookId]) -> Self {
            Self {
                books: ids.iter().map(|&id| (id, sample_book(id))).collect(),
                fail_ids: HashSet::new(),
                load_calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(mut self, ids: &[BookId]) -> Self {
            self.fail_ids.extend(ids.iter().copied());
            self
        }

        pub fn load_calls(&self) -> usize {
            self.load_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BookStore for MockBookStore {
        async fn load_book(&self, book_id: BookId) -> Result<Book> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_ids.contains(&book_id) {
                return Err(ReaderError::CorpusLoad {
                    book_id,
                    reason: "injected failure".to_string(),
                });
            }
            self.books
                .get(&book_id)
                .cloned()
                .ok_or(ReaderError::UnknownBook { book_id })
        }
    }
}
