//! # Cache Tiers Module
//!
//! ## Purpose
//! The two cache tiers in front of the document store: a process-lifetime
//! in-memory map and a sled-backed persistent cache with expiration and
//! schema versioning.
//!
//! ## Input/Output Specification
//! - **Input**: Parsed book documents keyed by book identifier
//! - **Output**: Cached book retrieval, preload progress, cache statistics
//! - **Storage**: Sled embedded database, bincode-encoded records with an
//!   optional gzip layer
//!
//! ## Invariants
//! - A persistent record is valid only while it is younger than the TTL and
//!   carries the current schema version; anything else reads as absent and
//!   is purged on the way out.
//! - Writes are best-effort. `put` never surfaces an error to its caller;
//!   the corpus stays usable from the document store fallback.

use crate::config::CacheConfig;
use crate::corpus::Book;
use crate::errors::Result;
use crate::store::BookStore;
use crate::utils::format_bytes;
use crate::{BookId, BOOK_COUNT, BOOK_IDS};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;

/// Increment to invalidate previously persisted records
pub const CACHE_VERSION: &str = "1.0.0";

const BOOK_TREE: &str = "books";

/// Process-lifetime map from book identifier to parsed document.
///
/// Owned by the cache orchestrator; entries live until the process exits.
#[derive(Default)]
pub struct MemoryCache {
    books: DashMap<BookId, Arc<Book>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, book_id: BookId) -> Option<Arc<Book>> {
        self.books.get(&book_id).map(|entry| Arc::clone(&entry))
    }

    pub fn insert(&self, book_id: BookId, book: Arc<Book>) {
        self.books.insert(book_id, book);
    }

    pub fn contains(&self, book_id: BookId) -> bool {
        self.books.contains_key(&book_id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Persistent cache record for one book
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    book_id: BookId,
    book: Book,
    /// Write time, epoch milliseconds
    timestamp: i64,
    version: String,
}

/// Cache statistics for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub cached_count: usize,
    pub total_size_bytes: u64,
    pub oldest_timestamp: Option<i64>,
}

/// Sled-backed persistent cache keyed by book identifier
pub struct PersistentCache {
    config: CacheConfig,
    tree: sled::Tree,
    // The tree borrows from the db handle; keep it alive for the cache lifetime
    _db: sled::Db,
}

impl PersistentCache {
    /// Open (or create) the cache database
    pub fn open(config: CacheConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(&config.db_path)?;
        let tree = db.open_tree(BOOK_TREE)?;

        tracing::info!(
            "Persistent cache opened at {:?} ({} records)",
            config.db_path,
            tree.len()
        );

        Ok(Self {
            config,
            tree,
            _db: db,
        })
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn ttl_millis(&self) -> i64 {
        self.config.ttl_days as i64 * 24 * 60 * 60 * 1000
    }

    fn encode(&self, entry: &CacheEntry) -> Result<Vec<u8>> {
        let raw = bincode::serialize(entry)?;
        if !self.config.enable_compression {
            return Ok(raw);
        }
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;
        Ok(encoder.finish()?)
    }

    fn decode(&self, data: &[u8]) -> Result<CacheEntry> {
        if !self.config.enable_compression {
            return Ok(bincode::deserialize(data)?);
        }
        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw)?;
        Ok(bincode::deserialize(&raw)?)
    }

    /// Get a cached book, failing closed on any invalid record.
    ///
    /// Expired, version-mismatched, and undecodable records are deleted as a
    /// side effect and reported as absent.
    pub async fn get(&self, book_id: BookId) -> Result<Option<Book>> {
        let key = book_id.to_be_bytes();

        let raw = match self.tree.get(key)? {
            Some(value) => value,
            None => {
                tracing::debug!("Book {} not found in persistent cache", book_id);
                return Ok(None);
            }
        };

        let entry = match self.decode(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    "Corrupt cache record for book {}, purging: {}",
                    book_id,
                    e
                );
                let _ = self.tree.remove(key);
                return Ok(None);
            }
        };

        let age = Self::now_millis() - entry.timestamp;
        if entry.version != CACHE_VERSION || age > self.ttl_millis() {
            tracing::debug!(
                "Book {} cache record expired or outdated (age {}m, version {})",
                book_id,
                age / 60_000,
                entry.version
            );
            let _ = self.tree.remove(key);
            return Ok(None);
        }

        tracing::debug!(
            "Book {} loaded from persistent cache (age {}m)",
            book_id,
            age / 60_000
        );
        Ok(Some(entry.book))
    }

    /// Upsert a book record with the current timestamp and schema version.
    ///
    /// Errors are logged and swallowed; a failed write only means the next
    /// session falls back to the document store.
    pub async fn put(&self, book_id: BookId, book: &Book) {
        let entry = CacheEntry {
            book_id,
            book: book.clone(),
            timestamp: Self::now_millis(),
            version: CACHE_VERSION.to_string(),
        };

        let bytes = match self.encode(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to encode cache record for book {}: {}", book_id, e);
                return;
            }
        };

        match self.tree.insert(book_id.to_be_bytes(), bytes) {
            Ok(_) => tracing::debug!("Book {} cached successfully", book_id),
            Err(e) => tracing::warn!("Failed to cache book {}: {}", book_id, e),
        }
    }

    /// Remove all records (diagnostics/reset only)
    pub async fn clear(&self) -> Result<()> {
        self.tree.clear()?;
        tracing::info!("Persistent cache cleared");
        Ok(())
    }

    /// Check whether every known book has a record present
    pub fn is_fully_cached(&self) -> bool {
        self.tree.len() == BOOK_COUNT
    }

    /// Preload every book into the cache, skipping valid records.
    ///
    /// Invokes `on_progress(current, total)` after each book that is found
    /// in cache or freshly stored. A single book's failure is logged and the
    /// loop continues.
    pub async fn preload_all<F>(&self, store: &dyn BookStore, mut on_progress: F)
    where
        F: FnMut(usize, usize),
    {
        let total = BOOK_IDS.len();
        for (index, &book_id) in BOOK_IDS.iter().enumerate() {
            let current = index + 1;

            match self.get(book_id).await {
                Ok(Some(_)) => {
                    tracing::debug!("Book {} already cached, skipping preload", book_id);
                    on_progress(current, total);
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    // Treat a failed read as a miss and try to refresh the record
                    tracing::warn!("Cache read failed during preload of book {}: {}", book_id, e);
                }
            }

            match store.load_book(book_id).await {
                Ok(book) => {
                    self.put(book_id, &book).await;
                    on_progress(current, total);
                    tracing::debug!("Preloaded book {}", book_id);
                }
                Err(e) => {
                    tracing::error!("Failed to preload book {}: {}", book_id, e);
                }
            }
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut cached_count = 0;
        let mut total_size_bytes = 0u64;
        let mut oldest_timestamp: Option<i64> = None;

        for item in self.tree.iter() {
            let (_, value) = match item {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("Cache iteration error while collecting stats: {}", e);
                    continue;
                }
            };
            cached_count += 1;
            total_size_bytes += value.len() as u64;
            if let Ok(entry) = self.decode(&value) {
                oldest_timestamp = Some(match oldest_timestamp {
                    Some(oldest) => oldest.min(entry.timestamp),
                    None => entry.timestamp,
                });
            }
        }

        tracing::debug!(
            "Cache stats: {} records, {}",
            cached_count,
            format_bytes(total_size_bytes)
        );

        CacheStats {
            cached_count,
            total_size_bytes,
            oldest_timestamp,
        }
    }

    /// Insert a record with an explicit timestamp, bypassing `put`
    #[cfg(test)]
    pub(crate) fn put_raw(&self, book_id: BookId, book: &Book, timestamp: i64, version: &str) {
        let entry = CacheEntry {
            book_id,
            book: book.clone(),
            timestamp,
            version: version.to_string(),
        };
        let bytes = self.encode(&entry).unwrap();
        self.tree.insert(book_id.to_be_bytes(), bytes).unwrap();
    }

    /// Check raw record presence without validity checks
    #[cfg(test)]
    pub(crate) fn has_record(&self, book_id: BookId) -> bool {
        self.tree.contains_key(book_id.to_be_bytes()).unwrap()
    }
}
