//! # Scripture Reader Core
//!
//! ## Overview
//! This library implements the data-loading, caching, and search core of a
//! client-side reading application for a five-book scripture corpus with
//! per-verse commentary.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `corpus`: Document data model and flattening for rendering/search
//! - `store`: Document store boundary loading raw book assets by identifier
//! - `text_fix`: Idempotent text-correction pass over known data-entry errors
//! - `cache`: In-memory and sled-backed persistent cache tiers
//! - `loader`: Tiered cache orchestrator resolving books with minimal latency
//! - `prefetch`: Paced background warming of the remaining books
//! - `search`: Scoring and ranking engine over the flattened corpus
//! - `worker`: Dedicated search thread with a sequenced request channel
//! - `coordinator`: Debounced, last-query-wins search coordination
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Book assets (JSON), search queries (text), filters
//! - **Output**: Resolved book documents, ranked verse results
//! - **Performance**: Memory-tier hits avoid all I/O; search scanning never
//!   runs on the caller's executor
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use scripture_reader::{Config, CorpusLoader, SearchCoordinator};
//! use scripture_reader::cache::PersistentCache;
//! use scripture_reader::store::JsonAssetStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let store = Arc::new(JsonAssetStore::new(&config.store));
//!     let cache = Arc::new(PersistentCache::open(config.cache.clone())?);
//!     let loader = Arc::new(CorpusLoader::new(store, cache)?);
//!     let book = loader.resolve(1).await?;
//!     println!("Loaded {} with {} sections", book.book_name, book.sections.len());
//!
//!     let search = SearchCoordinator::new(loader, config.search.clone())?;
//!     search.open_search();
//!     search.set_query("light");
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod corpus;
pub mod store;
pub mod text_fix;
pub mod cache;
pub mod loader;
pub mod prefetch;
pub mod search;
pub mod worker;
pub mod coordinator;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{ReaderError, Result};
pub use coordinator::{SearchCoordinator, SearchState};
pub use loader::CorpusLoader;
pub use prefetch::{PrefetchHandle, PrefetchScheduler};
pub use search::{SearchFilters, SearchScope};

/// Identifier for one of the five books of the corpus
pub type BookId = u32;

/// Number of books in the corpus
pub const BOOK_COUNT: usize = 5;

/// The known book identifiers, in canonical reading order
pub const BOOK_IDS: [BookId; BOOK_COUNT] = [1, 2, 3, 4, 5];
