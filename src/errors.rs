//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the reader core, providing structured error
//! types and conversion utilities for all system components.
//!
//! ## Error Categories
//! - Recoverable cache conditions (miss, expiry, version mismatch) are never
//!   represented as errors at all; the cache tiers fail closed instead.
//! - Corpus load failures are the only class surfaced to the UI layer.
//! - Search failures degrade to empty results and never reach the caller.

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Error types for the reader core
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Identifier outside the known corpus
    #[error("Unknown book identifier: {book_id}")]
    UnknownBook { book_id: u32 },

    /// Document store failure for an explicitly requested book
    #[error("Failed to load book {book_id} from the document store: {reason}")]
    CorpusLoad { book_id: u32, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// Search worker channel is gone
    #[error("Search worker unavailable: {reason}")]
    WorkerUnavailable { reason: String },

    /// A dispatched search received no response in time
    #[error("Search timed out after {timeout_ms}ms")]
    SearchTimeout { timeout_ms: u64 },

    /// Embedded database errors
    #[error("Cache database error: {0}")]
    Database(sled::Error),

    /// Cache record encoding/decoding errors
    #[error("Cache serialization error: {0}")]
    Serialization(bincode::Error),

    /// Corpus asset parsing errors
    #[error("Corpus JSON error: {0}")]
    Json(serde_json::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ReaderError {
    /// Check if the error is recoverable by falling through to another tier
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReaderError::Database(_)
                | ReaderError::Serialization(_)
                | ReaderError::SearchTimeout { .. }
                | ReaderError::WorkerUnavailable { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ReaderError::UnknownBook { .. } | ReaderError::CorpusLoad { .. } => "corpus",
            ReaderError::Config { .. } | ReaderError::Validation { .. } => "configuration",
            ReaderError::Database(_) | ReaderError::Serialization(_) => "cache",
            ReaderError::WorkerUnavailable { .. } | ReaderError::SearchTimeout { .. } => "search",
            ReaderError::Json(_) | ReaderError::Io(_) | ReaderError::Internal { .. } => "generic",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl From<serde_json::Error> for ReaderError {
    fn from(err: serde_json::Error) -> Self {
        ReaderError::Json(err)
    }
}

impl From<sled::Error> for ReaderError {
    fn from(err: sled::Error) -> Self {
        ReaderError::Database(err)
    }
}

impl From<bincode::Error> for ReaderError {
    fn from(err: bincode::Error) -> Self {
        ReaderError::Serialization(err)
    }
}

impl From<toml::de::Error> for ReaderError {
    fn from(err: toml::de::Error) -> Self {
        ReaderError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

/// Macro for internal error construction
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::ReaderError::Internal {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::ReaderError::Internal {
            message: format!($fmt, $($arg)*),
        }
    };
}
