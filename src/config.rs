//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the reader core, supporting TOML files and
//! environment variable overrides with validation and type-safe access to
//! all system settings.
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! Defaults encode the behavioral constants of the reader: 7 day cache TTL,
//! 5 second prefetch settle delay, 1 second pacing delay, 300 ms search
//! debounce, 5 second search timeout, 50 result cap.

use crate::errors::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Document store settings
    pub store: StoreConfig,
    /// Persistent cache settings
    pub cache: CacheConfig,
    /// Background prefetch behavior
    pub prefetch: PrefetchConfig,
    /// Search coordination behavior
    pub search: SearchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory containing the book assets (`book_<id>.json`)
    pub data_dir: PathBuf,
}

/// Persistent cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Database file path
    pub db_path: PathBuf,
    /// Time to live for cache entries (days)
    pub ttl_days: u64,
    /// Enable compression of cached book payloads
    pub enable_compression: bool,
}

/// Background prefetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Delay after mount before prefetch starts (ms)
    pub settle_delay_ms: u64,
    /// Pacing delay between book loads (ms)
    pub pacing_delay_ms: u64,
}

/// Search coordination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a query is dispatched (ms)
    pub debounce_ms: u64,
    /// Soft timeout for an in-flight search (ms)
    pub timeout_ms: u64,
    /// Maximum number of results returned per search
    pub max_results: usize,
    /// Bounded attempts when waiting for the corpus to finish warming
    pub corpus_wait_attempts: u32,
    /// Initial backoff delay between corpus readiness checks (ms)
    pub corpus_wait_initial_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                data_dir: PathBuf::from("./data/corpus"),
            },
            cache: CacheConfig {
                db_path: PathBuf::from("./data/reader-cache.db"),
                ttl_days: 7,
                enable_compression: true,
            },
            prefetch: PrefetchConfig {
                settle_delay_ms: 5_000,
                pacing_delay_ms: 1_000,
            },
            search: SearchConfig {
                debounce_ms: 300,
                timeout_ms: 5_000,
                max_results: 50,
                corpus_wait_attempts: 6,
                corpus_wait_initial_delay_ms: 250,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ReaderError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ReaderError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("SCRIPTURE_READER_DATA_DIR") {
            self.store.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(db_path) = std::env::var("SCRIPTURE_READER_CACHE_PATH") {
            self.cache.db_path = PathBuf::from(db_path);
        }
        if let Ok(level) = std::env::var("SCRIPTURE_READER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_days == 0 {
            return Err(ReaderError::Validation {
                field: "cache.ttl_days".to_string(),
                reason: "TTL must be at least one day".to_string(),
            });
        }

        if self.search.max_results == 0 {
            return Err(ReaderError::Validation {
                field: "search.max_results".to_string(),
                reason: "Result cap must be greater than zero".to_string(),
            });
        }

        if self.search.debounce_ms >= self.search.timeout_ms {
            return Err(ReaderError::Validation {
                field: "search.debounce_ms".to_string(),
                reason: "Debounce must be shorter than the search timeout".to_string(),
            });
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ReaderError::Validation {
                field: "logging.level".to_string(),
                reason: format!("Invalid log level: {}", self.logging.level),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ReaderError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Initialize logging and tracing
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level: tracing::Level = config.level.parse().map_err(|_| ReaderError::Config {
        message: format!("Invalid log level: {}", config.level),
    })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    if config.json_format {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_filter(filter),
            )
            .init();
    }

    tracing::info!("Logging initialized with level: {}", config.level);
    Ok(())
}
