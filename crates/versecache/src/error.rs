//! Error types for the cache.

use thiserror::Error;
use versecache_store::StoreError;
use versecache_sync::{FetchError, SyncError};

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// The source could not be set up.
    #[error("source error: {0}")]
    Source(#[from] FetchError),

    /// No book with this id in the committed snapshot.
    #[error("book not found: {0}")]
    BookNotFound(u32),

    /// The book exists but has no chapter with this number.
    #[error("chapter {chapter} not found in book {book_id}")]
    ChapterNotFound { book_id: u32, chapter: u32 },

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Preferences could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
