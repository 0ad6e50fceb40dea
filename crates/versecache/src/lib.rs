//! # VerseCache
//!
//! An offline-first local cache of a book/chapter/verse corpus that is
//! published as one JSON document.
//!
//! ## Overview
//!
//! - **Snapshots**: the whole corpus as of one fetch, replaced wholesale
//! - **Fingerprints**: the content is the version; a refresh only writes
//!   when the remote fingerprint differs from the committed one
//! - **Atomic replace**: readers see the old corpus or the new one, never a mix
//! - **Fail-closed**: a failed refresh leaves the committed corpus queryable
//!
//! ## Usage
//!
//! ```rust,no_run
//! use versecache::{CacheConfig, VerseCache};
//!
//! async fn example() -> versecache::Result<()> {
//!     let config = CacheConfig::new("https://example.com/bible.json");
//!     let cache = VerseCache::open(config)?;
//!
//!     // Serve whatever is committed, then refresh.
//!     let books = cache.query().list_books().await?;
//!     println!("{} books cached", books.len());
//!
//!     let report = cache.refresh().await?;
//!     println!("refresh: {:?}", report.outcome);
//!
//!     let verses = cache.query().list_verses(43, 1).await?;
//!     for verse in verses {
//!         println!("{} {}", verse.verse_number, verse.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `versecache::core` - Data model, canonical encoding, fingerprints
//! - `versecache::store` - Storage abstraction and SQLite
//! - `versecache::sync` - Sources and the sync coordinator

pub mod cache;
pub mod config;
pub mod error;
pub mod preferences;
pub mod query;

// Re-export component crates
pub use versecache_core as core;
pub use versecache_store as store;
pub use versecache_sync as sync;

// Re-export main types for convenience
pub use cache::VerseCache;
pub use config::{CacheConfig, SOURCE_URL_ENV};
pub use error::{CacheError, Result};
pub use preferences::{ViewPreferences, VIEW_PREFERENCES_KEY};
pub use query::QueryFacade;

// Re-export commonly used types
pub use versecache_core::{Book, BookSummary, Chapter, Fingerprint, Snapshot, Verse};
pub use versecache_sync::{FailureKind, SyncConfig, SyncOutcome, SyncPhase, SyncReport};
