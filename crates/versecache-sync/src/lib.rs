//! # VerseCache Sync
//!
//! Fingerprint-gated refresh of a locally committed corpus.
//!
//! ## Overview
//!
//! The remote document carries no version number; its content is its
//! version. Each attempt fetches the whole snapshot, fingerprints it, and
//! compares that with the fingerprint committed alongside the local books.
//! Only a difference triggers a write, and the write replaces everything in
//! one transaction.
//!
//! ## Key Properties
//!
//! - **Fail-closed**: a failed fetch, parse or commit never touches the store
//! - **Idempotent**: an unchanged remote is a no-op
//! - **Serialized**: one attempt at a time per coordinator
//! - **Committed means committed**: a commit that has started finishes and
//!   reports its own outcome, even if the caller stops waiting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use versecache_store::SqliteStore;
//! use versecache_sync::{HttpSource, SyncConfig, SyncCoordinator, DEFAULT_TIMEOUT};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("versecache.db")?);
//!     let source = HttpSource::new(DEFAULT_TIMEOUT)?;
//!     let coordinator = SyncCoordinator::new(store, source, SyncConfig::default());
//!
//!     let report = coordinator.ensure_fresh("https://example.com/books.json").await?;
//!     println!("{:?} ({} books)", report.outcome, report.book_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Attempt Flow
//!
//! ```text
//! Fetching ----------> Fingerprinting --> Comparing --+--> Committing --> Committed
//!   source.fetch         fingerprint()    local fp    |     replace_all
//!   parse + validate                                  +--> Skipping ----> Skipped
//! ```

pub mod coordinator;
pub mod error;
pub mod http;
pub mod phase;
pub mod source;

pub use coordinator::{SyncConfig, SyncCoordinator, SyncOutcome, SyncReport};
pub use error::{FailureKind, FetchError, Result, SyncError};
pub use http::{HttpSource, DEFAULT_TIMEOUT};
pub use phase::SyncPhase;
pub use source::{memory::MemorySource, Source};
