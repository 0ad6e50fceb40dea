//! # VerseCache Store
//!
//! Durable storage for the cached corpus. Provides a trait-based interface
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store holds two things: the persisted books of the current snapshot
//! and a single metadata record with that snapshot's fingerprint. They are
//! only ever written together, through [`ContentStore::replace_all`].
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The async trait for corpus storage
//! - [`PreferenceStore`] - Independently keyed view preferences
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Committed`] - A snapshot and its fingerprint, read together
//!
//! ## Usage
//!
//! ```rust,no_run
//! use versecache_core::Snapshot;
//! use versecache_store::{ContentStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("versecache.db").unwrap();
//!
//!     let snapshot = Snapshot::empty();
//!     let fingerprint = snapshot.fingerprint().unwrap();
//!     store.replace_all(&snapshot, &fingerprint).await.unwrap();
//!
//!     assert_eq!(store.get_fingerprint().await.unwrap(), Some(fingerprint));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic replace**: old books, new books and the fingerprint record change
//!   in one transaction or not at all
//! - **Consistent reads**: readers see either the old or the new snapshot, never a mix
//! - **Durable**: SQLite runs with `synchronous = FULL`

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Committed, ContentStore, Integrity, PreferenceStore, StoreExt, DATA_HASH_KEY};
