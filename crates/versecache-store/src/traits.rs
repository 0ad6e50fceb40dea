//! Store traits: the abstract interface for corpus persistence.
//!
//! These traits keep the sync coordinator and the query facade
//! storage-agnostic. Implementations include SQLite (primary) and in-memory
//! (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use versecache_core::{fingerprint, Book, BookSummary, Fingerprint, Snapshot};

use crate::error::Result;

/// Metadata key of the fingerprint record.
pub const DATA_HASH_KEY: &str = "dataHash";

/// A snapshot and the fingerprint committed with it, read in one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub snapshot: Snapshot,
    pub fingerprint: Option<Fingerprint>,
}

/// Outcome of checking the stored fingerprint against the stored books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    /// Nothing committed yet.
    Empty,
    /// The fingerprint record matches the stored books.
    Verified(Fingerprint),
    /// Books are present but no fingerprint record exists.
    Unverified { actual: Fingerprint },
    /// The fingerprint record disagrees with the stored books.
    Mismatch {
        stored: Fingerprint,
        actual: Fingerprint,
    },
}

impl Integrity {
    pub fn is_verified(&self) -> bool {
        matches!(self, Integrity::Verified(_))
    }
}

/// The ContentStore trait: async interface for corpus persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Single versioned blob**: the corpus is replaced wholesale, never patched.
/// - **Atomic replace**: `replace_all` either fully succeeds or leaves the
///   previous books and fingerprint untouched.
/// - **Fingerprint invariant**: when present, the stored fingerprint equals
///   the fingerprint of the stored books.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Number of persisted books.
    async fn count(&self) -> Result<usize>;

    /// All persisted books, in storage order.
    async fn get_all_books(&self) -> Result<Snapshot>;

    /// Book listings without chapter content, in storage order.
    async fn list_books(&self) -> Result<Vec<BookSummary>>;

    /// A single book by id.
    async fn get_book(&self, book_id: u32) -> Result<Option<Book>>;

    /// The first book whose name matches, ignoring ASCII case.
    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>>;

    /// The fingerprint of the committed snapshot, if one was committed.
    async fn get_fingerprint(&self) -> Result<Option<Fingerprint>>;

    /// The books and the fingerprint record, read as one consistent view.
    async fn load_committed(&self) -> Result<Committed>;

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace every book and the fingerprint record in one transaction.
    ///
    /// On error the store is left exactly as it was before the call.
    async fn replace_all(&self, snapshot: &Snapshot, fingerprint: &Fingerprint) -> Result<()>;

    /// Remove every book and the fingerprint record.
    async fn clear(&self) -> Result<()>;
}

/// Key/value storage for view preferences.
///
/// Lives beside the corpus but outside its consistency guarantees:
/// `replace_all` and `clear` never touch it.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_preference(&self, key: &str) -> Result<Option<String>>;

    async fn set_preference(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn count(&self) -> Result<usize> {
        (**self).count().await
    }

    async fn get_all_books(&self) -> Result<Snapshot> {
        (**self).get_all_books().await
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        (**self).list_books().await
    }

    async fn get_book(&self, book_id: u32) -> Result<Option<Book>> {
        (**self).get_book(book_id).await
    }

    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>> {
        (**self).find_book_by_name(name).await
    }

    async fn get_fingerprint(&self) -> Result<Option<Fingerprint>> {
        (**self).get_fingerprint().await
    }

    async fn load_committed(&self) -> Result<Committed> {
        (**self).load_committed().await
    }

    async fn replace_all(&self, snapshot: &Snapshot, fingerprint: &Fingerprint) -> Result<()> {
        (**self).replace_all(snapshot, fingerprint).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}

#[async_trait]
impl<S: PreferenceStore + ?Sized> PreferenceStore for Arc<S> {
    async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        (**self).get_preference(key).await
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_preference(key, value).await
    }
}

/// Extension trait for common store patterns.
pub trait StoreExt: ContentStore {
    /// Recompute the fingerprint of the stored books and compare it with
    /// the stored record.
    fn verify_integrity(&self) -> impl std::future::Future<Output = Result<Integrity>> + Send;
}

impl<S: ContentStore + ?Sized> StoreExt for S {
    async fn verify_integrity(&self) -> Result<Integrity> {
        let committed = self.load_committed().await?;

        if committed.snapshot.is_empty() && committed.fingerprint.is_none() {
            return Ok(Integrity::Empty);
        }

        let actual = fingerprint(&committed.snapshot)?;
        Ok(match committed.fingerprint {
            Some(stored) if stored == actual => Integrity::Verified(stored),
            Some(stored) => Integrity::Mismatch { stored, actual },
            None => Integrity::Unverified { actual },
        })
    }
}
