//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use versecache_core::{canonical_bytes, Book, BookSummary, Fingerprint, Snapshot};

use crate::error::{Result, StoreError};
use crate::traits::{Committed, ContentStore, PreferenceStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Books of the committed snapshot, in storage order.
    books: Vec<Book>,

    /// The fingerprint record.
    fingerprint: Option<Fingerprint>,

    /// View preferences by key.
    preferences: HashMap<String, String>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Create a store that already holds a committed snapshot.
    pub fn with_snapshot(snapshot: Snapshot, fingerprint: Fingerprint) -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                books: snapshot.into_books(),
                fingerprint: Some(fingerprint),
                preferences: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject what the SQLite schema would reject, before anything is swapped.
fn check_storable(snapshot: &Snapshot) -> Result<()> {
    let mut ids = HashSet::with_capacity(snapshot.len());
    for book in snapshot.books() {
        if !ids.insert(book.book_id) {
            return Err(StoreError::InvalidData(format!(
                "duplicate book id {}",
                book.book_id
            )));
        }
        canonical_bytes(&book.chapters)?;
    }
    Ok(())
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(inner.books.len())
    }

    async fn get_all_books(&self) -> Result<Snapshot> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(Snapshot::new(inner.books.clone()))
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(inner.books.iter().map(Book::summary).collect())
    }

    async fn get_book(&self, book_id: u32) -> Result<Option<Book>> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(inner.books.iter().find(|b| b.book_id == book_id).cloned())
    }

    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(inner
            .books
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_fingerprint(&self) -> Result<Option<Fingerprint>> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(inner.fingerprint)
    }

    async fn load_committed(&self) -> Result<Committed> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(Committed {
            snapshot: Snapshot::new(inner.books.clone()),
            fingerprint: inner.fingerprint,
        })
    }

    async fn replace_all(&self, snapshot: &Snapshot, fingerprint: &Fingerprint) -> Result<()> {
        check_storable(snapshot)?;

        let mut inner = self.inner.write().map_err(StoreError::poisoned)?;
        inner.books = snapshot.books().to_vec();
        inner.fingerprint = Some(*fingerprint);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().map_err(StoreError::poisoned)?;
        inner.books.clear();
        inner.fingerprint = None;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.read().map_err(StoreError::poisoned)?;
        Ok(inner.preferences.get(key).cloned())
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.write().map_err(StoreError::poisoned)?;
        inner.preferences.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
