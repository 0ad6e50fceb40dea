//! Read-only queries over the committed snapshot.

use std::sync::Arc;

use versecache_core::{Book, BookSummary, Fingerprint, Verse};
use versecache_store::ContentStore;

use crate::error::{CacheError, Result};

/// Read accessors for view-state consumers.
///
/// Every call reads the store; nothing is cached here and nothing here
/// triggers a sync. A reader never sees a half-replaced corpus because the
/// store never exposes one.
pub struct QueryFacade<S: ContentStore> {
    store: Arc<S>,
}

impl<S: ContentStore> Clone for QueryFacade<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ContentStore> QueryFacade<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every book, without chapter content, in storage order.
    pub async fn list_books(&self) -> Result<Vec<BookSummary>> {
        Ok(self.store.list_books().await?)
    }

    /// Chapter numbers of a book, in storage order.
    pub async fn list_chapters(&self, book_id: u32) -> Result<Vec<u32>> {
        let book = self.book(book_id).await?;
        Ok(book.chapters.iter().map(|c| c.chapter_number).collect())
    }

    /// Verses of one chapter, in storage order.
    pub async fn list_verses(&self, book_id: u32, chapter: u32) -> Result<Vec<Verse>> {
        let book = self.book(book_id).await?;

        book.chapters
            .into_iter()
            .find(|c| c.chapter_number == chapter)
            .map(|c| c.verses)
            .ok_or(CacheError::ChapterNotFound { book_id, chapter })
    }

    /// A whole book by id.
    pub async fn book(&self, book_id: u32) -> Result<Book> {
        self.store
            .get_book(book_id)
            .await?
            .ok_or(CacheError::BookNotFound(book_id))
    }

    /// Look a book up by name, ignoring ASCII case.
    pub async fn find_book(&self, name: &str) -> Result<Option<BookSummary>> {
        Ok(self
            .store
            .find_book_by_name(name)
            .await?
            .map(|b| b.summary()))
    }

    pub async fn count_books(&self) -> Result<usize> {
        Ok(self.store.count().await?)
    }

    /// Fingerprint of the committed snapshot, if any.
    pub async fn fingerprint(&self) -> Result<Option<Fingerprint>> {
        Ok(self.store.get_fingerprint().await?)
    }
}
