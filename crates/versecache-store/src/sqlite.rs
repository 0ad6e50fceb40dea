//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for VerseCache. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use versecache_core::{
    canonical_bytes, from_canonical_bytes, Book, BookSummary, Chapter, Fingerprint, Snapshot,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{Committed, ContentStore, PreferenceStore, DATA_HASH_KEY};

const BOOK_COLUMNS: &str = "book_id, name, abbreviation, total_chapters, chapters";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. Every operation, including a whole
/// `replace_all` transaction, runs while holding that mutex, so readers
/// never see a half-replaced corpus.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and its parent directory) and runs migrations if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        configure(&conn)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        configure(&conn)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(StoreError::poisoned)?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Connection settings applied before migrations.
fn configure(conn: &Connection) -> Result<()> {
    // Commits must be on disk before replace_all returns.
    conn.execute_batch("PRAGMA synchronous = FULL;")?;
    Ok(())
}

/// A book as stored: chapters flattened into one canonical CBOR blob.
struct BookRow {
    book_id: u32,
    name: String,
    abbreviation: String,
    total_chapters: u32,
    chapters: Vec<u8>,
}

impl BookRow {
    fn encode(book: &Book) -> Result<Self> {
        Ok(Self {
            book_id: book.book_id,
            name: book.name.clone(),
            abbreviation: book.abbreviation.clone(),
            total_chapters: book.total_chapters,
            chapters: canonical_bytes(&book.chapters)?,
        })
    }

    fn decode(self) -> Result<Book> {
        let chapters: Vec<Chapter> = from_canonical_bytes(&self.chapters).map_err(|e| {
            StoreError::InvalidData(format!("chapters of book {}: {}", self.book_id, e))
        })?;

        Ok(Book {
            book_id: self.book_id,
            name: self.name,
            abbreviation: self.abbreviation,
            total_chapters: self.total_chapters,
            chapters,
        })
    }
}

// Helper to convert a row to a BookRow
fn row_to_book_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        book_id: row.get("book_id")?,
        name: row.get("name")?,
        abbreviation: row.get("abbreviation")?,
        total_chapters: row.get("total_chapters")?,
        chapters: row.get("chapters")?,
    })
}

fn read_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))?;
    let rows = stmt
        .query_map([], row_to_book_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(BookRow::decode).collect()
}

fn read_fingerprint(conn: &Connection) -> Result<Option<Fingerprint>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            params![DATA_HASH_KEY],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|v| {
            Fingerprint::from_hex(&v).map_err(|e| {
                StoreError::InvalidData(format!("malformed fingerprint record: {}", e))
            })
        })
        .transpose()
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    async fn get_all_books(&self) -> Result<Snapshot> {
        self.with_conn(|conn| Ok(Snapshot::new(read_books(conn)?)))
            .await
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT book_id, name, abbreviation, total_chapters FROM books ORDER BY id",
            )?;

            let books = stmt
                .query_map([], |row| {
                    Ok(BookSummary {
                        book_id: row.get(0)?,
                        name: row.get(1)?,
                        abbreviation: row.get(2)?,
                        total_chapters: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(books)
        })
        .await
    }

    async fn get_book(&self, book_id: u32) -> Result<Option<Book>> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM books WHERE book_id = ?1", BOOK_COLUMNS),
                params![book_id],
                row_to_book_row,
            )
            .optional()?
            .map(BookRow::decode)
            .transpose()
        })
        .await
    }

    async fn find_book_by_name(&self, name: &str) -> Result<Option<Book>> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {} FROM books WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
                    BOOK_COLUMNS
                ),
                params![name],
                row_to_book_row,
            )
            .optional()?
            .map(BookRow::decode)
            .transpose()
        })
        .await
    }

    async fn get_fingerprint(&self) -> Result<Option<Fingerprint>> {
        self.with_conn(|conn| read_fingerprint(conn)).await
    }

    async fn load_committed(&self) -> Result<Committed> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let books = read_books(&tx)?;
            let fingerprint = read_fingerprint(&tx)?;
            tx.commit()?;

            Ok(Committed {
                snapshot: Snapshot::new(books),
                fingerprint,
            })
        })
        .await
    }

    async fn replace_all(&self, snapshot: &Snapshot, fingerprint: &Fingerprint) -> Result<()> {
        // Encode before opening the transaction so encoding errors never
        // reach the database.
        let rows = snapshot
            .books()
            .iter()
            .map(BookRow::encode)
            .collect::<Result<Vec<_>>>()?;
        let fingerprint_hex = fingerprint.to_hex();
        let book_count = rows.len();

        self.with_conn(move |conn| {
            // Dropping the transaction without commit rolls it back.
            let tx = conn.transaction()?;

            tx.execute("DELETE FROM books", [])?;
            tx.execute("DELETE FROM metadata WHERE key = ?1", params![DATA_HASH_KEY])?;

            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO books ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                    BOOK_COLUMNS
                ))?;
                for row in &rows {
                    stmt.execute(params![
                        row.book_id,
                        row.name,
                        row.abbreviation,
                        row.total_chapters,
                        row.chapters,
                    ])?;
                }
            }

            tx.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
                params![DATA_HASH_KEY, fingerprint_hex],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::debug!(books = book_count, fingerprint = %fingerprint, "replaced stored snapshot");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM books", [])?;
            tx.execute("DELETE FROM metadata WHERE key = ?1", params![DATA_HASH_KEY])?;
            tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::debug!("cleared stored snapshot");
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now_millis()],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Integrity, StoreExt};
    use versecache_core::Verse;

    fn john(text: &str) -> Snapshot {
        Snapshot::new(vec![Book::new(
            43,
            "John",
            "Jn",
            vec![Chapter::new(1, vec![Verse::new(1, text)])],
        )])
    }

    fn two_books() -> Snapshot {
        Snapshot::new(vec![
            Book::new(1, "Genesis", "Gen", vec![Chapter::new(1, vec![Verse::new(1, "a")])]),
            Book::new(2, "Exodus", "Exod", vec![Chapter::new(1, vec![Verse::new(1, "b")])]),
        ])
    }

    async fn commit(store: &SqliteStore, snapshot: &Snapshot) -> Fingerprint {
        let fp = snapshot.fingerprint().unwrap();
        store.replace_all(snapshot, &fp).await.unwrap();
        fp
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = SqliteStore::open_memory().unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.get_all_books().await.unwrap().is_empty());
        assert_eq!(store.get_fingerprint().await.unwrap(), None);
        assert_eq!(store.verify_integrity().await.unwrap(), Integrity::Empty);
    }

    #[tokio::test]
    async fn test_replace_and_read() {
        let store = SqliteStore::open_memory().unwrap();
        let snapshot = two_books();
        let fp = commit(&store, &snapshot).await;

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get_all_books().await.unwrap(), snapshot);
        assert_eq!(store.get_fingerprint().await.unwrap(), Some(fp));

        let names: Vec<String> = store
            .list_books()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Genesis", "Exodus"]);
    }

    #[tokio::test]
    async fn test_replace_discards_previous_books() {
        let store = SqliteStore::open_memory().unwrap();
        commit(&store, &two_books()).await;

        let fp = commit(&store, &john("In the beginning...")).await;

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get_book(1).await.unwrap().is_none());
        assert_eq!(store.get_fingerprint().await.unwrap(), Some(fp));
    }

    #[tokio::test]
    async fn test_failed_replace_rolls_back() {
        let store = SqliteStore::open_memory().unwrap();
        let original = john("In the beginning...");
        let original_fp = commit(&store, &original).await;

        // The second insert violates UNIQUE(book_id) after the old rows
        // were already deleted inside the transaction.
        let duplicate = Snapshot::new(vec![
            Book::new(7, "First", "", vec![]),
            Book::new(7, "Second", "", vec![]),
        ]);
        let dup_fp = duplicate.fingerprint().unwrap();
        let result = store.replace_all(&duplicate, &dup_fp).await;
        assert!(matches!(result, Err(StoreError::Database(_))));

        assert_eq!(store.get_all_books().await.unwrap(), original);
        assert_eq!(store.get_fingerprint().await.unwrap(), Some(original_fp));
        assert!(store.verify_integrity().await.unwrap().is_verified());
    }

    #[tokio::test]
    async fn test_get_book_and_find_by_name() {
        let store = SqliteStore::open_memory().unwrap();
        commit(&store, &two_books()).await;

        let exodus = store.get_book(2).await.unwrap().unwrap();
        assert_eq!(exodus.name, "Exodus");
        assert_eq!(exodus.chapters[0].verses[0].text, "b");

        let genesis = store.find_book_by_name("genesis").await.unwrap().unwrap();
        assert_eq!(genesis.book_id, 1);

        assert!(store.find_book_by_name("Leviticus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_keeps_preferences() {
        let store = SqliteStore::open_memory().unwrap();
        commit(&store, &two_books()).await;
        store.set_preference("view", "{}").await.unwrap();

        store.clear().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.get_fingerprint().await.unwrap(), None);
        assert_eq!(
            store.get_preference("view").await.unwrap().as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn test_preference_upsert() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.get_preference("view").await.unwrap(), None);

        store.set_preference("view", "one").await.unwrap();
        store.set_preference("view", "two").await.unwrap();

        assert_eq!(
            store.get_preference("view").await.unwrap().as_deref(),
            Some("two")
        );
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");
        let snapshot = two_books();

        let fp = {
            let store = SqliteStore::open(&path).unwrap();
            commit(&store, &snapshot).await
        };

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get_all_books().await.unwrap(), snapshot);
        assert_eq!(reopened.get_fingerprint().await.unwrap(), Some(fp));
    }

    #[tokio::test]
    async fn test_malformed_fingerprint_record() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO metadata (key, value) VALUES ('dataHash', 'not-hex')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            store.get_fingerprint().await,
            Err(StoreError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_integrity_mismatch_detected() {
        let store = SqliteStore::open_memory().unwrap();
        let snapshot = two_books();
        let wrong = john("x").fingerprint().unwrap();
        store.replace_all(&snapshot, &wrong).await.unwrap();

        let integrity = store.verify_integrity().await.unwrap();
        assert!(matches!(integrity, Integrity::Mismatch { stored, .. } if stored == wrong));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_mixed_state() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let a = two_books();
        let b = john("In the beginning...");
        commit(&store, &a).await;

        let writer = {
            let store = Arc::clone(&store);
            let (a, b) = (a.clone(), b.clone());
            tokio::spawn(async move {
                for i in 0..25 {
                    let next = if i % 2 == 0 { &b } else { &a };
                    let fp = next.fingerprint().unwrap();
                    store.replace_all(next, &fp).await.unwrap();
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..3 {
            let store = Arc::clone(&store);
            let (a, b) = (a.clone(), b.clone());
            readers.push(tokio::spawn(async move {
                for _ in 0..25 {
                    let committed = store.load_committed().await.unwrap();
                    assert!(committed.snapshot == a || committed.snapshot == b);
                    assert_eq!(
                        committed.fingerprint,
                        Some(committed.snapshot.fingerprint().unwrap())
                    );
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }
}
