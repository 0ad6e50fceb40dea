//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use versecache_core::{Book, Chapter, Fingerprint, Snapshot, Verse};
use versecache_store::{ContentStore, MemoryStore};
use versecache_sync::{MemorySource, SyncConfig, SyncCoordinator};

/// URL the fixture source publishes at.
pub const FIXTURE_URL: &str = "mem://bible.json";

/// Names and abbreviations of the 66 books, in canonical order.
pub const BOOK_NAMES: [(&str, &str); 66] = [
    ("Genesis", "Gen"),
    ("Exodus", "Exod"),
    ("Leviticus", "Lev"),
    ("Numbers", "Num"),
    ("Deuteronomy", "Deut"),
    ("Joshua", "Josh"),
    ("Judges", "Judg"),
    ("Ruth", "Ruth"),
    ("1 Samuel", "1Sam"),
    ("2 Samuel", "2Sam"),
    ("1 Kings", "1Kgs"),
    ("2 Kings", "2Kgs"),
    ("1 Chronicles", "1Chr"),
    ("2 Chronicles", "2Chr"),
    ("Ezra", "Ezra"),
    ("Nehemiah", "Neh"),
    ("Esther", "Esth"),
    ("Job", "Job"),
    ("Psalms", "Ps"),
    ("Proverbs", "Prov"),
    ("Ecclesiastes", "Eccl"),
    ("Song of Solomon", "Song"),
    ("Isaiah", "Isa"),
    ("Jeremiah", "Jer"),
    ("Lamentations", "Lam"),
    ("Ezekiel", "Ezek"),
    ("Daniel", "Dan"),
    ("Hosea", "Hos"),
    ("Joel", "Joel"),
    ("Amos", "Amos"),
    ("Obadiah", "Obad"),
    ("Jonah", "Jonah"),
    ("Micah", "Mic"),
    ("Nahum", "Nah"),
    ("Habakkuk", "Hab"),
    ("Zephaniah", "Zeph"),
    ("Haggai", "Hag"),
    ("Zechariah", "Zech"),
    ("Malachi", "Mal"),
    ("Matthew", "Matt"),
    ("Mark", "Mark"),
    ("Luke", "Luke"),
    ("John", "John"),
    ("Acts", "Acts"),
    ("Romans", "Rom"),
    ("1 Corinthians", "1Cor"),
    ("2 Corinthians", "2Cor"),
    ("Galatians", "Gal"),
    ("Ephesians", "Eph"),
    ("Philippians", "Phil"),
    ("Colossians", "Col"),
    ("1 Thessalonians", "1Thess"),
    ("2 Thessalonians", "2Thess"),
    ("1 Timothy", "1Tim"),
    ("2 Timothy", "2Tim"),
    ("Titus", "Titus"),
    ("Philemon", "Phlm"),
    ("Hebrews", "Heb"),
    ("James", "Jas"),
    ("1 Peter", "1Pet"),
    ("2 Peter", "2Pet"),
    ("1 John", "1John"),
    ("2 John", "2John"),
    ("3 John", "3John"),
    ("Jude", "Jude"),
    ("Revelation", "Rev"),
];

/// A one-book snapshot: John 1:1 with the given text, under book id 1.
pub fn john_snapshot(text: &str) -> Snapshot {
    Snapshot::new(vec![Book::new(
        1,
        "John",
        "",
        vec![Chapter::new(1, vec![Verse::new(1, text)])],
    )])
}

/// The first `books` books of the canon, ids 1-based in canonical order,
/// each with two short chapters of three verses.
pub fn sample_corpus(books: usize) -> Snapshot {
    BOOK_NAMES
        .iter()
        .take(books)
        .enumerate()
        .map(|(i, (name, abbreviation))| {
            let chapters = (1..=2)
                .map(|c| {
                    let verses = (1..=3)
                        .map(|v| Verse::new(v, format!("{} {}:{}", name, c, v)))
                        .collect();
                    Chapter::new(c, verses)
                })
                .collect();
            Book::new(i as u32 + 1, *name, *abbreviation, chapters)
        })
        .collect::<Vec<_>>()
        .into()
}

/// All 66 books.
pub fn full_corpus() -> Snapshot {
    sample_corpus(BOOK_NAMES.len())
}

/// A memory store and a memory source wired to one URL.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub source: Arc<MemorySource>,
    pub url: String,
}

impl TestFixture {
    /// Empty store, nothing published.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            source: Arc::new(MemorySource::new()),
            url: FIXTURE_URL.to_string(),
        }
    }

    /// Empty store, `remote` published at the fixture URL.
    pub async fn with_remote(remote: &Snapshot) -> Self {
        let fixture = Self::new();
        fixture.publish(remote).await;
        fixture
    }

    /// Publish `snapshot` as the remote document.
    pub async fn publish(&self, snapshot: &Snapshot) {
        self.source
            .publish_json(&self.url, snapshot)
            .await
            .expect("snapshot serializes to JSON");
    }

    /// Commit `snapshot` to the store directly, as an earlier sync would have.
    pub async fn commit(&self, snapshot: &Snapshot) -> Fingerprint {
        let fingerprint = snapshot.fingerprint().expect("snapshot has a fingerprint");
        self.store
            .replace_all(snapshot, &fingerprint)
            .await
            .expect("memory store accepts snapshot");
        fingerprint
    }

    /// A coordinator over the fixture's store and source.
    pub fn coordinator(&self, config: SyncConfig) -> SyncCoordinator<MemoryStore, Arc<MemorySource>> {
        SyncCoordinator::new(Arc::clone(&self.store), Arc::clone(&self.source), config)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
