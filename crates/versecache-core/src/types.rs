//! Corpus data model.
//!
//! Field names serialize in camelCase. The PascalCase spelling used by the
//! first published corpus (`BookID`, `BookName`, `Chapters`, ...) is accepted
//! on input, so both spellings of the same content encode identically.
//! Numbers may arrive as whole floats (`1.0`); they read as integers.

use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fingerprint::{fingerprint, Fingerprint};

/// A single verse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verse {
    /// 1-based position within the chapter.
    #[serde(
        rename = "verseNumber",
        alias = "VerseNumber",
        deserialize_with = "whole_number"
    )]
    pub verse_number: u32,
    #[serde(alias = "Text")]
    pub text: String,
}

impl Verse {
    pub fn new(verse_number: u32, text: impl Into<String>) -> Self {
        Self {
            verse_number,
            text: text.into(),
        }
    }
}

/// A chapter and its verses, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based position within the book.
    #[serde(
        rename = "chapterNumber",
        alias = "ChapterNumber",
        deserialize_with = "whole_number"
    )]
    pub chapter_number: u32,
    #[serde(alias = "Verses")]
    pub verses: Vec<Verse>,
}

impl Chapter {
    pub fn new(chapter_number: u32, verses: Vec<Verse>) -> Self {
        Self {
            chapter_number,
            verses,
        }
    }
}

/// A book of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BookRepr")]
pub struct Book {
    #[serde(rename = "bookId")]
    pub book_id: u32,
    pub name: String,
    pub abbreviation: String,
    #[serde(rename = "totalChapters")]
    pub total_chapters: u32,
    pub chapters: Vec<Chapter>,
}

impl Book {
    /// Create a book whose `total_chapters` matches the chapters given.
    pub fn new(
        book_id: u32,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Self {
        Self {
            book_id,
            name: name.into(),
            abbreviation: abbreviation.into(),
            total_chapters: chapters.len() as u32,
            chapters,
        }
    }

    /// Look up a chapter by number.
    pub fn chapter(&self, chapter_number: u32) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.chapter_number == chapter_number)
    }

    /// True when the advertised chapter count disagrees with the chapters present.
    pub fn has_chapter_count_mismatch(&self) -> bool {
        self.total_chapters as usize != self.chapters.len()
    }

    /// The listing view of this book.
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            book_id: self.book_id,
            name: self.name.clone(),
            abbreviation: self.abbreviation.clone(),
            total_chapters: self.total_chapters,
        }
    }
}

/// Wire shape of a book: optional fields and legacy spellings.
#[derive(Deserialize)]
struct BookRepr {
    #[serde(rename = "bookId", alias = "BookID", deserialize_with = "whole_number")]
    book_id: u32,
    #[serde(alias = "BookName")]
    name: String,
    #[serde(default, alias = "Abbreviation")]
    abbreviation: String,
    #[serde(rename = "totalChapters", alias = "TotalChapters", default)]
    total_chapters: Option<WholeNumber>,
    #[serde(alias = "Chapters")]
    chapters: Vec<Chapter>,
}

impl From<BookRepr> for Book {
    fn from(repr: BookRepr) -> Self {
        let total_chapters = repr
            .total_chapters
            .map(|n| n.0)
            .unwrap_or(repr.chapters.len() as u32);
        Self {
            book_id: repr.book_id,
            name: repr.name,
            abbreviation: repr.abbreviation,
            total_chapters,
            chapters: repr.chapters,
        }
    }
}

/// A `u32` that also accepts an integral float such as `3.0`.
struct WholeNumber(u32);

impl<'de> Deserialize<'de> for WholeNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WholeNumberVisitor).map(WholeNumber)
    }
}

struct WholeNumberVisitor;

impl<'de> Visitor<'de> for WholeNumberVisitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative whole number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
        // NaN and infinities have a NaN fractional part.
        if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
            Ok(v as u32)
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    WholeNumber::deserialize(deserializer).map(|n| n.0)
}

/// A book without its chapters, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookSummary {
    #[serde(rename = "bookId")]
    pub book_id: u32,
    pub name: String,
    pub abbreviation: String,
    #[serde(rename = "totalChapters")]
    pub total_chapters: u32,
}

/// The whole corpus as of one fetch.
///
/// A snapshot is never edited in place: there are no mutable accessors, and
/// a different corpus is a different `Snapshot` with a different fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    books: Vec<Book>,
}

impl Snapshot {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn into_books(self) -> Vec<Book> {
        self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Look up a book by id.
    pub fn book(&self, book_id: u32) -> Option<&Book> {
        self.books.iter().find(|b| b.book_id == book_id)
    }

    /// Total number of verses across all books.
    pub fn verse_count(&self) -> usize {
        self.books
            .iter()
            .flat_map(|b| &b.chapters)
            .map(|c| c.verses.len())
            .sum()
    }

    /// Compute this snapshot's fingerprint.
    pub fn fingerprint(&self) -> Result<Fingerprint, CoreError> {
        fingerprint(self)
    }
}

impl From<Vec<Book>> for Snapshot {
    fn from(books: Vec<Book>) -> Self {
        Self::new(books)
    }
}
