//! Error types for VerseCache Core.

use thiserror::Error;

/// Errors raised while encoding or fingerprinting a value.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("non-finite float cannot be canonically encoded")]
    NonFiniteFloat,

    #[error("unsupported value in canonical encoding: {0}")]
    Unsupported(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Structural problems in a snapshot that parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("book {0} appears more than once")]
    DuplicateBook(u32),

    #[error("book {book_id} has chapter {chapter} more than once")]
    DuplicateChapter { book_id: u32, chapter: u32 },

    #[error("book {book_id} chapter {chapter} has verse {verse} more than once")]
    DuplicateVerse { book_id: u32, chapter: u32, verse: u32 },

    #[error("book {book_id} has invalid chapter number {chapter} (chapters are 1-based)")]
    InvalidChapterNumber { book_id: u32, chapter: u32 },

    #[error("book {book_id} chapter {chapter} has invalid verse number {verse} (verses are 1-based)")]
    InvalidVerseNumber { book_id: u32, chapter: u32, verse: u32 },
}
