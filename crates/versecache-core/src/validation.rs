//! Structural validation of snapshots.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::Snapshot;

/// Check the uniqueness and numbering invariants of a snapshot.
///
/// - Book ids are unique within the snapshot.
/// - Chapter numbers are 1-based and unique within their book.
/// - Verse numbers are 1-based and unique within their chapter.
///
/// `totalChapters` is advisory and not checked here.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ValidationError> {
    let mut book_ids = HashSet::with_capacity(snapshot.len());

    for book in snapshot.books() {
        if !book_ids.insert(book.book_id) {
            return Err(ValidationError::DuplicateBook(book.book_id));
        }

        let mut chapter_numbers = HashSet::with_capacity(book.chapters.len());
        for chapter in &book.chapters {
            if chapter.chapter_number == 0 {
                return Err(ValidationError::InvalidChapterNumber {
                    book_id: book.book_id,
                    chapter: chapter.chapter_number,
                });
            }
            if !chapter_numbers.insert(chapter.chapter_number) {
                return Err(ValidationError::DuplicateChapter {
                    book_id: book.book_id,
                    chapter: chapter.chapter_number,
                });
            }

            let mut verse_numbers = HashSet::with_capacity(chapter.verses.len());
            for verse in &chapter.verses {
                if verse.verse_number == 0 {
                    return Err(ValidationError::InvalidVerseNumber {
                        book_id: book.book_id,
                        chapter: chapter.chapter_number,
                        verse: verse.verse_number,
                    });
                }
                if !verse_numbers.insert(verse.verse_number) {
                    return Err(ValidationError::DuplicateVerse {
                        book_id: book.book_id,
                        chapter: chapter.chapter_number,
                        verse: verse.verse_number,
                    });
                }
            }
        }
    }

    Ok(())
}
