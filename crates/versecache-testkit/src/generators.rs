//! Proptest generators for property-based testing.

use proptest::prelude::*;

use versecache_core::{Book, Chapter, Snapshot, Verse};

/// Generate verse text, including non-ASCII characters.
pub fn verse_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.;:'!?\u{e9}\u{3b1}-\u{3c9}]{0,60}".prop_map(String::from)
}

/// Generate a book name.
pub fn book_name() -> impl Strategy<Value = String> {
    "[1-3]? ?[A-Z][a-z]{2,12}".prop_map(String::from)
}

/// Generate verses numbered 1..=n.
pub fn verses(max: usize) -> impl Strategy<Value = Vec<Verse>> {
    prop::collection::vec(verse_text(), 0..=max).prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Verse::new(i as u32 + 1, text))
            .collect()
    })
}

/// Generate chapters numbered 1..=n.
pub fn chapters(max_chapters: usize, max_verses: usize) -> impl Strategy<Value = Vec<Chapter>> {
    prop::collection::vec(verses(max_verses), 0..=max_chapters).prop_map(|chapters| {
        chapters
            .into_iter()
            .enumerate()
            .map(|(i, verses)| Chapter::new(i as u32 + 1, verses))
            .collect()
    })
}

/// Generate a valid snapshot with up to `max_books` books.
///
/// Book ids are distinct but not contiguous, so code that confuses ids with
/// positions shows up.
pub fn snapshot(max_books: usize) -> impl Strategy<Value = Snapshot> {
    prop::collection::vec(
        (1u32..=10, book_name(), "[A-Z][a-z]{0,4}", chapters(4, 6)),
        0..=max_books,
    )
    .prop_map(|books| {
        let mut next_id = 0u32;
        books
            .into_iter()
            .map(|(gap, name, abbreviation, chapters)| {
                next_id += gap;
                Book::new(next_id, name, abbreviation, chapters)
            })
            .collect::<Vec<_>>()
            .into()
    })
}

/// A valid, non-trivial snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotParams {
    pub snapshot: Snapshot,
}

impl Arbitrary for SnapshotParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        snapshot(6)
            .prop_map(|snapshot| SnapshotParams { snapshot })
            .boxed()
    }
}
