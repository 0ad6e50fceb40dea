//! Persisted view preferences.
//!
//! What the reader was looking at: a book, a chapter, selected verses.
//! Stored as JSON beside the corpus but outside its consistency
//! guarantees, so a bad record only costs the reader their place.

use serde::{Deserialize, Serialize};
use versecache_store::{PreferenceStore, StoreError};

use crate::error::Result;

/// Preference key of the view record.
pub const VIEW_PREFERENCES_KEY: &str = "view";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewPreferences {
    /// Name of the selected book.
    pub selected_book: String,
    pub selected_chapter: u32,
    /// Texts of the selected verses, in selection order.
    pub selected_verses: Vec<String>,
    pub search_query: String,
    pub sidebar_open: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            selected_book: "John".to_string(),
            selected_chapter: 1,
            selected_verses: Vec::new(),
            search_query: String::new(),
            sidebar_open: false,
        }
    }
}

impl ViewPreferences {
    /// Read the stored preferences.
    ///
    /// A missing or unreadable record yields the defaults.
    pub async fn load<P: PreferenceStore + ?Sized>(
        store: &P,
    ) -> std::result::Result<Self, StoreError> {
        let Some(raw) = store.get_preference(VIEW_PREFERENCES_KEY).await? else {
            return Ok(Self::default());
        };

        match serde_json::from_str(&raw) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable view preferences");
                Ok(Self::default())
            }
        }
    }

    pub async fn save<P: PreferenceStore + ?Sized>(&self, store: &P) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        store.set_preference(VIEW_PREFERENCES_KEY, &raw).await?;
        Ok(())
    }

    /// Switch book. Starts at chapter 1 with nothing selected.
    pub fn select_book(&mut self, name: impl Into<String>) {
        self.selected_book = name.into();
        self.selected_chapter = 1;
        self.selected_verses.clear();
    }

    /// Switch chapter within the current book.
    pub fn select_chapter(&mut self, chapter: u32) {
        self.selected_chapter = chapter;
        self.selected_verses.clear();
    }

    /// Select a verse, or deselect it if already selected.
    pub fn toggle_verse(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(pos) = self.selected_verses.iter().position(|v| *v == text) {
            self.selected_verses.remove(pos);
        } else {
            self.selected_verses.push(text);
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }
}
