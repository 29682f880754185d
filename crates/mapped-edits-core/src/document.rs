//! In-memory text documents.

use dashmap::DashMap;
use std::sync::Arc;
use tower_lsp_server::ls_types::{Position, Uri};

/// Snapshot of an open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    uri: Uri,
    language_id: String,
    version: i32,
    text: String,
}

impl TextDocument {
    pub fn new(
        uri: Uri,
        language_id: impl Into<String>,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            version,
            text: text.into(),
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> u32 {
        self.text.split('\n').count() as u32
    }

    /// Position just past the last character, in UTF-16 code units.
    pub fn end_position(&self) -> Position {
        let (line, last) = match self.text.rfind('\n') {
            Some(idx) => (self.line_count() - 1, &self.text[idx + 1..]),
            None => (0, self.text.as_str()),
        };
        let character = last.chars().map(char::len_utf16).sum::<usize>() as u32;
        Position::new(line, character)
    }

    /// Returns a copy with new content and version.
    pub fn with_text(&self, version: i32, text: impl Into<String>) -> Self {
        Self {
            uri: self.uri.clone(),
            language_id: self.language_id.clone(),
            version,
            text: text.into(),
        }
    }
}

/// Source of document snapshots.
pub trait DocumentStore: Send + Sync {
    /// Returns the current snapshot, or `None` when the document is not open.
    fn get_document(&self, uri: &Uri) -> Option<Arc<TextDocument>>;
}

/// Concurrent table of open documents.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::{DocumentStore, Documents, TextDocument};
/// use std::str::FromStr;
/// use tower_lsp_server::ls_types::Uri;
///
/// let documents = Documents::new();
/// let uri = Uri::from_str("file:///main.py").unwrap();
/// documents.open(TextDocument::new(uri.clone(), "python", 1, "print()"));
///
/// assert_eq!(documents.get_document(&uri).unwrap().version(), 1);
/// documents.close(&uri);
/// assert!(documents.get_document(&uri).is_none());
/// ```
#[derive(Debug, Default)]
pub struct Documents {
    documents: DashMap<Uri, Arc<TextDocument>>,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, document: TextDocument) {
        self.documents
            .insert(document.uri().clone(), Arc::new(document));
    }

    /// Replaces the content of an open document.
    ///
    /// Returns `false` if the document is not open. Out-of-order updates
    /// (older version than the stored one) are ignored.
    pub fn change(&self, uri: &Uri, version: i32, text: String) -> bool {
        let Some(mut entry) = self.documents.get_mut(uri) else {
            return false;
        };
        if version < entry.version() {
            tracing::debug!(
                "ignoring stale change for {} (version {} < {})",
                uri.as_str(),
                version,
                entry.version()
            );
            return true;
        }
        let updated = entry.with_text(version, text);
        *entry = Arc::new(updated);
        true
    }

    pub fn close(&self, uri: &Uri) -> Option<Arc<TextDocument>> {
        self.documents.remove(uri).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for Documents {
    fn get_document(&self, uri: &Uri) -> Option<Arc<TextDocument>> {
        self.documents.get(uri).map(|doc| Arc::clone(&doc))
    }
}
