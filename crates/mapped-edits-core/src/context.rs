use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::{Position, Range, Uri, WorkspaceEdit};

/// A selection in the target document.
///
/// Unlike a [`Range`], a selection is directed: `anchor` is where the
/// selection started and `active` is where the cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub const fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    /// An empty selection (a cursor) at `position`.
    pub const fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    /// True when `active` comes before `anchor`.
    pub fn is_reversed(&self) -> bool {
        (self.active.line, self.active.character) < (self.anchor.line, self.anchor.character)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// The undirected range covered by this selection.
    pub fn range(&self) -> Range {
        if self.is_reversed() {
            Range::new(self.active, self.anchor)
        } else {
            Range::new(self.anchor, self.active)
        }
    }
}

/// A hint pointing at other code relevant to the mapping decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedContextItem {
    pub uri: Uri,
    pub range: Range,
}

/// Context handed to a provider alongside the code blocks.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::{MappedEditsContext, Selection};
/// use tower_lsp_server::ls_types::Position;
///
/// let context = MappedEditsContext {
///     selections: vec![Selection::caret(Position::new(3, 0))],
///     ..Default::default()
/// };
/// assert!(context.related.is_empty());
/// assert!(context.changes_before.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedEditsContext {
    /// Selections in the target document, in editor order.
    #[serde(default)]
    pub selections: Vec<Selection>,
    /// Related code, highest relevance first. Empty when nothing is known.
    #[serde(default)]
    pub related: Vec<RelatedContextItem>,
    /// Edit to be applied to the workspace before mapping runs.
    ///
    /// `None` means there is no prior edit, which is not the same thing as
    /// an empty edit.
    #[serde(default)]
    pub changes_before: Option<WorkspaceEdit>,
}
