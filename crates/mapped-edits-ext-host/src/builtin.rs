//! Providers that ship with the extension host.

use async_trait::async_trait;
use mapped_edits_core::{
    DocumentFilter, MappedEditsContext, MappedEditsProvider, Result, TextDocument,
};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Range, TextEdit, WorkspaceEdit};

/// Fallback provider that puts the code where the user is.
///
/// The code blocks are joined with newlines and replace the primary
/// selection. Without a selection the code is appended at the end of the
/// document.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertAtSelectionProvider;

impl InsertAtSelectionProvider {
    /// Matches every language, so any more specific provider wins.
    pub fn selector() -> Vec<DocumentFilter> {
        vec![DocumentFilter::language("*")]
    }
}

#[async_trait]
impl MappedEditsProvider for InsertAtSelectionProvider {
    async fn provide_mapped_edits(
        &self,
        document: &TextDocument,
        code_blocks: &[String],
        context: &MappedEditsContext,
        token: &CancellationToken,
    ) -> Result<Option<WorkspaceEdit>> {
        if token.is_cancelled() || code_blocks.iter().all(|block| block.is_empty()) {
            return Ok(None);
        }

        let range = match context.selections.first() {
            Some(selection) => selection.range(),
            None => {
                let end = document.end_position();
                Range::new(end, end)
            }
        };

        let mut changes = HashMap::new();
        changes.insert(
            document.uri().clone(),
            vec![TextEdit::new(range, code_blocks.join("\n"))],
        );
        Ok(Some(WorkspaceEdit::new(changes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapped_edits_core::Selection;
    use std::str::FromStr;
    use tower_lsp_server::ls_types::{Position, Uri};

    fn document(text: &str) -> TextDocument {
        TextDocument::new(Uri::from_str("file:///a.py").unwrap(), "python", 1, text)
    }

    fn single_edit(edit: WorkspaceEdit) -> TextEdit {
        let mut changes = edit.changes.unwrap();
        assert_eq!(changes.len(), 1);
        let mut edits = changes.drain().next().unwrap().1;
        assert_eq!(edits.len(), 1);
        edits.remove(0)
    }

    #[tokio::test]
    async fn test_replaces_primary_selection() {
        let context = MappedEditsContext {
            selections: vec![
                Selection::new(Position::new(3, 0), Position::new(1, 0)),
                Selection::caret(Position::new(9, 0)),
            ],
            ..Default::default()
        };
        let edit = InsertAtSelectionProvider
            .provide_mapped_edits(
                &document("a\nb\nc\nd\n"),
                &["x = 1".into(), "y = 2".into()],
                &context,
                &CancellationToken::new(),
            )
            .await
            .unwrap()
            .unwrap();

        let edit = single_edit(edit);
        assert_eq!(
            edit.range,
            Range::new(Position::new(1, 0), Position::new(3, 0))
        );
        assert_eq!(edit.new_text, "x = 1\ny = 2");
    }

    #[tokio::test]
    async fn test_appends_without_selection() {
        let edit = InsertAtSelectionProvider
            .provide_mapped_edits(
                &document("import os\nprint(os)"),
                &["pass".into()],
                &MappedEditsContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap()
            .unwrap();

        let edit = single_edit(edit);
        let end = Position::new(1, 9);
        assert_eq!(edit.range, Range::new(end, end));
    }

    #[tokio::test]
    async fn test_nothing_to_insert() {
        let result = InsertAtSelectionProvider
            .provide_mapped_edits(
                &document(""),
                &[String::new()],
                &MappedEditsContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let result = tokio_test::block_on(InsertAtSelectionProvider.provide_mapped_edits(
            &document("x"),
            &["y".into()],
            &MappedEditsContext::default(),
            &token,
        ))
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_selector_is_wildcard_language() {
        assert_eq!(
            InsertAtSelectionProvider::selector(),
            vec![DocumentFilter::language("*")]
        );
    }
}
