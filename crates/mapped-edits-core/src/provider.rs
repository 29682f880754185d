use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::WorkspaceEdit;

use crate::context::MappedEditsContext;
use crate::document::TextDocument;
use crate::error::Result;

/// Capability trait implemented by every mapped edits provider.
///
/// A provider turns raw code blocks (typically taken from a chat reply) into
/// concrete edits against `document`. How it does that is up to the
/// implementation.
///
/// Returning `Ok(None)` means "no edits" and is not an error. Cancellation
/// is cooperative: a provider should check `token` and return `Ok(None)`
/// once it is cancelled.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use mapped_edits_core::{
///     CancellationToken, MappedEditsContext, MappedEditsProvider, Result, TextDocument,
/// };
/// use std::collections::HashMap;
/// use tower_lsp_server::ls_types::{Position, Range, TextEdit, WorkspaceEdit};
///
/// struct Prepend;
///
/// #[async_trait]
/// impl MappedEditsProvider for Prepend {
///     async fn provide_mapped_edits(
///         &self,
///         document: &TextDocument,
///         code_blocks: &[String],
///         _context: &MappedEditsContext,
///         token: &CancellationToken,
///     ) -> Result<Option<WorkspaceEdit>> {
///         if token.is_cancelled() || code_blocks.is_empty() {
///             return Ok(None);
///         }
///         let start = Position::new(0, 0);
///         let edit = TextEdit::new(Range::new(start, start), code_blocks.join("\n"));
///         let mut changes = HashMap::new();
///         changes.insert(document.uri().clone(), vec![edit]);
///         Ok(Some(WorkspaceEdit::new(changes)))
///     }
/// }
/// ```
#[async_trait]
pub trait MappedEditsProvider: Send + Sync {
    async fn provide_mapped_edits(
        &self,
        document: &TextDocument,
        code_blocks: &[String],
        context: &MappedEditsContext,
        token: &CancellationToken,
    ) -> Result<Option<WorkspaceEdit>>;
}
