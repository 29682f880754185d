//! Shapes of the two sides of the process boundary.
//!
//! Each side implements the shape it serves and talks to the other through
//! a proxy implementing the opposite shape. Everything crossing the boundary
//! is in wire form.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::registry::ProviderHandle;
use crate::selector::DocumentFilter;
use crate::uri::UriComponents;
use crate::wire::{DocumentDataDto, MappedEditsContextDto, WorkspaceEditDto};

/// Calls served by the main side (extension host to main).
pub trait MainThreadMappedEditsShape: Send + Sync {
    fn register_provider(
        &self,
        handle: ProviderHandle,
        selector: Vec<DocumentFilter>,
    ) -> Result<()>;

    fn unregister_provider(&self, handle: ProviderHandle) -> Result<()>;
}

/// Calls served by the extension host (main to extension host).
#[async_trait]
pub trait ExtHostMappedEditsShape: Send + Sync {
    /// Runs the provider registered under `handle`.
    ///
    /// Unknown handles, unavailable documents and cancellation all yield
    /// `Ok(None)`. Only a failing provider produces an error.
    async fn provide_mapped_edits(
        &self,
        handle: ProviderHandle,
        document: UriComponents,
        code_blocks: Vec<String>,
        context: MappedEditsContextDto,
        token: CancellationToken,
    ) -> Result<Option<WorkspaceEditDto>>;
}

/// Document lifecycle mirrored from the main side to the extension host.
pub trait ExtHostDocumentsShape: Send + Sync {
    fn accept_document_opened(&self, data: DocumentDataDto) -> Result<()>;

    fn accept_document_changed(
        &self,
        uri: UriComponents,
        version: i32,
        text: String,
    ) -> Result<()>;

    fn accept_document_closed(&self, uri: UriComponents) -> Result<()>;
}
