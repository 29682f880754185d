//! Remote shapes implemented on top of a [`Peer`].

use async_trait::async_trait;
use mapped_edits_core::{
    DocumentDataDto, DocumentFilter, ExtHostDocumentsShape, ExtHostMappedEditsShape,
    MainThreadMappedEditsShape, MappedEditsContextDto, MappedEditsError, ProviderHandle, Result,
    UriComponents, WorkspaceEditDto,
};
use tokio_util::sync::CancellationToken;

use crate::message::{Call, Notification, Outcome};
use crate::peer::Peer;

/// The extension host as seen from the main side.
#[derive(Debug, Clone)]
pub struct ExtHostProxy {
    peer: Peer,
}

impl ExtHostProxy {
    pub fn new(peer: Peer) -> Self {
        Self { peer }
    }
}

#[async_trait]
impl ExtHostMappedEditsShape for ExtHostProxy {
    async fn provide_mapped_edits(
        &self,
        handle: ProviderHandle,
        document: UriComponents,
        code_blocks: Vec<String>,
        context: MappedEditsContextDto,
        token: CancellationToken,
    ) -> Result<Option<WorkspaceEditDto>> {
        let call = Call::ProvideMappedEdits {
            handle,
            uri: document,
            code_blocks,
            context,
        };
        match self.peer.call(call, &token).await? {
            Outcome::Edits { edit } => Ok(edit),
            Outcome::Cancelled => Ok(None),
            Outcome::Failed { message } => Err(MappedEditsError::provider_failure(handle, message)),
        }
    }
}

impl ExtHostDocumentsShape for ExtHostProxy {
    fn accept_document_opened(&self, data: DocumentDataDto) -> Result<()> {
        self.peer.notify(Notification::DocumentOpened(data))
    }

    fn accept_document_changed(
        &self,
        uri: UriComponents,
        version: i32,
        text: String,
    ) -> Result<()> {
        self.peer
            .notify(Notification::DocumentChanged { uri, version, text })
    }

    fn accept_document_closed(&self, uri: UriComponents) -> Result<()> {
        self.peer.notify(Notification::DocumentClosed { uri })
    }
}

/// The main side as seen from the extension host.
#[derive(Debug, Clone)]
pub struct MainThreadProxy {
    peer: Peer,
}

impl MainThreadProxy {
    pub fn new(peer: Peer) -> Self {
        Self { peer }
    }
}

impl MainThreadMappedEditsShape for MainThreadProxy {
    fn register_provider(
        &self,
        handle: ProviderHandle,
        selector: Vec<DocumentFilter>,
    ) -> Result<()> {
        self.peer
            .notify(Notification::RegisterProvider { handle, selector })
    }

    fn unregister_provider(&self, handle: ProviderHandle) -> Result<()> {
        self.peer
            .notify(Notification::UnregisterProvider { handle })
    }
}
