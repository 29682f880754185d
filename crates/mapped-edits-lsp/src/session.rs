use mapped_edits_core::{
    DocumentDataDto, DocumentStore, Documents, ExtHostDocumentsShape, MappedEditsContext, Result,
    TextDocument, UriIdentity, UriIdentityService,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{Uri, WorkspaceEdit};

use crate::config::MappedEditsConfig;
use crate::ext_host::ExtHostLink;
use crate::service::MappedEditsService;

/// Everything the server needs once the client has initialized it.
///
/// Open documents are tracked here and mirrored to the extension host, so
/// both sides see the same text when a provider runs.
pub struct Session {
    identity: Arc<dyn UriIdentity>,
    documents: Documents,
    service: Arc<MappedEditsService>,
    ext_host: ExtHostLink,
}

impl Session {
    pub fn start(config: &MappedEditsConfig) -> Result<Self> {
        let identity: Arc<dyn UriIdentity> =
            Arc::new(UriIdentityService::new(config.ignore_path_casing));
        let service = Arc::new(MappedEditsService::new(Arc::clone(&identity)));
        let ext_host = ExtHostLink::launch(config, Arc::clone(&service), Arc::clone(&identity))?;

        Ok(Self {
            identity,
            documents: Documents::new(),
            service,
            ext_host,
        })
    }

    pub fn service(&self) -> &Arc<MappedEditsService> {
        &self.service
    }

    pub fn documents(&self) -> &Documents {
        &self.documents
    }

    pub fn did_open(&self, document: TextDocument) -> Result<()> {
        let data = DocumentDataDto {
            uri: self.identity.to_components(document.uri())?,
            language_id: document.language_id().to_string(),
            version: document.version(),
            text: document.text().to_string(),
        };
        self.documents.open(document);
        self.ext_host.proxy().accept_document_opened(data)
    }

    pub fn did_change(&self, uri: &Uri, version: i32, text: String) -> Result<()> {
        if !self.documents.change(uri, version, text.clone()) {
            tracing::debug!("change for unopened document {}", uri.as_str());
            return Ok(());
        }
        let uri = self.identity.to_components(uri)?;
        self.ext_host
            .proxy()
            .accept_document_changed(uri, version, text)
    }

    pub fn did_close(&self, uri: &Uri) -> Result<()> {
        if self.documents.close(uri).is_none() {
            return Ok(());
        }
        let uri = self.identity.to_components(uri)?;
        self.ext_host.proxy().accept_document_closed(uri)
    }

    /// Maps `code_blocks` into edits for an open document.
    ///
    /// Unknown documents and requests no provider claims yield `Ok(None)`.
    pub async fn provide_mapped_edits(
        &self,
        uri: &Uri,
        code_blocks: &[String],
        context: &MappedEditsContext,
        token: &CancellationToken,
    ) -> Result<Option<WorkspaceEdit>> {
        let Some(document) = self.documents.get_document(uri) else {
            tracing::debug!(
                "mapped edits requested for unopened document {}",
                uri.as_str()
            );
            return Ok(None);
        };
        self.service
            .provide_mapped_edits(&document, code_blocks, context, token)
            .await
    }

    pub async fn shutdown(&self) {
        self.ext_host.shutdown().await;
    }
}
