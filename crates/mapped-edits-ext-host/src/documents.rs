//! Extension host mirror of the documents open on the main side.

use mapped_edits_core::{
    DocumentDataDto, DocumentStore, Documents, ExtHostDocumentsShape, Result, TextDocument,
    UriComponents, UriIdentity,
};
use std::sync::Arc;
use tower_lsp_server::ls_types::Uri;

/// Documents mirrored from the main side, keyed by canonical URI.
pub struct ExtHostDocuments {
    documents: Documents,
    identity: Arc<dyn UriIdentity>,
}

impl ExtHostDocuments {
    pub fn new(identity: Arc<dyn UriIdentity>) -> Self {
        Self {
            documents: Documents::new(),
            identity,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ExtHostDocumentsShape for ExtHostDocuments {
    fn accept_document_opened(&self, data: DocumentDataDto) -> Result<()> {
        let uri = self.identity.revive(&data.uri)?;
        tracing::debug!(
            "document opened: {} (version {})",
            uri.as_str(),
            data.version
        );
        self.documents
            .open(TextDocument::new(uri, data.language_id, data.version, data.text));
        Ok(())
    }

    fn accept_document_changed(
        &self,
        uri: UriComponents,
        version: i32,
        text: String,
    ) -> Result<()> {
        let uri = self.identity.revive(&uri)?;
        if !self.documents.change(&uri, version, text) {
            tracing::debug!("change for document that is not open: {}", uri.as_str());
        }
        Ok(())
    }

    fn accept_document_closed(&self, uri: UriComponents) -> Result<()> {
        let uri = self.identity.revive(&uri)?;
        self.documents.close(&uri);
        Ok(())
    }
}

impl DocumentStore for ExtHostDocuments {
    fn get_document(&self, uri: &Uri) -> Option<Arc<TextDocument>> {
        self.documents.get_document(uri)
    }
}
