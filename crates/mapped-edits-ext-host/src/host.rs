use mapped_edits_core::{ProviderHandle, Result, UriIdentity};
use mapped_edits_rpc::{Connection, ExtHostDispatcher, MainThreadProxy};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::builtin::InsertAtSelectionProvider;
use crate::documents::ExtHostDocuments;
use crate::mapped_edits::ExtHostMappedEdits;

/// Extension host bound to one connection to the main side.
///
/// Providers may be registered before [`serve`](Self::serve) is called;
/// their registrations are queued and sent once the connection runs.
pub struct ExtensionHost<R, W> {
    mapped_edits: Arc<ExtHostMappedEdits>,
    documents: Arc<ExtHostDocuments>,
    connection: Connection<R, W>,
}

impl<R, W> ExtensionHost<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W, identity: Arc<dyn UriIdentity>) -> Self {
        let (peer, connection) = Connection::new(reader, writer);
        let documents = Arc::new(ExtHostDocuments::new(Arc::clone(&identity)));
        let mapped_edits = Arc::new(ExtHostMappedEdits::new(
            Arc::new(MainThreadProxy::new(peer)),
            documents.clone(),
            identity,
        ));

        Self {
            mapped_edits,
            documents,
            connection,
        }
    }

    pub fn mapped_edits(&self) -> Arc<ExtHostMappedEdits> {
        Arc::clone(&self.mapped_edits)
    }

    pub fn documents(&self) -> Arc<ExtHostDocuments> {
        Arc::clone(&self.documents)
    }

    /// Registers the providers that ship with the extension host.
    pub fn register_builtin_providers(&self) -> Result<Vec<ProviderHandle>> {
        let handle = self.mapped_edits.register_mapped_edits_provider(
            InsertAtSelectionProvider::selector(),
            Arc::new(InsertAtSelectionProvider),
        )?;
        Ok(vec![handle])
    }

    /// Serves the main side until it disconnects, then releases every
    /// provider.
    pub async fn serve(self) -> Result<()> {
        let dispatcher = ExtHostDispatcher::new(self.mapped_edits.clone(), self.documents.clone());
        let result = self.connection.serve(Arc::new(dispatcher)).await;
        self.mapped_edits.dispose();
        result
    }
}
