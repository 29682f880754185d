//! Main side of the provider registration protocol.

use async_trait::async_trait;
use mapped_edits_core::{
    DocumentFilter, DocumentSelector, ExtHostMappedEditsShape, MainThreadMappedEditsShape,
    MappedEditsContext, MappedEditsProvider, ProviderHandle, ProviderRegistry, Result,
    TextDocument, UriIdentity, context_to_wire, workspace_edit_from_wire,
};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::WorkspaceEdit;

use crate::service::MappedEditsService;

/// Stands in for a provider that lives in the extension host.
pub struct RemoteMappedEditsProvider {
    handle: ProviderHandle,
    ext_host: Arc<dyn ExtHostMappedEditsShape>,
    identity: Arc<dyn UriIdentity>,
}

impl RemoteMappedEditsProvider {
    pub fn new(
        handle: ProviderHandle,
        ext_host: Arc<dyn ExtHostMappedEditsShape>,
        identity: Arc<dyn UriIdentity>,
    ) -> Self {
        Self {
            handle,
            ext_host,
            identity,
        }
    }

    pub fn handle(&self) -> ProviderHandle {
        self.handle
    }
}

#[async_trait]
impl MappedEditsProvider for RemoteMappedEditsProvider {
    async fn provide_mapped_edits(
        &self,
        document: &TextDocument,
        code_blocks: &[String],
        context: &MappedEditsContext,
        token: &CancellationToken,
    ) -> Result<Option<WorkspaceEdit>> {
        let uri = self.identity.to_components(document.uri())?;
        let context = context_to_wire(context, self.identity.as_ref())?;

        let edit = self
            .ext_host
            .provide_mapped_edits(
                self.handle,
                uri,
                code_blocks.to_vec(),
                context,
                token.clone(),
            )
            .await?;

        edit.map(|edit| workspace_edit_from_wire(edit, self.identity.as_ref()))
            .transpose()
    }
}

/// Receives registrations from the extension host and mirrors them into
/// the [`MappedEditsService`] as remote proxies.
///
/// The table maps each extension host handle to its service registration,
/// so unregistering a handle also drops its proxy from the service.
pub struct MainThreadMappedEdits {
    registrations: ProviderRegistry<ProviderHandle>,
    service: Arc<MappedEditsService>,
    ext_host: Arc<dyn ExtHostMappedEditsShape>,
    identity: Arc<dyn UriIdentity>,
}

impl MainThreadMappedEdits {
    pub fn new(
        service: Arc<MappedEditsService>,
        ext_host: Arc<dyn ExtHostMappedEditsShape>,
        identity: Arc<dyn UriIdentity>,
    ) -> Self {
        Self {
            registrations: ProviderRegistry::new(),
            service,
            ext_host,
            identity,
        }
    }

    pub fn is_registered(&self, handle: ProviderHandle) -> bool {
        self.registrations.contains(handle)
    }

    pub fn registered_count(&self) -> usize {
        self.registrations.len()
    }

    /// Drops every remote provider, e.g. when the extension host goes away.
    pub fn dispose(&self) {
        for (_, local) in self.registrations.snapshot() {
            self.service.unregister_mapped_edits_provider(local);
        }
        self.registrations.teardown_all();
    }
}

impl MainThreadMappedEditsShape for MainThreadMappedEdits {
    fn register_provider(
        &self,
        handle: ProviderHandle,
        selector: Vec<DocumentFilter>,
    ) -> Result<()> {
        let proxy = RemoteMappedEditsProvider::new(
            handle,
            Arc::clone(&self.ext_host),
            Arc::clone(&self.identity),
        );
        let service_handle = self
            .service
            .register_mapped_edits_provider(DocumentSelector::new(selector), Arc::new(proxy));

        if let Some(previous) = self.registrations.insert(handle, service_handle) {
            tracing::warn!("provider {} registered twice, replacing", handle);
            self.service.unregister_mapped_edits_provider(previous);
        }
        tracing::debug!("remote provider {} registered", handle);
        Ok(())
    }

    fn unregister_provider(&self, handle: ProviderHandle) -> Result<()> {
        match self.registrations.unregister(handle) {
            Some(local) => {
                self.service.unregister_mapped_edits_provider(local);
                tracing::debug!("remote provider {} unregistered", handle);
            }
            None => tracing::debug!("unregister for unknown provider {}", handle),
        }
        Ok(())
    }
}

impl fmt::Debug for MainThreadMappedEdits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainThreadMappedEdits")
            .field("registrations", &self.registrations.len())
            .finish_non_exhaustive()
    }
}
