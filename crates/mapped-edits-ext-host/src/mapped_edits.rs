//! Provider registration API and serving side of the invoker.

use async_trait::async_trait;
use mapped_edits_core::{
    DocumentFilter, DocumentStore, ExtHostMappedEditsShape, MainThreadMappedEditsShape,
    MappedEditsContextDto, MappedEditsProvider, ProviderHandle, ProviderRegistry, Result,
    UriComponents, UriIdentity, WorkspaceEditDto, context_from_wire, workspace_edit_to_wire,
};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the real providers and runs them on request from the main side.
///
/// The main side only ever learns a provider's handle and selector.
///
/// # Examples
///
/// ```no_run
/// use mapped_edits_core::{DocumentFilter, UriIdentityService};
/// use mapped_edits_ext_host::{ExtHostDocuments, ExtHostMappedEdits, InsertAtSelectionProvider};
/// use mapped_edits_rpc::MainThreadProxy;
/// use std::sync::Arc;
///
/// # fn run(main_thread: MainThreadProxy) -> mapped_edits_core::Result<()> {
/// let identity = Arc::new(UriIdentityService::default());
/// let documents = Arc::new(ExtHostDocuments::new(identity.clone()));
/// let mapped_edits = ExtHostMappedEdits::new(Arc::new(main_thread), documents, identity);
///
/// let handle = mapped_edits.register_mapped_edits_provider(
///     vec![DocumentFilter::language("*")],
///     Arc::new(InsertAtSelectionProvider),
/// )?;
/// mapped_edits.unregister_mapped_edits_provider(handle)?;
/// # Ok(())
/// # }
/// ```
pub struct ExtHostMappedEdits {
    providers: ProviderRegistry<Arc<dyn MappedEditsProvider>>,
    main_thread: Arc<dyn MainThreadMappedEditsShape>,
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn UriIdentity>,
}

impl ExtHostMappedEdits {
    pub fn new(
        main_thread: Arc<dyn MainThreadMappedEditsShape>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn UriIdentity>,
    ) -> Self {
        Self {
            providers: ProviderRegistry::new(),
            main_thread,
            documents,
            identity,
        }
    }

    /// Registers `provider` for documents matching `selector`.
    ///
    /// The returned handle stays valid until it is passed to
    /// [`unregister_mapped_edits_provider`](Self::unregister_mapped_edits_provider).
    pub fn register_mapped_edits_provider(
        &self,
        selector: Vec<DocumentFilter>,
        provider: Arc<dyn MappedEditsProvider>,
    ) -> Result<ProviderHandle> {
        let handle = self.providers.register(provider);
        if let Err(e) = self.main_thread.register_provider(handle, selector) {
            self.providers.unregister(handle);
            return Err(e);
        }
        tracing::info!("registered mapped edits provider {}", handle);
        Ok(handle)
    }

    /// Unregisters a provider. Unknown or already released handles are a
    /// no-op.
    pub fn unregister_mapped_edits_provider(&self, handle: ProviderHandle) -> Result<()> {
        if self.providers.unregister(handle).is_none() {
            return Ok(());
        }
        tracing::info!("unregistered mapped edits provider {}", handle);
        self.main_thread.unregister_provider(handle)
    }

    pub fn is_registered(&self, handle: ProviderHandle) -> bool {
        self.providers.contains(handle)
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Releases every provider at once, e.g. when the connection closes.
    pub fn dispose(&self) {
        let released = self.providers.teardown_all();
        if released > 0 {
            tracing::info!("released {} mapped edits providers", released);
        }
    }
}

#[async_trait]
impl ExtHostMappedEditsShape for ExtHostMappedEdits {
    async fn provide_mapped_edits(
        &self,
        handle: ProviderHandle,
        document: UriComponents,
        code_blocks: Vec<String>,
        context: MappedEditsContextDto,
        token: CancellationToken,
    ) -> Result<Option<WorkspaceEditDto>> {
        let Some(provider) = self.providers.resolve(handle) else {
            tracing::debug!("no mapped edits provider with handle {}", handle);
            return Ok(None);
        };

        let uri = match self.identity.revive(&document) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::debug!("unable to revive document URI {}: {}", document, e);
                return Ok(None);
            }
        };
        let Some(text_document) = self.documents.get_document(&uri) else {
            tracing::debug!("unable to find document for {}", uri.as_str());
            return Ok(None);
        };

        let context = context_from_wire(context, self.identity.as_ref())?;

        let result = provider
            .provide_mapped_edits(&text_document, &code_blocks, &context, &token)
            .await;

        if token.is_cancelled() {
            tracing::debug!("mapped edits request for provider {} cancelled", handle);
            return Ok(None);
        }
        let edit = result?;

        if !self.providers.contains(handle) {
            tracing::debug!(
                "provider {} was unregistered while running, discarding its result",
                handle
            );
            return Ok(None);
        }

        edit.map(|edit| workspace_edit_to_wire(&edit, self.identity.as_ref()))
            .transpose()
    }
}

impl fmt::Debug for ExtHostMappedEdits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtHostMappedEdits")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
