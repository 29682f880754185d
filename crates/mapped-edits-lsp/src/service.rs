//! Main-side mapped edits service: provider table plus selection.

use mapped_edits_core::{
    DocumentSelector, MappedEditsContext, MappedEditsProvider, ProviderHandle, ProviderRegistry,
    Result, TextDocument, UriIdentity, select,
};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::WorkspaceEdit;

struct Registration {
    selector: DocumentSelector,
    provider: Arc<dyn MappedEditsProvider>,
}

/// Holds every provider known to the main side and routes each request to
/// exactly one of them.
///
/// Remote proxies and in-process providers are registered the same way.
pub struct MappedEditsService {
    registrations: ProviderRegistry<Arc<Registration>>,
    identity: Arc<dyn UriIdentity>,
}

impl MappedEditsService {
    pub fn new(identity: Arc<dyn UriIdentity>) -> Self {
        Self {
            registrations: ProviderRegistry::new(),
            identity,
        }
    }

    /// Adds a provider. The returned handle is local to this service.
    pub fn register_mapped_edits_provider(
        &self,
        selector: DocumentSelector,
        provider: Arc<dyn MappedEditsProvider>,
    ) -> ProviderHandle {
        self.registrations
            .register(Arc::new(Registration { selector, provider }))
    }

    /// Removes a provider. Returns `false` for unknown handles.
    pub fn unregister_mapped_edits_provider(&self, handle: ProviderHandle) -> bool {
        self.registrations.unregister(handle).is_some()
    }

    pub fn provider_count(&self) -> usize {
        self.registrations.len()
    }

    /// Picks the best provider for `document` and runs it.
    ///
    /// Returns `Ok(None)` when no provider matches or when `token` is
    /// cancelled, whatever the provider does afterwards. Scoring uses the
    /// document's language id.
    pub async fn provide_mapped_edits(
        &self,
        document: &TextDocument,
        code_blocks: &[String],
        context: &MappedEditsContext,
        token: &CancellationToken,
    ) -> Result<Option<WorkspaceEdit>> {
        let uri = self.identity.to_components(document.uri())?;
        let candidates = self.registrations.snapshot();

        let Some(registration) = select(
            candidates
                .iter()
                .map(|(_, registration)| (&registration.selector, registration)),
            &uri,
            document.language_id(),
        ) else {
            tracing::debug!(
                "no mapped edits provider for {} ({})",
                uri,
                document.language_id()
            );
            return Ok(None);
        };

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Ok(None),
            result = registration
                .provider
                .provide_mapped_edits(document, code_blocks, context, token) => result,
        };

        // a provider that fails because it was cancelled is still absence
        if token.is_cancelled() {
            tracing::debug!("mapped edits request for {} cancelled", uri);
            return Ok(None);
        }
        result
    }
}

impl fmt::Debug for MappedEditsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedEditsService")
            .field("providers", &self.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mapped_edits_core::{DocumentFilter, MappedEditsError, UriIdentityService};
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower_lsp_server::ls_types::{Position, Range, TextEdit, Uri};

    struct Named {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl Named {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MappedEditsProvider for Named {
        async fn provide_mapped_edits(
            &self,
            document: &TextDocument,
            _code_blocks: &[String],
            _context: &MappedEditsContext,
            _token: &CancellationToken,
        ) -> Result<Option<WorkspaceEdit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = Position::new(0, 0);
            let mut changes = HashMap::new();
            changes.insert(
                document.uri().clone(),
                vec![TextEdit::new(Range::new(start, start), self.name.into())],
            );
            Ok(Some(WorkspaceEdit::new(changes)))
        }
    }

    struct Failing;

    #[async_trait]
    impl MappedEditsProvider for Failing {
        async fn provide_mapped_edits(
            &self,
            _document: &TextDocument,
            _code_blocks: &[String],
            _context: &MappedEditsContext,
            _token: &CancellationToken,
        ) -> Result<Option<WorkspaceEdit>> {
            Err(MappedEditsError::provider(std::io::Error::other("broken")))
        }
    }

    /// Ignores the token entirely.
    struct Stuck;

    #[async_trait]
    impl MappedEditsProvider for Stuck {
        async fn provide_mapped_edits(
            &self,
            _document: &TextDocument,
            _code_blocks: &[String],
            _context: &MappedEditsContext,
            _token: &CancellationToken,
        ) -> Result<Option<WorkspaceEdit>> {
            std::future::pending().await
        }
    }

    /// Fails once its token is cancelled.
    struct FailsOnCancel;

    #[async_trait]
    impl MappedEditsProvider for FailsOnCancel {
        async fn provide_mapped_edits(
            &self,
            _document: &TextDocument,
            _code_blocks: &[String],
            _context: &MappedEditsContext,
            token: &CancellationToken,
        ) -> Result<Option<WorkspaceEdit>> {
            token.cancelled().await;
            Err(MappedEditsError::provider(std::io::Error::other("cancelled")))
        }
    }

    fn service() -> MappedEditsService {
        MappedEditsService::new(Arc::new(UriIdentityService::default()))
    }

    fn document(uri: &str, language: &str) -> TextDocument {
        TextDocument::new(Uri::from_str(uri).unwrap(), language, 1, "")
    }

    fn inserted_text(edit: WorkspaceEdit) -> String {
        edit.changes
            .unwrap()
            .into_values()
            .next()
            .unwrap()
            .remove(0)
            .new_text
    }

    async fn provide(
        service: &MappedEditsService,
        doc: &TextDocument,
    ) -> Result<Option<WorkspaceEdit>> {
        service
            .provide_mapped_edits(
                doc,
                &["code".into()],
                &MappedEditsContext::default(),
                &CancellationToken::new(),
            )
            .await
    }

    #[test]
    fn test_no_providers_is_absence() {
        let result = tokio_test::block_on(provide(&service(), &document("file:///a.py", "python")));
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exact_language_wins_and_only_one_runs() {
        let service = service();
        let any = Named::new("any");
        let python = Named::new("python");
        service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("*")]),
            any.clone(),
        );
        service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("python")]),
            python.clone(),
        );

        let edit = provide(&service, &document("file:///a.py", "python"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inserted_text(edit), "python");
        assert_eq!(any.calls.load(Ordering::SeqCst), 0);
        assert_eq!(python.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tie_goes_to_first_registered() {
        let service = service();
        for name in ["first", "second"] {
            service.register_mapped_edits_provider(
                DocumentSelector::new(vec![DocumentFilter::language("rust")]),
                Named::new(name),
            );
        }
        let edit = provide(&service, &document("file:///lib.rs", "rust"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inserted_text(edit), "first");
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_not_selected() {
        let service = service();
        let handle = service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("python")]),
            Named::new("python"),
        );
        assert!(service.unregister_mapped_edits_provider(handle));
        assert!(!service.unregister_mapped_edits_provider(handle));
        assert_eq!(service.provider_count(), 0);

        let result = provide(&service, &document("file:///a.py", "python")).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_is_propagated() {
        let service = service();
        service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("*")]),
            Arc::new(Failing),
        );
        let err = provide(&service, &document("file:///a.py", "python"))
            .await
            .unwrap_err();
        assert!(err.is_provider_failure());
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let service = service();
        let python = Named::new("python");
        let handle = service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("python")]),
            python.clone(),
        );

        let docs: Vec<_> = (0..4)
            .map(|i| document(&format!("file:///m{}.py", i), "python"))
            .collect();
        let requests = docs.iter().map(|doc| provide(&service, doc));
        let results = futures::future::join_all(requests).await;

        assert!(results.iter().all(|r| matches!(r, Ok(Some(_)))));
        assert_eq!(python.calls.load(Ordering::SeqCst), 4);
        assert!(service.unregister_mapped_edits_provider(handle));
    }

    #[tokio::test]
    async fn test_selection_uses_document_language() {
        let service = service();
        service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("markdown")]),
            Named::new("markdown"),
        );
        let result = provide(&service, &document("file:///notes.txt", "markdown"))
            .await
            .unwrap();
        assert!(result.is_some());
    }

    async fn provide_cancelled_after(
        service: &MappedEditsService,
        delay: Duration,
    ) -> Result<Option<WorkspaceEdit>> {
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                token.cancel();
            })
        };
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            service.provide_mapped_edits(
                &document("file:///a.py", "python"),
                &["code".into()],
                &MappedEditsContext::default(),
                &token,
            ),
        )
        .await
        .expect("service kept waiting after cancellation");
        canceller.await.unwrap();
        result
    }

    #[tokio::test]
    async fn test_cancellation_stops_waiting_on_unresponsive_provider() {
        let service = service();
        service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("*")]),
            Arc::new(Stuck),
        );
        let result = provide_cancelled_after(&service, Duration::from_millis(50)).await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_after_cancellation_is_absence() {
        let service = service();
        service.register_mapped_edits_provider(
            DocumentSelector::new(vec![DocumentFilter::language("*")]),
            Arc::new(FailsOnCancel),
        );
        let result = provide_cancelled_after(&service, Duration::from_millis(50)).await;
        assert!(result.unwrap().is_none());
    }
}
