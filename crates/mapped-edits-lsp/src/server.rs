use crate::config::MappedEditsConfig;
use crate::error::to_jsonrpc_error;
use crate::session::Session;
use mapped_edits_core::{MappedEditsContext, TextDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, ServerCapabilities,
    ServerInfo, TextDocumentIdentifier, TextDocumentSyncCapability, TextDocumentSyncKind,
    WorkspaceEdit,
};
use tower_lsp_server::{Client, LanguageServer, jsonrpc, jsonrpc::Result};

/// Custom request methods served next to the standard LSP ones.
pub mod methods {
    /// Maps code blocks into edits for an open document.
    pub const PROVIDE_MAPPED_EDITS: &str = "mappedEdits/provide";
}

/// Parameters of the `mappedEdits/provide` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvideMappedEditsParams {
    pub text_document: TextDocumentIdentifier,
    pub code_blocks: Vec<String>,
    #[serde(default)]
    pub context: MappedEditsContext,
}

pub struct Backend {
    pub(crate) client: Client,
    session: RwLock<Option<Arc<Session>>>,
    config: Arc<RwLock<MappedEditsConfig>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            session: RwLock::new(None),
            config: Arc::new(RwLock::new(MappedEditsConfig::default())),
        }
    }

    /// Get a reference to the LSP client (primarily for testing/benchmarking).
    #[doc(hidden)]
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            experimental: Some(serde_json::json!({ "mappedEditsProvider": true })),
            ..Default::default()
        }
    }

    /// Handles `mappedEdits/provide`.
    ///
    /// The provider runs on its own task so that a client cancellation,
    /// which drops this future, still reaches the provider through the
    /// token. The configured timeout cancels the same token.
    pub async fn provide_mapped_edits(
        &self,
        params: ProvideMappedEditsParams,
    ) -> Result<Option<WorkspaceEdit>> {
        let Some(session) = self.session().await else {
            tracing::warn!("mapped edits requested before initialization");
            return Ok(None);
        };
        let timeout = self.config.read().await.provider_timeout();

        let ProvideMappedEditsParams {
            text_document,
            code_blocks,
            context,
        } = params;
        tracing::debug!(
            "mapped edits requested for {} ({} code blocks)",
            text_document.uri.as_str(),
            code_blocks.len()
        );

        let token = CancellationToken::new();
        let _cancel_on_drop = token.clone().drop_guard();

        let mut task = tokio::spawn({
            let token = token.clone();
            async move {
                session
                    .provide_mapped_edits(&text_document.uri, &code_blocks, &context, &token)
                    .await
            }
        });

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!("mapped edits request timed out after {:?}", limit);
                    token.cancel();
                    task.await
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(edit)) => Ok(edit),
            Ok(Err(e)) => {
                tracing::error!("mapped edits request failed: {}", e);
                Err(to_jsonrpc_error(&e))
            }
            Err(e) => {
                tracing::error!("mapped edits task failed: {}", e);
                Err(jsonrpc::Error::internal_error())
            }
        }
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing mapped-edits-lsp server");

        if let Some(init_options) = params.initialization_options
            && let Ok(config) = serde_json::from_value::<MappedEditsConfig>(init_options)
        {
            tracing::debug!("loaded configuration: {:?}", config);
            *self.config.write().await = config;
        }

        let session = {
            let config = self.config.read().await;
            Session::start(&config).map_err(|e| {
                tracing::error!("failed to start extension host: {}", e);
                to_jsonrpc_error(&e)
            })?
        };
        if let Some(previous) = self.session.write().await.replace(Arc::new(session)) {
            tracing::warn!("initialize received twice, replacing session");
            previous.shutdown().await;
        }

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "mapped-edits-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("mapped-edits-lsp server initialized");
        self.client
            .log_message(MessageType::INFO, "mapped-edits-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down mapped-edits-lsp server");
        if let Some(session) = self.session.write().await.take() {
            session.shutdown().await;
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        tracing::info!("document opened: {:?}", item.uri);

        let Some(session) = self.session().await else {
            return;
        };
        let document = TextDocument::new(item.uri, item.language_id, item.version, item.text);
        if let Err(e) = session.did_open(document) {
            tracing::error!("failed to forward opened document: {}", e);
        }
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        // full sync: the last change carries the whole text
        let Some(change) = params.content_changes.pop() else {
            return;
        };
        let Some(session) = self.session().await else {
            return;
        };
        if let Err(e) = session.did_change(&uri, params.text_document.version, change.text) {
            tracing::error!("failed to forward document change {:?}: {}", uri, e);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {:?}", uri);

        let Some(session) = self.session().await else {
            return;
        };
        if let Err(e) = session.did_close(&uri) {
            tracing::error!("failed to forward closed document {:?}: {}", uri, e);
        }
    }
}
