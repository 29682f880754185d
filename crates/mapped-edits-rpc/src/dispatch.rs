//! Routing of inbound messages to the locally served shapes.

use async_trait::async_trait;
use mapped_edits_core::{
    ExtHostDocumentsShape, ExtHostMappedEditsShape, MainThreadMappedEditsShape, MappedEditsError,
    Result,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::message::{Call, Notification, Outcome};

/// Handles messages arriving on a connection.
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Handles one notification. Called in arrival order.
    fn handle_notification(&self, notification: Notification) -> Result<()>;

    /// Handles one call. Calls run concurrently; `token` is cancelled when
    /// the remote side cancels or the connection closes.
    async fn handle_call(&self, call: Call, token: CancellationToken) -> Outcome;
}

/// Dispatcher for the extension host side of the boundary.
pub struct ExtHostDispatcher {
    mapped_edits: Arc<dyn ExtHostMappedEditsShape>,
    documents: Arc<dyn ExtHostDocumentsShape>,
}

impl ExtHostDispatcher {
    pub fn new(
        mapped_edits: Arc<dyn ExtHostMappedEditsShape>,
        documents: Arc<dyn ExtHostDocumentsShape>,
    ) -> Self {
        Self {
            mapped_edits,
            documents,
        }
    }
}

#[async_trait]
impl Dispatcher for ExtHostDispatcher {
    fn handle_notification(&self, notification: Notification) -> Result<()> {
        match notification {
            Notification::DocumentOpened(data) => self.documents.accept_document_opened(data),
            Notification::DocumentChanged { uri, version, text } => {
                self.documents.accept_document_changed(uri, version, text)
            }
            Notification::DocumentClosed { uri } => self.documents.accept_document_closed(uri),
            other => Err(MappedEditsError::protocol(format!(
                "extension host cannot handle {:?}",
                other
            ))),
        }
    }

    async fn handle_call(&self, call: Call, token: CancellationToken) -> Outcome {
        match call {
            Call::ProvideMappedEdits {
                handle,
                uri,
                code_blocks,
                context,
            } => {
                let result = self
                    .mapped_edits
                    .provide_mapped_edits(handle, uri, code_blocks, context, token.clone())
                    .await;
                if token.is_cancelled() {
                    return Outcome::Cancelled;
                }
                match result {
                    Ok(edit) => Outcome::Edits { edit },
                    Err(e) => Outcome::Failed {
                        message: failure_message(&e),
                    },
                }
            }
        }
    }
}

/// Dispatcher for the main side of the boundary.
pub struct MainThreadDispatcher {
    mapped_edits: Arc<dyn MainThreadMappedEditsShape>,
}

impl MainThreadDispatcher {
    pub fn new(mapped_edits: Arc<dyn MainThreadMappedEditsShape>) -> Self {
        Self { mapped_edits }
    }
}

#[async_trait]
impl Dispatcher for MainThreadDispatcher {
    fn handle_notification(&self, notification: Notification) -> Result<()> {
        match notification {
            Notification::RegisterProvider { handle, selector } => {
                self.mapped_edits.register_provider(handle, selector)
            }
            Notification::UnregisterProvider { handle } => {
                self.mapped_edits.unregister_provider(handle)
            }
            other => Err(MappedEditsError::protocol(format!(
                "main side cannot handle {:?}",
                other
            ))),
        }
    }

    async fn handle_call(&self, call: Call, _token: CancellationToken) -> Outcome {
        Outcome::Failed {
            message: format!("main side cannot serve {:?}", call),
        }
    }
}

fn failure_message(error: &MappedEditsError) -> String {
    match error {
        MappedEditsError::Provider { source } => source.to_string(),
        MappedEditsError::ProviderFailure { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
