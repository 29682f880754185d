use mapped_edits_core::{
    DocumentDataDto, DocumentFilter, MappedEditsContextDto, ProviderHandle, UriComponents,
    WorkspaceEditDto,
};
use serde::{Deserialize, Serialize};

/// Request correlation id, unique per connection direction.
pub type RequestId = u64;

/// Envelope of everything sent over a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    Request { id: RequestId, call: Call },
    Response { id: RequestId, outcome: Outcome },
    Notification { notification: Notification },
    /// Out-of-band cancellation of an in-flight request.
    Cancel { id: RequestId },
}

/// Calls that expect exactly one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Call {
    #[serde(rename_all = "camelCase")]
    ProvideMappedEdits {
        handle: ProviderHandle,
        uri: UriComponents,
        code_blocks: Vec<String>,
        context: MappedEditsContextDto,
    },
}

/// Fire-and-forget messages, dispatched in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum Notification {
    RegisterProvider {
        handle: ProviderHandle,
        selector: Vec<DocumentFilter>,
    },
    UnregisterProvider { handle: ProviderHandle },
    DocumentOpened(DocumentDataDto),
    DocumentChanged {
        uri: UriComponents,
        version: i32,
        text: String,
    },
    DocumentClosed { uri: UriComponents },
}

/// Result of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    /// `edit` is `null` when the provider had nothing to contribute.
    Edits { edit: Option<WorkspaceEditDto> },
    Failed { message: String },
    Cancelled,
}

impl Message {
    pub fn encode(&self) -> mapped_edits_core::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(body: &[u8]) -> mapped_edits_core::Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}
