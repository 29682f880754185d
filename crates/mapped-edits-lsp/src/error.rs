use mapped_edits_core::MappedEditsError;
use tower_lsp_server::jsonrpc;

/// Converts a mapped edits failure into the JSON-RPC error sent to the client.
///
/// A malformed document URI is the client's fault and becomes
/// `InvalidParams`; everything else, provider faults included, is reported
/// as an internal error carrying the failure message.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::{MappedEditsError, ProviderHandle};
/// use mapped_edits_lsp::error::to_jsonrpc_error;
/// use tower_lsp_server::jsonrpc::ErrorCode;
///
/// let err = MappedEditsError::provider_failure(ProviderHandle::new(3), "boom");
/// let rpc = to_jsonrpc_error(&err);
/// assert_eq!(rpc.code, ErrorCode::InternalError);
/// assert!(rpc.message.contains("boom"));
/// ```
pub fn to_jsonrpc_error(err: &MappedEditsError) -> jsonrpc::Error {
    match err {
        MappedEditsError::InvalidUri(_) => jsonrpc::Error::invalid_params(err.to_string()),
        _ => {
            let mut error = jsonrpc::Error::internal_error();
            error.message = err.to_string().into();
            error
        }
    }
}
