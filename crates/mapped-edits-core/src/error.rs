use thiserror::Error;

use crate::registry::ProviderHandle;

/// Core error types for mapped edits.
///
/// Only provider faults and transport faults are errors. "No provider
/// matched", "handle not found", "document unavailable" and cancellation are
/// all reported as an absent result (`Ok(None)`), never through this type.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::error::{MappedEditsError, Result};
///
/// fn check_blocks(code_blocks: &[String]) -> Result<()> {
///     if code_blocks.iter().any(|b| b.contains('\0')) {
///         return Err(MappedEditsError::provider(std::io::Error::new(
///             std::io::ErrorKind::InvalidData,
///             "code block contains NUL",
///         )));
///     }
///     Ok(())
/// }
///
/// assert!(check_blocks(&["print(1)".into()]).is_ok());
/// ```
#[derive(Error, Debug)]
pub enum MappedEditsError {
    /// An in-process provider raised a fault while mapping edits.
    #[error("mapped edits provider failed: {source}")]
    Provider {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A provider on the other side of the process boundary raised a fault.
    #[error("mapped edits provider {handle} failed: {message}")]
    ProviderFailure {
        handle: ProviderHandle,
        message: String,
    },

    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// The remote side went away before answering.
    #[error("connection to remote side closed")]
    Disconnected,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for `Result<T, MappedEditsError>`.
pub type Result<T> = std::result::Result<T, MappedEditsError>;

impl MappedEditsError {
    /// Wraps any error raised by provider logic.
    pub fn provider(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider {
            source: Box::new(error),
        }
    }

    /// Creates a failure reported by a remote provider.
    pub fn provider_failure(handle: ProviderHandle, message: impl Into<String>) -> Self {
        Self::ProviderFailure {
            handle,
            message: message.into(),
        }
    }

    /// Creates an invalid URI error.
    pub fn invalid_uri(uri: impl Into<String>) -> Self {
        Self::InvalidUri(uri.into())
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns true if the error originates from provider logic rather than
    /// from the plumbing around it.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::ProviderFailure { .. })
    }
}
