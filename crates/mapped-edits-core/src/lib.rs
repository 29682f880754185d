//! Core abstractions for mapped edits.
//!
//! A mapped edits provider turns raw code blocks (for example from a chat
//! reply) into precise edits against a document. Providers live in the
//! extension host and are invoked from the main side across a process
//! boundary.
//!
//! # Architecture
//!
//! mapped-edits-core defines:
//! - **Registry**: `ProviderRegistry`, a concurrent handle table with
//!   monotonic, never reused handles
//! - **Selection**: `DocumentSelector` scoring and the `select` rule that
//!   picks exactly one provider per request
//! - **Marshalling**: wire DTOs and lossless conversion of the request
//!   context and workspace edits, with URI revival through `UriIdentity`
//! - **Traits**: `MappedEditsProvider`, `DocumentStore` and the protocol
//!   shapes served by each side of the boundary
//!
//! # Examples
//!
//! Choosing a provider for a document:
//!
//! ```
//! use mapped_edits_core::{
//!     DocumentFilter, DocumentSelector, ProviderRegistry, UriComponents, select,
//! };
//! use std::sync::Arc;
//!
//! let registry: ProviderRegistry<Arc<(DocumentSelector, &'static str)>> =
//!     ProviderRegistry::new();
//! registry.register(Arc::new((
//!     DocumentSelector::new(vec![DocumentFilter::language("*")]),
//!     "fallback",
//! )));
//! registry.register(Arc::new((
//!     DocumentSelector::new(vec![DocumentFilter::language("python")]),
//!     "python",
//! )));
//!
//! let uri = UriComponents::parse("file:///app/main.py").unwrap();
//! let entries = registry.snapshot();
//! let chosen = select(
//!     entries.iter().map(|(_, entry)| (&entry.0, entry.1)),
//!     &uri,
//!     "python",
//! );
//! assert_eq!(chosen, Some("python"));
//! ```

pub mod context;
pub mod document;
pub mod error;
pub mod marshal;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod selection;
pub mod selector;
pub mod uri;
pub mod wire;

// Re-export commonly used types
pub use context::{MappedEditsContext, RelatedContextItem, Selection};
pub use document::{DocumentStore, Documents, TextDocument};
pub use error::{MappedEditsError, Result};
pub use marshal::{
    context_from_wire, context_to_wire, workspace_edit_from_wire, workspace_edit_to_wire,
};
pub use protocol::{ExtHostDocumentsShape, ExtHostMappedEditsShape, MainThreadMappedEditsShape};
pub use provider::MappedEditsProvider;
pub use registry::{ProviderHandle, ProviderRegistry};
pub use selection::select;
pub use selector::{DocumentFilter, DocumentSelector, GlobPattern, SCORE_EXACT, SCORE_WILDCARD};
pub use tokio_util::sync::CancellationToken;
pub use uri::{UriComponents, UriIdentity, UriIdentityService};
pub use wire::{
    DocumentChangeDto, DocumentChangesDto, DocumentDataDto, MappedEditsContextDto,
    RelatedContextItemDto, ResourceEditsDto, TextDocumentEditDto, TextEditDto, WorkspaceEditDto,
};
