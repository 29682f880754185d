//! Extension host side of mapped edits.
//!
//! Providers register here through [`ExtHostMappedEdits`], which keeps the
//! real provider objects and tells the main side only the handle and the
//! document selector. When the main side picks a provider it calls back
//! with the handle; the extension host materializes the document from its
//! [`ExtHostDocuments`] mirror, runs the provider and sends the edit back.

pub mod builtin;
pub mod cli;
pub mod documents;
pub mod host;
pub mod mapped_edits;

pub use builtin::InsertAtSelectionProvider;
pub use documents::ExtHostDocuments;
pub use host::ExtensionHost;
pub use mapped_edits::ExtHostMappedEdits;
