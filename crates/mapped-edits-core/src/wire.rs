//! Wire representation of the mapped edits payloads.
//!
//! These types are what actually crosses the process boundary. URIs travel
//! as [`UriComponents`] and are revived on the receiving side; optional
//! fields are always serialized (as `null` when absent) so that "absent" and
//! "empty" stay distinguishable.

use crate::context::Selection;
use crate::uri::UriComponents;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_lsp_server::ls_types::{ChangeAnnotation, Range, ResourceOp};

/// Document state sent to the extension host when a document opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDataDto {
    pub uri: UriComponents,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedContextItemDto {
    pub uri: UriComponents,
    pub range: Range,
}

/// Wire form of [`MappedEditsContext`](crate::MappedEditsContext).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedEditsContextDto {
    pub selections: Vec<Selection>,
    pub related: Vec<RelatedContextItemDto>,
    /// `null` on the wire when there is no prior edit.
    pub changes_before: Option<WorkspaceEditDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEditDto {
    pub range: Range,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_id: Option<String>,
}

/// All plain edits for one resource of a `changes` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEditsDto {
    pub resource: UriComponents,
    pub edits: Vec<TextEditDto>,
}

/// Edits against one (optionally versioned) document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentEditDto {
    pub resource: UriComponents,
    pub version_id: Option<i32>,
    pub edits: Vec<TextEditDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentChangeDto {
    Edit(TextDocumentEditDto),
    Resource(ResourceOp),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentChangesDto {
    Edits(Vec<TextDocumentEditDto>),
    Operations(Vec<DocumentChangeDto>),
}

/// Wire form of a workspace edit.
///
/// The `changes` map is flattened into a list sorted by resource so the
/// encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceEditDto {
    pub changes: Option<Vec<ResourceEditsDto>>,
    pub document_changes: Option<DocumentChangesDto>,
    pub change_annotations: Option<BTreeMap<String, ChangeAnnotation>>,
}
