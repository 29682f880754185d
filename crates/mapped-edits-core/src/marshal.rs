//! Conversion between in-memory values and their wire form.
//!
//! Outbound conversion turns every [`Uri`] into [`UriComponents`]; inbound
//! conversion revives them through a [`UriIdentity`]. Sequence order is
//! preserved in both directions, so `from_wire(to_wire(x)) == x` as long as
//! the identity service revives each URI to itself.

use crate::context::{MappedEditsContext, RelatedContextItem};
use crate::error::Result;
use crate::uri::{UriComponents, UriIdentity};
use crate::wire::{
    DocumentChangeDto, DocumentChangesDto, MappedEditsContextDto, RelatedContextItemDto,
    ResourceEditsDto, TextDocumentEditDto, TextEditDto, WorkspaceEditDto,
};
use std::collections::HashMap;
use tower_lsp_server::ls_types::{
    AnnotatedTextEdit, DocumentChangeOperation, DocumentChanges, OneOf,
    OptionalVersionedTextDocumentIdentifier, ResourceOp, TextDocumentEdit, TextEdit, Uri,
    WorkspaceEdit,
};

pub fn context_to_wire(
    context: &MappedEditsContext,
    identity: &dyn UriIdentity,
) -> Result<MappedEditsContextDto> {
    let related = context
        .related
        .iter()
        .map(|item| {
            Ok(RelatedContextItemDto {
                uri: identity.to_components(&item.uri)?,
                range: item.range,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let changes_before = context
        .changes_before
        .as_ref()
        .map(|edit| workspace_edit_to_wire(edit, identity))
        .transpose()?;

    Ok(MappedEditsContextDto {
        selections: context.selections.clone(),
        related,
        changes_before,
    })
}

pub fn context_from_wire(
    dto: MappedEditsContextDto,
    identity: &dyn UriIdentity,
) -> Result<MappedEditsContext> {
    let related = dto
        .related
        .into_iter()
        .map(|item| {
            Ok(RelatedContextItem {
                uri: identity.revive(&item.uri)?,
                range: item.range,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let changes_before = dto
        .changes_before
        .map(|edit| workspace_edit_from_wire(edit, identity))
        .transpose()?;

    Ok(MappedEditsContext {
        selections: dto.selections,
        related,
        changes_before,
    })
}

/// Converts a workspace edit to its wire form.
///
/// Entries of the `changes` map are emitted sorted by URI.
pub fn workspace_edit_to_wire(
    edit: &WorkspaceEdit,
    identity: &dyn UriIdentity,
) -> Result<WorkspaceEditDto> {
    let changes = match &edit.changes {
        Some(changes) => {
            let mut entries: Vec<_> = changes.iter().collect();
            entries.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
            let entries = entries
                .into_iter()
                .map(|(uri, edits)| {
                    Ok(ResourceEditsDto {
                        resource: identity.to_components(uri)?,
                        edits: edits.iter().map(plain_edit_to_wire).collect(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(entries)
        }
        None => None,
    };

    let document_changes = match &edit.document_changes {
        Some(DocumentChanges::Edits(edits)) => Some(DocumentChangesDto::Edits(
            edits
                .iter()
                .map(|e| document_edit_to_wire(e, identity))
                .collect::<Result<Vec<_>>>()?,
        )),
        Some(DocumentChanges::Operations(ops)) => Some(DocumentChangesDto::Operations(
            ops.iter()
                .map(|op| match op {
                    DocumentChangeOperation::Edit(e) => {
                        document_edit_to_wire(e, identity).map(DocumentChangeDto::Edit)
                    }
                    DocumentChangeOperation::Op(op) => Ok(DocumentChangeDto::Resource(op.clone())),
                })
                .collect::<Result<Vec<_>>>()?,
        )),
        None => None,
    };

    let change_annotations = edit
        .change_annotations
        .as_ref()
        .map(|annotations| annotations.clone().into_iter().collect());

    Ok(WorkspaceEditDto {
        changes,
        document_changes,
        change_annotations,
    })
}

/// Revives a workspace edit received over the wire.
pub fn workspace_edit_from_wire(
    dto: WorkspaceEditDto,
    identity: &dyn UriIdentity,
) -> Result<WorkspaceEdit> {
    let changes = match dto.changes {
        Some(entries) => {
            let mut changes: HashMap<Uri, Vec<TextEdit>> = HashMap::with_capacity(entries.len());
            for entry in entries {
                let uri = identity.revive(&entry.resource)?;
                // two spellings of one resource collapse onto the canonical URI
                changes
                    .entry(uri)
                    .or_default()
                    .extend(entry.edits.into_iter().map(plain_edit_from_wire));
            }
            Some(changes)
        }
        None => None,
    };

    let document_changes = match dto.document_changes {
        Some(DocumentChangesDto::Edits(edits)) => Some(DocumentChanges::Edits(
            edits
                .into_iter()
                .map(|e| document_edit_from_wire(e, identity))
                .collect::<Result<Vec<_>>>()?,
        )),
        Some(DocumentChangesDto::Operations(ops)) => Some(DocumentChanges::Operations(
            ops.into_iter()
                .map(|op| match op {
                    DocumentChangeDto::Edit(e) => {
                        document_edit_from_wire(e, identity).map(DocumentChangeOperation::Edit)
                    }
                    DocumentChangeDto::Resource(op) => {
                        resource_op_from_wire(op, identity).map(DocumentChangeOperation::Op)
                    }
                })
                .collect::<Result<Vec<_>>>()?,
        )),
        None => None,
    };

    let change_annotations = dto
        .change_annotations
        .map(|annotations| annotations.into_iter().collect());

    Ok(WorkspaceEdit {
        changes,
        document_changes,
        change_annotations,
    })
}

fn plain_edit_to_wire(edit: &TextEdit) -> TextEditDto {
    TextEditDto {
        range: edit.range,
        text: edit.new_text.clone(),
        annotation_id: None,
    }
}

fn plain_edit_from_wire(edit: TextEditDto) -> TextEdit {
    TextEdit::new(edit.range, edit.text)
}

fn document_edit_to_wire(
    edit: &TextDocumentEdit,
    identity: &dyn UriIdentity,
) -> Result<TextDocumentEditDto> {
    let edits = edit
        .edits
        .iter()
        .map(|e| match e {
            OneOf::Left(plain) => plain_edit_to_wire(plain),
            OneOf::Right(annotated) => TextEditDto {
                range: annotated.text_edit.range,
                text: annotated.text_edit.new_text.clone(),
                annotation_id: Some(annotated.annotation_id.clone()),
            },
        })
        .collect();

    Ok(TextDocumentEditDto {
        resource: identity.to_components(&edit.text_document.uri)?,
        version_id: edit.text_document.version,
        edits,
    })
}

fn document_edit_from_wire(
    dto: TextDocumentEditDto,
    identity: &dyn UriIdentity,
) -> Result<TextDocumentEdit> {
    let edits = dto
        .edits
        .into_iter()
        .map(|e| match e.annotation_id {
            Some(annotation_id) => OneOf::Right(AnnotatedTextEdit {
                text_edit: TextEdit::new(e.range, e.text),
                annotation_id,
            }),
            None => OneOf::Left(TextEdit::new(e.range, e.text)),
        })
        .collect();

    Ok(TextDocumentEdit {
        text_document: OptionalVersionedTextDocumentIdentifier {
            uri: identity.revive(&dto.resource)?,
            version: dto.version_id,
        },
        edits,
    })
}

fn revive_in_place(uri: &mut Uri, identity: &dyn UriIdentity) -> Result<()> {
    *uri = identity.revive(&UriComponents::from_uri(uri)?)?;
    Ok(())
}

fn resource_op_from_wire(mut op: ResourceOp, identity: &dyn UriIdentity) -> Result<ResourceOp> {
    match &mut op {
        ResourceOp::Create(create) => revive_in_place(&mut create.uri, identity)?,
        ResourceOp::Rename(rename) => {
            revive_in_place(&mut rename.old_uri, identity)?;
            revive_in_place(&mut rename.new_uri, identity)?;
        }
        ResourceOp::Delete(delete) => revive_in_place(&mut delete.uri, identity)?,
    }
    Ok(op)
}
