//! # Record Mutations
//!
//! Edit primitives expressed as data, so a UI shell can ship them over the
//! wire and the engine can keep an undo history of their inverses.
//!
//! ## Mutation Semantics
//!
//! ### SetField
//! - Writes one scalar, creating missing objects, lists and rows
//! - A positional index equal to the list length appends a row
//!
//! ### ClearField / RestoreField
//! - Remove or replace a whole field (scalar, object or list)
//! - `RestoreField` carries the field in stored document form
//!
//! ### AddRow / InsertRow / RemoveRow
//! - Rows are addressed by id, never by position
//! - Removing an absent row is a no-op

use crate::errors::EditorError;
use folio_record::{
    decode_node, encode_node, next_row_id, Document, FieldPath, FormSchema, Node, PathError, Record, Row, RowId,
    Scalar, Segment, ROW_ID_FIELD,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic edits of a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Write a scalar value
    SetField { path: FieldPath, value: Scalar },

    /// Remove a field and everything below it
    ClearField { path: FieldPath },

    /// Put a field back from its document form
    RestoreField { path: FieldPath, value: Value },

    /// Append a row; an empty template uses the schema's row template.
    /// A template `id` is honoured unless it collides.
    AddRow {
        list: FieldPath,
        #[serde(default)]
        template: Document,
    },

    /// Insert a complete row at a position (clamped to the list length)
    InsertRow { list: FieldPath, index: usize, row: Row },

    /// Remove the row with this id, if present
    RemoveRow { list: FieldPath, id: RowId },
}

/// What applying one mutation did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationResult {
    /// Mutation that undoes this one; `None` when nothing changed
    pub inverse: Option<Mutation>,
    /// Canonical paths whose value changed
    pub changed: Vec<FieldPath>,
    /// Row added or removed
    pub row: Option<RowId>,
}

impl MutationResult {
    fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Canonical path of a list field; every row above it must exist
fn resolve_list(record: &Record, list: &FieldPath) -> Result<FieldPath, EditorError> {
    match list.last() {
        Some(Segment::Key(_)) => Ok(record.canonicalize(list)?),
        _ => Err(PathError::NotAList {
            path: list.to_string(),
            at: list.to_string(),
        }
        .into()),
    }
}

/// Mutation removing a node a write had to create
fn removal_of(created: &FieldPath) -> Mutation {
    match (created.last(), created.parent()) {
        (Some(Segment::Row(id)), Some(list)) => Mutation::RemoveRow { list, id: *id },
        _ => Mutation::ClearField {
            path: created.clone(),
        },
    }
}

impl Mutation {
    /// Apply to `record` without any schema validation.
    ///
    /// On error the record may hold a partial write; callers that need
    /// atomicity restore a checkpoint.
    pub fn apply(&self, record: &mut Record, schema: &FormSchema) -> Result<MutationResult, EditorError> {
        match self {
            Mutation::SetField { path, value } => Self::apply_set(record, path, value),
            Mutation::ClearField { path } => Self::apply_clear(record, path),
            Mutation::RestoreField { path, value } => Self::apply_restore(record, path, value),
            Mutation::AddRow { list, template } => Self::apply_add_row(record, schema, list, template),
            Mutation::InsertRow { list, index, row } => Self::apply_insert_row(record, list, *index, row),
            Mutation::RemoveRow { list, id } => Self::apply_remove_row(record, list, *id),
        }
    }

    fn apply_set(record: &mut Record, path: &FieldPath, value: &Scalar) -> Result<MutationResult, EditorError> {
        let outcome = record.set(path, value.clone())?;
        if outcome.previous.as_ref() == Some(value) {
            return Ok(MutationResult::unchanged());
        }

        let inverse = match (outcome.previous, &outcome.created) {
            (Some(previous), _) => Mutation::SetField {
                path: outcome.path.clone(),
                value: previous,
            },
            (None, Some(created)) => removal_of(created),
            (None, None) => Mutation::ClearField {
                path: outcome.path.clone(),
            },
        };

        let mut changed = vec![outcome.path];
        changed.extend(outcome.created);
        Ok(MutationResult {
            inverse: Some(inverse),
            changed,
            row: None,
        })
    }

    fn apply_clear(record: &mut Record, path: &FieldPath) -> Result<MutationResult, EditorError> {
        let path = record.canonicalize(path)?;
        let Some(removed) = record.remove(&path)? else {
            return Ok(MutationResult::unchanged());
        };
        Ok(MutationResult {
            inverse: Some(Mutation::RestoreField {
                path: path.clone(),
                value: encode_node(&removed),
            }),
            changed: vec![path],
            row: None,
        })
    }

    fn apply_restore(record: &mut Record, path: &FieldPath, value: &Value) -> Result<MutationResult, EditorError> {
        let path = record.canonicalize(path)?;
        let node = decode_node(value, &path.to_string())?;
        let previous = record.insert_node(&path, node)?;
        let inverse = match previous {
            Some(previous) => Mutation::RestoreField {
                path: path.clone(),
                value: encode_node(&previous),
            },
            None => Mutation::ClearField { path: path.clone() },
        };
        Ok(MutationResult {
            inverse: Some(inverse),
            changed: vec![path],
            row: None,
        })
    }

    fn apply_add_row(
        record: &mut Record,
        schema: &FormSchema,
        list: &FieldPath,
        template: &Document,
    ) -> Result<MutationResult, EditorError> {
        let list = resolve_list(record, list)?;
        let forced = match template.get(ROW_ID_FIELD) {
            None => None,
            Some(id) => Some(id.as_u64().map(RowId).ok_or_else(|| PathError::InvalidRowId {
                path: list.to_string(),
            })?),
        };
        let fields = if template.is_empty() {
            schema.row_template(&list).cloned().unwrap_or_default()
        } else {
            let mut fields = template.clone();
            fields.remove(ROW_ID_FIELD);
            Row::try_from(Value::Object(fields))?.fields
        };

        let rows = record.list_mut(&list)?;
        let id = match forced {
            Some(id) if rows.iter().any(|r| r.id == id) => {
                return Err(EditorError::DuplicateRowId { list, id: id.0 });
            }
            Some(id) => id,
            None => next_row_id(rows),
        };
        rows.push(Row::with_fields(id, fields));

        Ok(MutationResult {
            inverse: Some(Mutation::RemoveRow { list: list.clone(), id }),
            changed: vec![list.row(id)],
            row: Some(id),
        })
    }

    fn apply_insert_row(
        record: &mut Record,
        list: &FieldPath,
        index: usize,
        row: &Row,
    ) -> Result<MutationResult, EditorError> {
        let list = resolve_list(record, list)?;
        let rows = record.list_mut(&list)?;
        if rows.iter().any(|r| r.id == row.id) {
            return Err(EditorError::DuplicateRowId { list, id: row.id.0 });
        }
        rows.insert(index.min(rows.len()), row.clone());

        Ok(MutationResult {
            inverse: Some(Mutation::RemoveRow {
                list: list.clone(),
                id: row.id,
            }),
            changed: vec![list.row(row.id)],
            row: Some(row.id),
        })
    }

    fn apply_remove_row(record: &mut Record, list: &FieldPath, id: RowId) -> Result<MutationResult, EditorError> {
        let list = resolve_list(record, list)?;
        match record.get(&list) {
            None => return Ok(MutationResult::unchanged()),
            Some(Node::List(_)) => {}
            Some(_) => {
                return Err(PathError::NotAList {
                    path: list.to_string(),
                    at: list.to_string(),
                }
                .into())
            }
        }

        let rows = record.list_mut(&list)?;
        let Some(index) = rows.iter().position(|r| r.id == id) else {
            return Ok(MutationResult::unchanged());
        };
        let row = rows.remove(index);

        Ok(MutationResult {
            inverse: Some(Mutation::InsertRow {
                list: list.clone(),
                index,
                row,
            }),
            changed: vec![list.row(id)],
            row: Some(id),
        })
    }
}
