//! Error types for the editor

use crate::engine::Mode;
use folio_record::{DecodeError, FieldPath, PathError, ScalarKind};
use folio_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Stored document cannot be edited: {0}")]
    Decode(#[from] DecodeError),

    #[error("Row id {id} already exists in `{list}`")]
    DuplicateRowId { list: FieldPath, id: u64 },

    #[error("Cannot {op} while {mode}")]
    InvalidTransition { op: &'static str, mode: Mode },

    #[error("No document loaded")]
    NotLoaded,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("`{0}` is derived from other fields")]
    DerivedField(FieldPath),

    #[error("`{path}` expects a {expected} value")]
    KindMismatch { path: FieldPath, expected: ScalarKind },

    #[error("`{path}` does not allow this value")]
    ValueNotAllowed { path: FieldPath },
}

impl EditorError {
    pub(crate) fn transition(op: &'static str, mode: Mode) -> Self {
        EditorError::InvalidTransition { op, mode }
    }
}
