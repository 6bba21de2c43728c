//! # Folio Record
//!
//! Data model shared by every folio crate: the record tree, field paths and
//! patterns, the stored document codec, form schemas with derived fields, and
//! flattening for export.

pub mod document;
pub mod error;
pub mod lexer;
pub mod path;
pub mod record;
pub mod schema;
pub mod table;
pub mod value;

pub use document::{decode_node, encode_node, encode_scalar, Document, ROW_ID_FIELD};
pub use error::{DecodeError, PathError, PathResult, SchemaError};
pub use path::{FieldPath, FieldPattern, Segment};
pub use record::{next_row_id, Node, Record, Row, RowId, WriteOutcome};
pub use schema::{derive, Derivation, DeriveFn, FieldDescriptor, FieldSpec, FormSchema, SchemaBuilder};
pub use table::FlatTable;
pub use value::{format_money, format_number, Scalar, ScalarKind, DATE_FORMAT};
