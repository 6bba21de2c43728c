use thiserror::Error;

pub type PathResult<T> = Result<T, PathError>;

/// Malformed field paths, and well-formed paths that do not fit the record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Empty field path")]
    Empty,

    #[error("Unexpected character in `{path}` at {pos}")]
    UnexpectedChar { path: String, pos: usize },

    #[error("Unexpected token in `{path}` at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        path: String,
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of `{path}`: expected {expected}")]
    UnexpectedEnd { path: String, expected: String },

    #[error("Field path `{path}` must start with a field name")]
    MustStartWithField { path: String },

    #[error("Wildcards are only allowed in field patterns: `{path}`")]
    WildcardNotAllowed { path: String },

    #[error("Field patterns address rows with `*`, not positions: `{path}`")]
    PositionInPattern { path: String },

    #[error("`id` is reserved for row identity: `{path}`")]
    ReservedField { path: String },

    #[error("`{at}` in `{path}` is not an object")]
    NotAnObject { path: String, at: String },

    #[error("`{at}` in `{path}` is not a list")]
    NotAList { path: String, at: String },

    #[error("`{path}` does not address a scalar field")]
    NotAScalar { path: String },

    #[error("Row index {index} out of range in `{path}` (list has {len} rows)")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("No row with id {id} in `{path}`")]
    RowNotFound { path: String, id: u64 },

    #[error("Row id given for `{path}` must be a non-negative integer")]
    InvalidRowId { path: String },
}

impl PathError {
    pub fn unexpected_token(
        path: impl Into<String>,
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            path: path.into(),
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_end(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnexpectedEnd {
            path: path.into(),
            expected: expected.into(),
        }
    }
}

/// A stored document that cannot be represented as a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Expected a JSON object at the document root")]
    NotAnObject,

    #[error("Unsupported array at `{path}`: list fields must contain only objects")]
    UnsupportedArray { path: String },

    #[error("Unsupported number at `{path}`")]
    UnsupportedNumber { path: String },
}

/// Static schema definitions that fail to build
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid pattern in schema `{schema}`: {source}")]
    Pattern {
        schema: String,
        #[source]
        source: PathError,
    },

    #[error("Invalid template in schema `{schema}`: {source}")]
    Template {
        schema: String,
        #[source]
        source: DecodeError,
    },

    #[error("Template for schema `{schema}` must be a JSON object")]
    TemplateNotAnObject { schema: String },

    #[error("Derived field `{field}` in schema `{schema}` has no inputs")]
    NoInputs { schema: String, field: String },
}
