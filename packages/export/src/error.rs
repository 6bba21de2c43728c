use crate::ExportFormat;
use thiserror::Error;

/// Errors that can occur while rendering a snapshot
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No exporter registered for {0}")]
    UnsupportedFormat(ExportFormat),

    #[error("Row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Exporter failed: {0}")]
    Generic(String),
}

impl From<String> for ExportError {
    fn from(s: String) -> Self {
        ExportError::Generic(s)
    }
}
