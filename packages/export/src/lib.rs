//! # Folio Export
//!
//! Renders a flattened record snapshot into a downloadable format.
//!
//! ```text
//! Record ──flatten──> FlatTable ──Snapshot──> Exporter ──> bytes
//! ```
//!
//! CSV and HTML ship with the crate. PDF needs a drawing library, so it is
//! only available when the caller registers its own [`Exporter`].

mod csv;
mod error;
mod html;

#[cfg(test)]
mod tests;

pub use csv::CsvExporter;
pub use error::ExportError;
pub use html::{HtmlExporter, HtmlOptions};

use chrono::{DateTime, Utc};
use folio_record::FlatTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Csv,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            "html" => Ok(ExportFormat::Html),
            other => Err(format!("unknown export format `{}`", other)),
        }
    }
}

/// Read-only flattened view of a record, tagged with the requested format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: ExportFormat,
    pub title: String,
    pub table: FlatTable,
    /// Display label per header column
    pub labels: Vec<String>,
    pub generated: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(format: ExportFormat, title: impl Into<String>, table: FlatTable) -> Self {
        Self {
            format,
            title: title.into(),
            labels: table.header.clone(),
            table,
            generated: Utc::now(),
        }
    }

    /// Replace labels for the columns `label` knows about
    pub fn with_labels<F>(mut self, label: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.labels = self
            .table
            .header
            .iter()
            .map(|column| label(column).unwrap_or_else(|| column.clone()))
            .collect();
        self
    }

    pub fn generated_at(mut self, generated: DateTime<Utc>) -> Self {
        self.generated = generated;
        self
    }

    fn check_shape(&self) -> Result<(), ExportError> {
        let expected = self.table.header.len();
        match self.table.rows.iter().position(|row| row.len() != expected) {
            Some(row) => Err(ExportError::RaggedRow {
                row,
                expected,
                found: self.table.rows[row].len(),
            }),
            None => Ok(()),
        }
    }
}

/// Renders snapshots of one format
pub trait Exporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError>;
}

/// Exporters by format; the last registered for a format wins
pub struct ExportRegistry {
    exporters: Vec<Box<dyn Exporter>>,
}

impl ExportRegistry {
    pub fn empty() -> Self {
        Self {
            exporters: Vec::new(),
        }
    }

    /// CSV and HTML
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(CsvExporter);
        registry.register(HtmlExporter::default());
        registry
    }

    pub fn register(&mut self, exporter: impl Exporter + 'static) {
        self.exporters.push(Box::new(exporter));
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        self.exporters.iter().any(|e| e.format() == format)
    }

    pub fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
        let exporter = self
            .exporters
            .iter()
            .rev()
            .find(|e| e.format() == snapshot.format)
            .ok_or(ExportError::UnsupportedFormat(snapshot.format))?;
        snapshot.check_shape()?;
        let bytes = exporter.export(snapshot)?;
        debug!(format = %snapshot.format, rows = snapshot.table.rows.len(), bytes = bytes.len(), "Snapshot exported");
        Ok(bytes)
    }
}

impl Default for ExportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
