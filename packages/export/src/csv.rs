use crate::{ExportError, ExportFormat, Exporter, Snapshot};

/// RFC 4180 CSV: CRLF line endings, fields quoted only when they contain a
/// comma, a quote, or a line break
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n'])
}

fn write_field(out: &mut String, field: &str) {
    if needs_quotes(field) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn write_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push_str("\r\n");
}

impl Exporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();
        write_record(&mut out, &snapshot.table.header);
        for row in &snapshot.table.rows {
            write_record(&mut out, row);
        }
        Ok(out.into_bytes())
    }
}
