use super::*;
use chrono::TimeZone;
use folio_record::Record;
use serde_json::json;

fn snapshot(format: ExportFormat) -> Snapshot {
    let record = Record::try_from(json!({
        "client": "Acme, Inc.",
        "items": [
            { "id": 1, "description": "Say \"hi\"", "amount": "10.00" },
            { "id": 2, "description": "Line one\nline two", "amount": "5.50" }
        ]
    }))
    .unwrap();
    let table = record.flatten(&["items.description".to_string(), "items.amount".to_string()]);
    Snapshot::new(format, "Bill of <Quantity>", table)
        .generated_at(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
}

fn export(format: ExportFormat) -> String {
    let bytes = ExportRegistry::new().export(&snapshot(format)).unwrap();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_csv_quotes_special_fields() {
    let csv = export(ExportFormat::Csv);
    let expected = "items.description,items.amount,client\r\n\
                    \"Say \"\"hi\"\"\",10.00,\"Acme, Inc.\"\r\n\
                    \"Line one\nline two\",5.50,\"Acme, Inc.\"\r\n";
    assert_eq!(csv, expected);
}

#[test]
fn test_csv_repeats_scalars_per_list_row() {
    let csv = export(ExportFormat::Csv);
    assert_eq!(csv.matches("\"Acme, Inc.\"").count(), 2);
}

#[test]
fn test_html_escapes_and_uses_labels() {
    let snapshot = snapshot(ExportFormat::Html).with_labels(|column| {
        (column == "items.amount").then(|| "Amount".to_string())
    });
    let html = String::from_utf8(ExportRegistry::new().export(&snapshot).unwrap()).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Bill of &lt;Quantity&gt;</title>"));
    assert!(html.contains("<th>Amount</th>"));
    assert!(html.contains("<th>items.description</th>"));
    assert!(html.contains("<td>Say &quot;hi&quot;</td>"));
    assert!(html.contains("<footer>Generated 2024-03-01 09:30 UTC</footer>"));
    assert!(html.contains("@media print"));
}

#[test]
fn test_html_without_pretty_print() {
    let exporter = HtmlExporter::new(HtmlOptions {
        pretty: false,
        print_styles: false,
        ..HtmlOptions::default()
    });
    let html = String::from_utf8(exporter.export(&snapshot(ExportFormat::Html)).unwrap()).unwrap();
    assert!(html.starts_with("<!DOCTYPE html><html><head>"));
    assert!(html.contains("<tr><td>Say &quot;hi&quot;</td>"));
    assert!(!html.contains("<style>"));
}

#[test]
fn test_pdf_is_unsupported_by_default() {
    let err = ExportRegistry::new().export(&snapshot(ExportFormat::Pdf)).unwrap_err();
    assert!(matches!(err, ExportError::UnsupportedFormat(ExportFormat::Pdf)));
}

#[test]
fn test_custom_exporter_can_supply_pdf() {
    struct FakePdf;

    impl Exporter for FakePdf {
        fn format(&self) -> ExportFormat {
            ExportFormat::Pdf
        }

        fn export(&self, snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
            Ok(format!("%PDF {} rows", snapshot.table.rows.len()).into_bytes())
        }
    }

    let mut registry = ExportRegistry::new();
    registry.register(FakePdf);
    assert!(registry.supports(ExportFormat::Pdf));
    let bytes = registry.export(&snapshot(ExportFormat::Pdf)).unwrap();
    assert_eq!(bytes, b"%PDF 2 rows");
}

#[test]
fn test_ragged_rows_are_rejected() {
    let mut snapshot = snapshot(ExportFormat::Csv);
    snapshot.table.rows[1].pop();
    let err = ExportRegistry::new().export(&snapshot).unwrap_err();
    assert!(matches!(err, ExportError::RaggedRow { row: 1, expected: 3, found: 2 }));
}

#[test]
fn test_format_parsing() {
    assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
    assert_eq!(ExportFormat::Html.content_type(), "text/html; charset=utf-8");
    assert!("docx".parse::<ExportFormat>().is_err());
}
