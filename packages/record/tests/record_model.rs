//! Record model tests through the public API

use folio_record::{FieldPath, FieldPattern, Record, RowId, Scalar};
use serde_json::json;

fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

#[test]
fn test_document_edit_and_patch() {
    let baseline = Record::try_from(json!({
        "projectName": "Harbour Library",
        "changeOrdersPrevious": { "additions": "", "deductions": "" },
        "items": [{ "id": 1, "qty": "", "rate": "", "amount": "" }]
    }))
    .unwrap();

    let mut record = baseline.clone();
    let outcome = record.set(&path("items.0.qty"), Scalar::text("100")).unwrap();
    assert_eq!(outcome.path, path("items[#1].qty"));
    assert_eq!(outcome.previous, Some(Scalar::text("")));

    record
        .set(&path("changeOrdersPrevious.additions"), Scalar::text("1200"))
        .unwrap();

    let patch = serde_json::Value::Object(record.patch_since(&baseline));
    assert_eq!(
        patch,
        json!({
            "changeOrdersPrevious": { "additions": "1200", "deductions": "" },
            "items": [{ "id": 1, "qty": "100", "rate": "", "amount": "" }]
        })
    );
}

#[test]
fn test_row_ids_survive_reordering_positions() {
    let mut record = Record::try_from(json!({
        "items": [
            { "id": 3, "name": "c" },
            { "id": 1, "name": "a" }
        ]
    }))
    .unwrap();

    let by_id = path("items[#1].name");
    assert_eq!(record.scalar(&by_id), Some(&Scalar::text("a")));
    assert_eq!(record.canonicalize(&path("items.0.name")).unwrap(), path("items[#3].name"));

    record
        .list_mut(&FieldPath::field("items"))
        .unwrap()
        .retain(|row| row.id != RowId(3));
    assert_eq!(record.scalar(&by_id), Some(&Scalar::text("a")));
    assert_eq!(record.scalar(&path("items.0.name")), Some(&Scalar::text("a")));
}

#[test]
fn test_pattern_expansion_follows_rows() {
    let record = Record::try_from(json!({
        "tasks": [
            { "id": 1, "start": "2024-03-01" },
            { "id": 2, "start": "2024-04-01" }
        ]
    }))
    .unwrap();
    let pattern = FieldPattern::parse("tasks.*.start").unwrap();
    let paths: Vec<String> = record
        .expand(&pattern)
        .into_iter()
        .map(|(p, _)| p.to_string())
        .collect();
    assert_eq!(paths, vec!["tasks[#1].start", "tasks[#2].start"]);
    assert_eq!(pattern.matches(&path("tasks[#2].start")), Some(vec![RowId(2)]));
}

#[test]
fn test_flatten_for_export() {
    let record = Record::try_from(json!({
        "client": "Acme",
        "items": [{ "id": 1, "qty": 2, "amount": "10.00" }]
    }))
    .unwrap();
    let table = record.flatten(&["items.qty".to_string()]);
    assert_eq!(table.header, vec!["items.qty", "client", "items.amount"]);
    assert_eq!(table.rows, vec![vec!["2", "Acme", "10.00"]]);
}

#[test]
fn test_record_serde_uses_document_form() {
    let record: Record = serde_json::from_str(r#"{"items":[{"qty":"1"}]}"#).unwrap();
    let encoded = serde_json::to_value(&record).unwrap();
    assert_eq!(encoded, json!({ "items": [{ "id": 1, "qty": "1" }] }));
}
