//! Conversion between records and stored JSON documents
//!
//! Lists are arrays of objects, each carrying its row id under `"id"`.
//! Rows whose id is missing, malformed or already taken are given fresh
//! ids on decode so the row-identity invariant holds for documents edited
//! outside the engine.

use crate::error::DecodeError;
use crate::record::{next_row_id, Node, Record, Row, RowId};
use crate::value::Scalar;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Stored form of a record
pub type Document = Map<String, Value>;

/// Field name carrying row identity
pub const ROW_ID_FIELD: &str = "id";

impl Record {
    pub fn from_document(document: &Document) -> Result<Self, DecodeError> {
        Ok(Record::from_fields(decode_object(document, "")?))
    }

    pub fn to_document(&self) -> Document {
        encode_object(self.fields())
    }

    /// Merge-patch carrying every top-level key that differs from `baseline`.
    ///
    /// Keys removed since the baseline are sent as `null`.
    pub fn patch_since(&self, baseline: &Record) -> Document {
        self.changed_keys(baseline)
            .into_iter()
            .map(|key| {
                let value = self.fields().get(key).map(encode_node).unwrap_or(Value::Null);
                (key.to_string(), value)
            })
            .collect()
    }
}

pub fn encode_scalar(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Text(s) => Value::String(s.clone()),
        Scalar::Number(n) => {
            if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_992.0 {
                Value::from(*n as i64)
            } else {
                Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null)
            }
        }
    }
}

pub fn encode_node(node: &Node) -> Value {
    match node {
        Node::Scalar(scalar) => encode_scalar(scalar),
        Node::Object(fields) => Value::Object(encode_object(fields)),
        Node::List(rows) => Value::Array(rows.iter().map(|row| Value::Object(encode_row(row))).collect()),
    }
}

fn encode_object(fields: &BTreeMap<String, Node>) -> Document {
    fields
        .iter()
        .map(|(key, node)| (key.clone(), encode_node(node)))
        .collect()
}

fn encode_row(row: &Row) -> Document {
    let mut object = Map::new();
    object.insert(ROW_ID_FIELD.to_string(), Value::from(row.id.0));
    object.extend(encode_object(&row.fields));
    object
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn decode_object(object: &Document, prefix: &str) -> Result<BTreeMap<String, Node>, DecodeError> {
    object
        .iter()
        .map(|(key, value)| {
            let path = join(prefix, key);
            decode_value(value, &path).map(|node| (key.clone(), node))
        })
        .collect()
}

/// Decode one JSON value; `path` names its location in error messages
pub fn decode_node(value: &Value, path: &str) -> Result<Node, DecodeError> {
    decode_value(value, path)
}

fn decode_value(value: &Value, path: &str) -> Result<Node, DecodeError> {
    Ok(match value {
        Value::Null => Node::Scalar(Scalar::Null),
        Value::Bool(b) => Node::Scalar(Scalar::Bool(*b)),
        Value::String(s) => Node::Scalar(Scalar::Text(s.clone())),
        Value::Number(n) => {
            let n = n.as_f64().ok_or_else(|| DecodeError::UnsupportedNumber {
                path: path.to_string(),
            })?;
            Node::Scalar(Scalar::Number(n))
        }
        Value::Object(object) => Node::Object(decode_object(object, path)?),
        Value::Array(items) => Node::List(decode_rows(items, path)?),
    })
}

fn decode_rows(items: &[Value], path: &str) -> Result<Vec<Row>, DecodeError> {
    let objects = items
        .iter()
        .map(|item| {
            item.as_object().ok_or_else(|| DecodeError::UnsupportedArray {
                path: path.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = BTreeSet::new();
    let mut rows = Vec::with_capacity(objects.len());
    let mut unassigned = Vec::new();
    for (position, object) in objects.into_iter().enumerate() {
        let mut fields = object.clone();
        let id = fields
            .remove(ROW_ID_FIELD)
            .and_then(|id| id.as_u64())
            .filter(|id| seen.insert(*id));
        let row_path = format!("{}.{}", path, position);
        let fields = decode_object(&fields, &row_path)?;
        match id {
            Some(id) => rows.push(Row::with_fields(RowId(id), fields)),
            None => {
                unassigned.push(rows.len());
                rows.push(Row::with_fields(RowId(0), fields));
            }
        }
    }

    for position in unassigned {
        let id = next_row_id(&rows);
        rows[position].id = id;
    }
    Ok(rows)
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.to_document())
    }
}

impl TryFrom<Value> for Record {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(document) => Record::from_document(&document),
            _ => Err(DecodeError::NotAnObject),
        }
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        Value::Object(encode_row(&row))
    }
}

impl TryFrom<Value> for Row {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut rows = decode_rows(std::slice::from_ref(&value), "row")?;
        rows.pop().ok_or(DecodeError::NotAnObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FieldPath;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_round_trip() {
        let doc = document(json!({
            "projectName": "Harbour Library",
            "contractSum": 125000,
            "retainage": 2.5,
            "approved": false,
            "changeOrdersPrevious": { "additions": "1200", "deductions": "" },
            "items": [
                { "id": 1, "qty": "100", "rate": "5", "amount": "500.00" },
                { "id": 7, "qty": "", "rate": "", "amount": "" }
            ]
        }));
        let record = Record::from_document(&doc).unwrap();
        assert_eq!(record.to_document(), doc);
    }

    #[test]
    fn test_rows_without_ids_get_fresh_ones() {
        let doc = document(json!({
            "items": [
                { "id": 4, "qty": "1" },
                { "qty": "2" },
                { "id": 4, "qty": "3" },
                { "id": "x", "qty": "4" }
            ]
        }));
        let record = Record::from_document(&doc).unwrap();
        let ids: Vec<u64> = record
            .list(&FieldPath::field("items"))
            .unwrap()
            .iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_unassigned_row_after_max_id_takes_free_id() {
        let doc = document(json!({
            "items": [{ "id": u64::MAX, "qty": "1" }, { "qty": "2" }]
        }));
        let record = Record::from_document(&doc).unwrap();
        let ids: Vec<u64> = record
            .list(&FieldPath::field("items"))
            .unwrap()
            .iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, vec![u64::MAX, 1]);
    }

    #[test]
    fn test_arrays_of_scalars_are_rejected() {
        let doc = document(json!({ "tags": ["a", "b"] }));
        assert_eq!(
            Record::from_document(&doc),
            Err(DecodeError::UnsupportedArray {
                path: "tags".to_string()
            })
        );
    }

    #[test]
    fn test_patch_since_baseline() {
        let baseline = Record::from_document(&document(json!({
            "title": "A",
            "items": [{ "id": 1, "qty": "" }]
        })))
        .unwrap();
        let mut edited = baseline.clone();
        edited
            .set(&FieldPath::parse("items.0.qty").unwrap(), Scalar::text("9"))
            .unwrap();

        let patch = edited.patch_since(&baseline);
        assert_eq!(Value::Object(patch), json!({ "items": [{ "id": 1, "qty": "9" }] }));
    }

    #[test]
    fn test_integral_numbers_encode_as_integers() {
        assert_eq!(encode_scalar(&Scalar::Number(119944.0)), json!(119944));
        assert_eq!(encode_scalar(&Scalar::Number(0.5)), json!(0.5));
        assert_eq!(encode_scalar(&Scalar::Number(f64::NAN)), Value::Null);
    }
}
