//! Merge-patch semantics shared by every store

use folio_record::Document;

/// Result of a put over `existing`.
///
/// A merge put overwrites only the top-level keys it carries and deletes
/// the keys whose patch value is `null`; a plain put replaces the document.
pub fn apply_put(existing: Option<Document>, patch: Document, merge: bool) -> Document {
    if !merge {
        return patch;
    }
    let mut document = existing.unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            document.remove(&key);
        } else {
            document.insert(key, value);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_merge_is_shallow() {
        let existing = document(json!({
            "title": "A",
            "owner": { "name": "x", "phone": "1" }
        }));
        let patch = document(json!({ "owner": { "name": "y", "phone": null } }));
        let merged = apply_put(Some(existing), patch, true);
        assert_eq!(
            Value::Object(merged),
            json!({ "title": "A", "owner": { "name": "y", "phone": null } })
        );
    }

    #[test]
    fn test_merge_null_deletes_key() {
        let existing = document(json!({ "title": "A", "items": [{ "id": 1 }], "notes": "x" }));
        let patch = document(json!({ "items": null, "notes": null, "status": "draft" }));
        let merged = apply_put(Some(existing), patch, true);
        assert_eq!(Value::Object(merged), json!({ "title": "A", "status": "draft" }));

        let created = apply_put(None, document(json!({ "a": 1, "b": null })), true);
        assert_eq!(Value::Object(created), json!({ "a": 1 }));
    }

    #[test]
    fn test_plain_put_replaces() {
        let existing = document(json!({ "title": "A" }));
        let replaced = apply_put(Some(existing), document(json!({ "b": 1 })), false);
        assert_eq!(Value::Object(replaced), json!({ "b": 1 }));
    }

    #[test]
    fn test_merge_into_missing_creates() {
        let created = apply_put(None, document(json!({ "b": 1 })), true);
        assert_eq!(Value::Object(created), json!({ "b": 1 }));
    }
}
