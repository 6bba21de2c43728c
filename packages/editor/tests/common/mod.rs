#![allow(dead_code)]

use async_trait::async_trait;
use folio_editor::{DocumentPath, DocumentStore, FieldPath, FormEngine, FormSchema};
use folio_record::{derive, Document, FieldSpec, SchemaBuilder};
use folio_store::{Ack, MemoryStore, StoreError};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn path(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

pub fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

pub fn boq_path() -> DocumentPath {
    DocumentPath::scoped("u1", "boq/bill-of-quantity").unwrap()
}

pub fn boq_schema() -> Arc<FormSchema> {
    Arc::new(
        SchemaBuilder::new("boq")
            .title("Bill of Quantity")
            .field(FieldSpec::text("items.*.description"))
            .field(FieldSpec::number("items.*.qty").label("Qty"))
            .field(FieldSpec::number("items.*.rate").label("Rate"))
            .field(FieldSpec::text("items.*.amount").label("Amount").derived(derive::product("items.*.qty", "items.*.rate")))
            .field(FieldSpec::text("subtotal").derived(derive::sum(&["items.*.amount"])))
            .field(FieldSpec::text("status").allowed(["draft", "issued"]))
            .template(json!({ "items": [{ "id": 1, "qty": "", "rate": "", "amount": "" }] }))
            .row_template("items", json!({ "qty": "", "rate": "", "amount": "" }))
            .build()
            .unwrap(),
    )
}

pub async fn editing_engine() -> FormEngine<Arc<MemoryStore>> {
    let mut engine = FormEngine::new(Arc::new(MemoryStore::new()), boq_schema());
    engine.load(boq_path()).await.unwrap();
    engine.begin_edit().unwrap();
    engine
}

/// Store whose puts never complete
pub struct StalledStore;

#[async_trait]
impl DocumentStore for StalledStore {
    async fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(None)
    }

    async fn put(&self, _path: &DocumentPath, _patch: Document, _merge: bool) -> Result<Ack, StoreError> {
        std::future::pending().await
    }
}
