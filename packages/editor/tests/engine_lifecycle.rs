//! Mode machine, load and save behaviour of the form engine

mod common;

use common::*;
use folio_editor::{EditorError, EngineOptions, FormEngine, LoadState, Mode, RowId, Scalar};
use folio_store::{DocumentStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_missing_document_starts_from_template() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = FormEngine::new(store, boq_schema());
    assert_eq!(engine.load_state(), LoadState::Loading);

    engine.load(boq_path()).await.unwrap();

    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert_eq!(engine.mode(), Mode::Viewing);
    assert!(engine.is_new());
    assert!(!engine.is_dirty());
    assert_eq!(engine.record().scalar(&path("items[#1].qty")), Some(&Scalar::text("")));
}

#[tokio::test]
async fn test_edits_require_editing_mode() {
    let mut engine = FormEngine::new(Arc::new(MemoryStore::new()), boq_schema());
    assert!(matches!(engine.begin_edit(), Err(EditorError::NotLoaded)));

    engine.load(boq_path()).await.unwrap();
    let err = engine.set_field(&path("items.0.qty"), "1").unwrap_err();
    assert!(matches!(err, EditorError::InvalidTransition { mode: Mode::Viewing, .. }));

    engine.begin_edit().unwrap();
    // Entering edit mode twice is harmless
    engine.begin_edit().unwrap();
    engine.set_field(&path("items.0.qty"), "1").unwrap();
    assert!(engine.is_dirty());

    let err = engine.load(boq_path()).await.unwrap_err();
    assert!(matches!(err, EditorError::InvalidTransition { mode: Mode::Editing, .. }));
}

#[tokio::test]
async fn test_cancel_restores_baseline() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(
            boq_path(),
            document(json!({ "items": [{ "id": 1, "qty": "2", "rate": "3", "amount": "6.00" }], "subtotal": "6.00" })),
        )
        .await;
    let mut engine = FormEngine::new(store.clone(), boq_schema());
    engine.load(boq_path()).await.unwrap();
    let loaded = engine.record().clone();

    engine.begin_edit().unwrap();
    engine.set_field(&path("items.0.qty"), "10").unwrap();
    engine.add_row(&path("items"), Default::default()).unwrap();
    assert!(engine.remove_row(&path("items"), RowId(1)).unwrap());
    assert_eq!(engine.record().list(&path("items")).map(<[_]>::len), Some(1));
    engine.cancel_edit().unwrap();

    assert_eq!(engine.mode(), Mode::Viewing);
    assert_eq!(engine.record(), &loaded);
    assert_eq!(engine.record().list(&path("items")).unwrap()[0].id, RowId(1));
    assert!(!engine.can_undo());
    assert!(store.puts().await.is_empty());
}

#[tokio::test]
async fn test_save_failure_returns_to_editing() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = FormEngine::new(store.clone(), boq_schema());
    engine.load(boq_path()).await.unwrap();
    engine.begin_edit().unwrap();
    engine.set_field(&path("items.0.qty"), "4").unwrap();

    store.set_fail_puts(true);
    let err = engine.save().await.unwrap_err();
    assert!(matches!(err, EditorError::Store(_)));
    assert_eq!(engine.mode(), Mode::Editing);
    assert_eq!(engine.record().scalar(&path("items[#1].qty")), Some(&Scalar::text("4")));
    assert!(engine.is_new());

    store.set_fail_puts(false);
    let ack = engine.save().await.unwrap();
    assert_eq!(ack.revision, 1);
    assert_eq!(engine.mode(), Mode::Viewing);
    assert!(!engine.is_new());
    assert!(!engine.is_dirty());
}

#[tokio::test]
async fn test_load_failure_can_be_retried() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(boq_path(), document(json!({ "items": [{ "id": 1, "qty": "7", "rate": "", "amount": "" }] })))
        .await;
    let mut engine = FormEngine::new(store.clone(), boq_schema());

    store.set_fail_gets(true);
    assert!(matches!(engine.load(boq_path()).await, Err(EditorError::Store(_))));
    assert_eq!(engine.load_state(), LoadState::LoadFailed);
    assert!(engine.record().is_empty());
    assert!(matches!(engine.begin_edit(), Err(EditorError::NotLoaded)));

    store.set_fail_gets(false);
    engine.load(boq_path()).await.unwrap();
    assert_eq!(engine.load_state(), LoadState::Loaded);
    assert!(!engine.is_new());
    assert_eq!(engine.record().scalar(&path("items[#1].qty")), Some(&Scalar::text("7")));
}

#[tokio::test]
async fn test_non_object_rows_fail_the_load() {
    let store = Arc::new(MemoryStore::new());
    store.insert(boq_path(), document(json!({ "items": [1, 2] }))).await;
    let mut engine = FormEngine::new(store, boq_schema());

    assert!(matches!(engine.load(boq_path()).await, Err(EditorError::Decode(_))));
    assert_eq!(engine.load_state(), LoadState::LoadFailed);
}

#[tokio::test]
async fn test_save_patch_carries_changed_keys_only() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(
            boq_path(),
            document(json!({
                "items": [{ "id": 1, "qty": "", "rate": "", "amount": "" }],
                "status": "draft",
                "notes": "keep me"
            })),
        )
        .await;
    let mut engine = FormEngine::new(store.clone(), boq_schema());
    engine.load(boq_path()).await.unwrap();
    engine.begin_edit().unwrap();
    engine.set_field(&path("status"), "issued").unwrap();
    engine.save().await.unwrap();

    let puts = store.puts().await;
    assert_eq!(puts.len(), 1);
    assert!(puts[0].merge);
    assert_eq!(puts[0].patch, document(json!({ "status": "issued" })));

    let stored = store.document(&boq_path()).await.unwrap();
    assert_eq!(stored["notes"], json!("keep me"));
    assert_eq!(stored["status"], json!("issued"));
}

#[tokio::test]
async fn test_stalled_save_blocks_a_second_save() {
    let mut engine = FormEngine::new(StalledStore, boq_schema());
    engine.load(boq_path()).await.unwrap();
    engine.begin_edit().unwrap();
    engine.set_field(&path("items.0.qty"), "1").unwrap();

    let stalled = tokio::time::timeout(Duration::from_millis(20), engine.save()).await;
    assert!(stalled.is_err());
    assert_eq!(engine.mode(), Mode::Saving);

    assert!(matches!(engine.save().await, Err(EditorError::SaveInProgress)));
    assert!(matches!(
        engine.set_field(&path("items.0.qty"), "2"),
        Err(EditorError::InvalidTransition { mode: Mode::Saving, .. })
    ));
    assert!(engine.cancel_edit().is_err());
}

#[tokio::test]
async fn test_strict_mode_checks_kinds_and_allowed_values() {
    let options = EngineOptions {
        strict: true,
        ..EngineOptions::default()
    };
    let mut engine = FormEngine::with_options(Arc::new(MemoryStore::new()), boq_schema(), options);
    engine.load(boq_path()).await.unwrap();
    engine.begin_edit().unwrap();

    let err = engine.set_field(&path("items.0.qty"), "lots").unwrap_err();
    assert!(matches!(err, EditorError::KindMismatch { .. }));
    let err = engine.set_field(&path("status"), "archived").unwrap_err();
    assert!(matches!(err, EditorError::ValueNotAllowed { .. }));

    engine.set_field(&path("items.0.qty"), "1,200").unwrap();
    engine.set_field(&path("status"), "draft").unwrap();
    // Blank input is always accepted
    engine.set_field(&path("items.0.qty"), "").unwrap();
}

#[tokio::test]
async fn test_lenient_mode_stores_text_as_is() {
    let mut engine = editing_engine().await;
    engine.set_field(&path("items.0.qty"), "lots").unwrap();
    assert_eq!(engine.record().scalar(&path("items[#1].qty")), Some(&Scalar::text("lots")));
    assert_eq!(engine.record().scalar(&path("items[#1].amount")), Some(&Scalar::text("")));
}

#[tokio::test]
async fn test_store_trait_object_is_accepted() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let mut engine = FormEngine::new(store, boq_schema());
    engine.load(boq_path()).await.unwrap();
    assert!(engine.is_new());
}
