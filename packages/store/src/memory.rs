//! In-process document store

use crate::error::StoreError;
use crate::merge::apply_put;
use crate::path::DocumentPath;
use crate::{Ack, Document, DocumentStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct Stored {
    document: Document,
    revision: u64,
}

/// One `put` call as the store received it
#[derive(Debug, Clone, PartialEq)]
pub struct PutRecord {
    pub path: DocumentPath,
    pub patch: Document,
    pub merge: bool,
}

/// Map-backed store.
///
/// Failures can be switched on to exercise error paths: while set, every
/// `get` or `put` returns [`StoreError::Unavailable`] and changes nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentPath, Stored>>,
    puts: Mutex<Vec<PutRecord>>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Seed a document without recording a put
    pub async fn insert(&self, path: DocumentPath, document: Document) {
        let mut documents = self.documents.write().await;
        let revision = documents.get(&path).map_or(1, |s| s.revision + 1);
        documents.insert(path, Stored { document, revision });
    }

    /// Current stored document, bypassing failure injection
    pub async fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.documents.read().await.get(path).map(|s| s.document.clone())
    }

    /// Every successful put, oldest first
    pub async fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(path.as_str(), "injected get failure"));
        }
        let document = self.documents.read().await.get(path).map(|s| s.document.clone());
        debug!(path = %path, found = document.is_some(), "memory get");
        Ok(document)
    }

    async fn put(&self, path: &DocumentPath, patch: Document, merge: bool) -> Result<Ack, StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(path.as_str(), "injected put failure"));
        }

        let revision = {
            let mut documents = self.documents.write().await;
            let existing = documents.remove(path);
            let revision = existing.as_ref().map_or(1, |s| s.revision + 1);
            let document = apply_put(existing.map(|s| s.document), patch.clone(), merge);
            documents.insert(path.clone(), Stored { document, revision });
            revision
        };

        self.puts.lock().await.push(PutRecord {
            path: path.clone(),
            patch,
            merge,
        });
        debug!(path = %path, revision, merge, "memory put");
        Ok(Ack { revision })
    }
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

    fn path() -> DocumentPath {
        DocumentPath::parse("users/u1/boq/job").unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_merges_and_counts_revisions() {
        let store = MemoryStore::new();
        let ack = store.put(&path(), document(json!({ "a": 1 })), true).await.unwrap();
        assert_eq!(ack.revision, 1);
        let ack = store.put(&path(), document(json!({ "b": 2 })), true).await.unwrap();
        assert_eq!(ack.revision, 2);

        let stored = store.get(&path()).await.unwrap().unwrap();
        assert_eq!(Value::Object(stored), json!({ "a": 1, "b": 2 }));
        assert_eq!(store.puts().await.len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures_change_nothing() {
        let store = MemoryStore::new();
        store.set_fail_puts(true);
        let err = store.put(&path(), document(json!({ "a": 1 })), true).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(store.is_empty().await);
        assert!(store.puts().await.is_empty());

        store.set_fail_gets(true);
        assert!(store.get(&path()).await.is_err());
    }
}
