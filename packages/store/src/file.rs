//! Directory-backed document store
//!
//! Each document is one pretty-printed JSON file at `<root>/<path>.json`:
//!
//! ```json
//! { "revision": 3, "document": { "projectName": "..." } }
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a reader never observes a half-written document.

use crate::error::StoreError;
use crate::merge::apply_put;
use crate::path::DocumentPath;
use crate::{Ack, Document, DocumentStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    revision: u64,
    document: Document,
}

pub struct FileStore {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_for(&self, path: &DocumentPath) -> PathBuf {
        self.root.join(path.to_file_path())
    }

    async fn read(&self, path: &DocumentPath) -> Result<Option<Envelope>, StoreError> {
        let file = self.file_for(path);
        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(path.as_str(), err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                path: path.to_string(),
                source,
            })
    }

    async fn write(&self, path: &DocumentPath, envelope: &Envelope) -> Result<(), StoreError> {
        let file = self.file_for(path);
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::io(path.as_str(), err))?;
        }

        let payload = serde_json::to_vec_pretty(envelope).map_err(|source| StoreError::Serialization {
            path: path.to_string(),
            source,
        })?;

        let temp = file.with_extension("json.tmp");
        tokio::fs::write(&temp, payload)
            .await
            .map_err(|err| StoreError::io(path.as_str(), err))?;
        tokio::fs::rename(&temp, &file)
            .await
            .map_err(|err| StoreError::io(path.as_str(), err))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let envelope = self.read(path).await?;
        debug!(path = %path, found = envelope.is_some(), "file get");
        Ok(envelope.map(|e| e.document))
    }

    async fn put(&self, path: &DocumentPath, patch: Document, merge: bool) -> Result<Ack, StoreError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.read(path).await?;
        let revision = existing.as_ref().map_or(1, |e| e.revision + 1);
        let document = apply_put(existing.map(|e| e.document), patch, merge);
        self.write(path, &Envelope { revision, document }).await?;
        info!(path = %path, revision, merge, "document written");
        Ok(Ack { revision })
    }
}
