//! # Folio Store
//!
//! Remote document persistence behind the [`DocumentStore`] trait, with an
//! in-process [`MemoryStore`] and a directory-backed [`FileStore`].

pub mod error;
pub mod file;
pub mod memory;
pub mod merge;
pub mod path;

pub use error::StoreError;
pub use file::FileStore;
pub use folio_record::Document;
pub use memory::{MemoryStore, PutRecord};
pub use merge::apply_put;
pub use path::DocumentPath;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Acknowledgement of a successful put
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Revision of the document after the write, starting at 1
    pub revision: u64,
}

/// Keyed JSON document persistence.
///
/// `get` returns `Ok(None)` for a document that does not exist; that is not
/// an error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    async fn put(&self, path: &DocumentPath, patch: Document, merge: bool) -> Result<Ack, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        (**self).get(path).await
    }

    async fn put(&self, path: &DocumentPath, patch: Document, merge: bool) -> Result<Ack, StoreError> {
        (**self).put(path, patch, merge).await
    }
}
