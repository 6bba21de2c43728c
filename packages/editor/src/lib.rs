//! # Folio Editor
//!
//! Record form engine: loads one document, edits it through validated
//! mutations, keeps derived fields current and saves a merge-patch.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ store: DocumentStore get / put(merge)       │
//! └─────────────────────────────────────────────┘
//!                     ↕
//! ┌─────────────────────────────────────────────┐
//! │ editor: FormEngine                          │
//! │  - View/edit/save mode machine              │
//! │  - Mutations with validation                │
//! │  - Derived-field cascade (post-effects)     │
//! │  - Undo/redo history                        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ export: Snapshot → CSV / HTML bytes         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::FormEngine;
//!
//! let mut engine = FormEngine::new(store, schema);
//! engine.load(DocumentPath::scoped("u1", "boq/bill-of-quantity")?).await?;
//! engine.begin_edit()?;
//! engine.set_field(&"items.0.qty".parse()?, "100")?;
//! engine.set_field(&"items.0.rate".parse()?, "5")?;
//! engine.save().await?;
//! ```

mod engine;
mod errors;
mod mutations;
mod post_effects;
mod undo_stack;

pub use engine::{EngineOptions, FormEngine, LoadState, Mode};
pub use errors::EditorError;
pub use mutations::{Mutation, MutationResult};
pub use post_effects::{Applied, PostEffect, PostEffectEngine, RecomputeDerivedFields};
pub use undo_stack::{MutationBatch, UndoStack};

// Re-export common types for convenience
pub use folio_export::{ExportFormat, Snapshot};
pub use folio_record::{FieldPath, FormSchema, PathError, Record, RowId, Scalar};
pub use folio_store::{DocumentPath, DocumentStore};
