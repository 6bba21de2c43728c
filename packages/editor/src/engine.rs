//! # Form Engine
//!
//! Owns one record, its view/edit mode and its persistence.
//!
//! ## Lifecycle
//!
//! ```text
//! Loading ──load──> Viewing ──begin_edit──> Editing ──save──> Saving
//!                     ▲                      │  ▲               │
//!                     └──────cancel_edit─────┘  └───save err────┤
//!                     ▲                                         │
//!                     └─────────────────save ok─────────────────┘
//! ```
//!
//! `save` is the only place the engine awaits while holding edits; the
//! `Saving` mode gates concurrent saves. A save future dropped before it
//! resolves leaves the engine in `Saving`.

use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationResult};
use crate::post_effects::PostEffectEngine;
use crate::undo_stack::UndoStack;
use folio_export::{ExportFormat, Snapshot};
use folio_record::{Derivation, Document, FieldDescriptor, FieldPath, FormSchema, Node, PathError, Record, RowId, Scalar};
use folio_store::{Ack, DocumentPath, DocumentStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Viewing,
    Editing,
    Saving,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Viewing => "viewing",
            Mode::Editing => "editing",
            Mode::Saving => "saving",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadState {
    Loading,
    Loaded,
    LoadFailed,
}

/// Engine behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Reject values that do not fit a field's declared kind or allowed set
    pub strict: bool,
    /// Undo depth (0 = unlimited)
    pub history_levels: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            history_levels: 100,
        }
    }
}

pub struct FormEngine<S> {
    store: S,
    schema: Arc<FormSchema>,
    options: EngineOptions,
    effects: PostEffectEngine,
    history: UndoStack,
    path: Option<DocumentPath>,
    mode: Mode,
    load_state: LoadState,
    record: Record,
    baseline: Record,
    is_new: bool,
}

impl<S: DocumentStore> FormEngine<S> {
    pub fn new(store: S, schema: Arc<FormSchema>) -> Self {
        Self::with_options(store, schema, EngineOptions::default())
    }

    pub fn with_options(store: S, schema: Arc<FormSchema>, options: EngineOptions) -> Self {
        Self {
            effects: PostEffectEngine::new(schema.clone()),
            history: UndoStack::with_max_levels(options.history_levels),
            store,
            schema,
            options,
            path: None,
            mode: Mode::Viewing,
            load_state: LoadState::Loading,
            record: Record::new(),
            baseline: Record::new(),
            is_new: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Last loaded or saved record
    pub fn baseline(&self) -> &Record {
        &self.baseline
    }

    pub fn is_dirty(&self) -> bool {
        self.record != self.baseline
    }

    /// True when the loaded document did not exist and the record came from
    /// the schema template; cleared by the first successful save
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn path(&self) -> Option<&DocumentPath> {
        self.path.as_ref()
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Node> {
        self.record.get(path)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Fetch the document at `path`; a missing document starts from the
    /// schema's default template.
    ///
    /// On failure the current record is left untouched and `load` may be
    /// called again.
    #[instrument(skip_all, fields(path = %path))]
    pub async fn load(&mut self, path: DocumentPath) -> Result<(), EditorError> {
        if self.mode != Mode::Viewing {
            return Err(EditorError::transition("load", self.mode));
        }
        self.load_state = LoadState::Loading;

        let fetched = match self.store.get(&path).await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.load_state = LoadState::LoadFailed;
                warn!(error = %err, "Load failed");
                return Err(err.into());
            }
        };

        let (record, is_new) = match fetched {
            Some(document) => match Record::from_document(&document) {
                Ok(record) => (record, false),
                Err(err) => {
                    self.load_state = LoadState::LoadFailed;
                    warn!(error = %err, "Stored document rejected");
                    return Err(err.into());
                }
            },
            None => (self.schema.default_record(), true),
        };

        info!(schema = %self.schema.name(), is_new, "Document loaded");
        self.baseline = record.clone();
        self.record = record;
        self.is_new = is_new;
        self.path = Some(path);
        self.load_state = LoadState::Loaded;
        self.history.clear();
        Ok(())
    }

    pub fn begin_edit(&mut self) -> Result<(), EditorError> {
        if self.load_state != LoadState::Loaded {
            return Err(EditorError::NotLoaded);
        }
        match self.mode {
            Mode::Viewing => {
                debug!("Editing started");
                self.mode = Mode::Editing;
                Ok(())
            }
            Mode::Editing => Ok(()),
            Mode::Saving => Err(EditorError::transition("begin editing", self.mode)),
        }
    }

    fn require_editing(&self, op: &'static str) -> Result<(), EditorError> {
        match self.mode {
            Mode::Editing => Ok(()),
            mode => Err(EditorError::transition(op, mode)),
        }
    }

    /// Apply one mutation and the derived-field cascade it triggers.
    ///
    /// Either everything applies or the record is left as it was.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationResult, EditorError> {
        self.require_editing("edit")?;
        self.validate(&mutation)?;

        let checkpoint = self.record.clone();
        match self.effects.apply_with_effects(&mutation, &mut self.record, &self.schema) {
            Ok(applied) => {
                debug!(
                    mutation = ?mutation,
                    changed = applied.primary.changed.len(),
                    derived = applied.secondary.len(),
                    "Mutation applied"
                );
                self.history.record(mutation, applied.inverses);
                Ok(applied.primary)
            }
            Err(err) => {
                self.record = checkpoint;
                Err(err)
            }
        }
    }

    fn validate(&self, mutation: &Mutation) -> Result<(), EditorError> {
        let Mutation::SetField { path, value } = mutation else {
            return Ok(());
        };
        let Some(descriptor) = self.schema.descriptor_for(path) else {
            return Ok(());
        };

        if let Some(rule) = &descriptor.derivation {
            if self.inputs_present(descriptor, rule, path) {
                return Err(EditorError::DerivedField(path.clone()));
            }
        }

        if self.options.strict {
            if !descriptor.kind.accepts(value) {
                return Err(EditorError::KindMismatch {
                    path: path.clone(),
                    expected: descriptor.kind,
                });
            }
            if !descriptor.allows(value) {
                return Err(EditorError::ValueNotAllowed { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Whether any input feeding the derived field at `path` holds a value
    fn inputs_present(&self, descriptor: &FieldDescriptor, rule: &Derivation, path: &FieldPath) -> bool {
        let Ok(canonical) = self.record.canonicalize(path) else {
            return false;
        };
        let Some(bindings) = descriptor.pattern.matches(&canonical) else {
            return false;
        };
        rule.inputs.iter().any(|input| {
            self.record
                .expand(&input.bind(&bindings))
                .into_iter()
                .any(|(_, value)| value.is_some_and(|v| !v.is_blank()))
        })
    }

    pub fn set_field(&mut self, path: &FieldPath, value: impl Into<Scalar>) -> Result<(), EditorError> {
        self.apply(Mutation::SetField {
            path: path.clone(),
            value: value.into(),
        })
        .map(|_| ())
    }

    pub fn clear_field(&mut self, path: &FieldPath) -> Result<(), EditorError> {
        self.apply(Mutation::ClearField { path: path.clone() }).map(|_| ())
    }

    /// Append a row and return its id. An empty `template` uses the
    /// schema's row template for the list.
    pub fn add_row(&mut self, list: &FieldPath, template: Document) -> Result<RowId, EditorError> {
        let result = self.apply(Mutation::AddRow {
            list: list.clone(),
            template,
        })?;
        result.row.ok_or_else(|| {
            PathError::NotAList {
                path: list.to_string(),
                at: list.to_string(),
            }
            .into()
        })
    }

    /// Remove the row with `id`; returns whether a row was removed
    pub fn remove_row(&mut self, list: &FieldPath, id: RowId) -> Result<bool, EditorError> {
        let result = self.apply(Mutation::RemoveRow { list: list.clone(), id })?;
        Ok(!result.is_noop())
    }

    /// Group the following mutations into one undo step
    pub fn begin_batch(&mut self, description: Option<&str>) {
        self.history.begin_batch();
        if let Some(description) = description {
            self.history.set_batch_description(description);
        }
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Revert the most recent undo step; false when there is none
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.require_editing("undo")?;
        let Self {
            history,
            effects,
            record,
            schema,
            ..
        } = self;

        let checkpoint = record.clone();
        let result = history.undo(|inverses| -> Result<(), EditorError> {
            let mut changed = Vec::new();
            for inverse in inverses {
                changed.extend(inverse.apply(record, schema)?.changed);
            }
            effects.settle(changed, record, schema)?;
            Ok(())
        });
        if result.is_err() {
            *record = checkpoint;
        }
        result
    }

    /// Reapply the most recently undone step; false when there is none
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.require_editing("redo")?;
        let Self {
            history,
            effects,
            record,
            schema,
            ..
        } = self;

        let checkpoint = record.clone();
        let result = history.redo(|mutations| -> Result<Vec<Mutation>, EditorError> {
            let mut inverses: Vec<Mutation> = Vec::new();
            for mutation in mutations {
                let mut applied = effects.apply_with_effects(mutation, record, schema)?.inverses;
                applied.append(&mut inverses);
                inverses = applied;
            }
            Ok(inverses)
        });
        if result.is_err() {
            *record = checkpoint;
        }
        result
    }

    /// Persist the edits as a merge-patch of the changed top-level keys
    /// (the whole record for a new document).
    #[instrument(skip_all)]
    pub async fn save(&mut self) -> Result<Ack, EditorError> {
        match self.mode {
            Mode::Editing => {}
            Mode::Saving => return Err(EditorError::SaveInProgress),
            mode => return Err(EditorError::transition("save", mode)),
        }
        let path = self.path.clone().ok_or(EditorError::NotLoaded)?;

        self.history.end_batch();
        let patch = if self.is_new {
            self.record.to_document()
        } else {
            self.record.patch_since(&self.baseline)
        };

        self.mode = Mode::Saving;
        debug!(path = %path, keys = patch.len(), "Saving document");
        match self.store.put(&path, patch, true).await {
            Ok(ack) => {
                self.record.drop_null_fields();
                self.baseline = self.record.clone();
                self.is_new = false;
                self.mode = Mode::Viewing;
                self.history.clear();
                info!(path = %path, revision = ack.revision, "Document saved");
                Ok(ack)
            }
            Err(err) => {
                self.mode = Mode::Editing;
                warn!(path = %path, error = %err, "Save failed");
                Err(err.into())
            }
        }
    }

    /// Drop every edit since the last load or save
    pub fn cancel_edit(&mut self) -> Result<(), EditorError> {
        match self.mode {
            Mode::Editing => {
                self.record = self.baseline.clone();
                self.mode = Mode::Viewing;
                self.history.clear();
                debug!("Edits discarded");
                Ok(())
            }
            Mode::Viewing => Ok(()),
            Mode::Saving => Err(EditorError::transition("cancel", self.mode)),
        }
    }

    /// Flatten the current record for an exporter; read-only
    pub fn export_snapshot(&self, format: ExportFormat) -> Result<Snapshot, EditorError> {
        if self.load_state != LoadState::Loaded {
            return Err(EditorError::NotLoaded);
        }
        let schema = &self.schema;
        let table = self.record.flatten(&schema.columns());
        Ok(Snapshot::new(format, schema.title(), table)
            .with_labels(|column| schema.column_label(column).map(str::to_string)))
    }
}
