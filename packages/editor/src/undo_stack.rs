//! # Undo/Redo Stack
//!
//! Tracks mutation history for one edit session.
//!
//! ## Design
//!
//! - The engine applies a mutation and hands the stack the mutation plus
//!   the inverses of everything it caused (derived writes included)
//! - Undo replays the inverses and moves the batch to the redo stack
//! - Redo replays the original mutations and refreshes the inverses
//! - New mutations clear the redo stack
//! - Batches group several mutations into one undo step

use crate::Mutation;

/// A group of mutations that should be undone/redone together
#[derive(Debug, Clone, PartialEq)]
pub struct MutationBatch {
    /// The mutations in this batch (in application order)
    pub mutations: Vec<Mutation>,

    /// The inverse mutations (in undo order)
    pub inverses: Vec<Mutation>,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl MutationBatch {
    fn empty() -> Self {
        Self {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description: None,
        }
    }

    /// Create a single-mutation batch
    pub fn single(mutation: Mutation, inverses: Vec<Mutation>) -> Self {
        Self {
            mutations: vec![mutation],
            inverses,
            description: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fold the next mutation in; its inverses run before the earlier ones
    fn push(&mut self, mutation: Mutation, inverses: Vec<Mutation>) {
        self.mutations.push(mutation);
        self.inverses.splice(0..0, inverses);
    }
}

/// Undo/redo stack for record editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stack of applied mutations (most recent last)
    undo_stack: Vec<MutationBatch>,

    /// Stack of undone mutations (most recent last)
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building a batch
    current_batch: Option<MutationBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record an applied mutation with its inverses (in undo order)
    pub fn record(&mut self, mutation: Mutation, inverses: Vec<Mutation>) {
        if inverses.is_empty() {
            return;
        }
        match &mut self.current_batch {
            Some(batch) => batch.push(mutation, inverses),
            None => self.push_batch(MutationBatch::single(mutation, inverses)),
        }
    }

    /// Start a batch of mutations (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        self.end_batch();
        self.current_batch = Some(MutationBatch::empty());
    }

    /// End the current batch and push to undo stack
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    pub fn in_batch(&self) -> bool {
        self.current_batch.is_some()
    }

    /// Set description for current batch (if batching)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    /// Push a batch to the undo stack
    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // Clear redo stack (new action invalidates future)
        self.redo_stack.clear();
    }

    /// Undo the most recent batch by running `apply` over its inverses.
    ///
    /// An open batch is closed first. If `apply` fails the batch stays on
    /// the undo stack.
    pub fn undo<E, F>(&mut self, apply: F) -> Result<bool, E>
    where
        F: FnOnce(&[Mutation]) -> Result<(), E>,
    {
        self.end_batch();
        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = apply(&batch.inverses) {
            self.undo_stack.push(batch);
            return Err(err);
        }
        self.redo_stack.push(batch);
        Ok(true)
    }

    /// Redo the most recently undone batch. `apply` reapplies the mutations
    /// and returns their fresh inverses (in undo order).
    pub fn redo<E, F>(&mut self, apply: F) -> Result<bool, E>
    where
        F: FnOnce(&[Mutation]) -> Result<Vec<Mutation>, E>,
    {
        let Some(mut batch) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match apply(&batch.mutations) {
            Ok(inverses) => {
                batch.inverses = inverses;
                self.undo_stack.push(batch);
                Ok(true)
            }
            Err(err) => {
                self.redo_stack.push(batch);
                Err(err)
            }
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.current_batch.as_ref().is_some_and(|b| !b.mutations.is_empty())
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
