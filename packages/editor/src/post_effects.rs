//! # Post-Effect System
//!
//! Mutations trigger cascading effects to keep the record consistent. The
//! built-in effect recomputes derived fields: after `items[#1].qty` changes,
//! `items[#1].amount` is rewritten, which in turn rewrites `subtotal`.
//!
//! Effects run in passes. Each pass sees the paths changed by the previous
//! one and returns secondary mutations; the cascade stops when a pass
//! changes nothing. Effects only emit writes whose value actually differs,
//! so an acyclic schema always settles.

use crate::errors::EditorError;
use crate::mutations::{Mutation, MutationResult};
use folio_record::{FieldPath, FormSchema, Record, Scalar};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on cascade passes, reached only by cyclic derivations
const MAX_PASSES: usize = 32;

/// Post-effect that can be triggered by a change
pub trait PostEffect: std::fmt::Debug + Send + Sync {
    /// Secondary mutations needed after `changed` paths were written
    fn analyze(&self, changed: &[FieldPath], record: &Record) -> Vec<Mutation>;
}

/// Rewrite derived fields whose inputs changed, in declaration order
#[derive(Debug)]
pub struct RecomputeDerivedFields {
    schema: Arc<FormSchema>,
}

impl RecomputeDerivedFields {
    pub fn new(schema: Arc<FormSchema>) -> Self {
        Self { schema }
    }
}

impl PostEffect for RecomputeDerivedFields {
    fn analyze(&self, changed: &[FieldPath], record: &Record) -> Vec<Mutation> {
        let mut writes = Vec::new();
        for (descriptor, rule) in self.schema.derivations() {
            let triggered = rule
                .inputs
                .iter()
                .any(|input| changed.iter().any(|path| input.is_touched_by(path)));
            if !triggered {
                continue;
            }

            for (output, current) in record.expand(&descriptor.pattern) {
                let Some(bindings) = descriptor.pattern.matches(&output) else {
                    continue;
                };
                let values: Vec<Vec<Scalar>> = rule
                    .inputs
                    .iter()
                    .map(|input| {
                        record
                            .expand(&input.bind(&bindings))
                            .into_iter()
                            .map(|(_, value)| value.cloned().unwrap_or_default())
                            .collect()
                    })
                    .collect();
                let value = rule.compute(&values);
                if current != Some(&value) {
                    debug!(field = %output, rule = rule.name, value = %value, "Derived field recomputed");
                    writes.push(Mutation::SetField { path: output, value });
                }
            }
        }
        writes
    }
}

/// Every mutation applied for one primary mutation
#[derive(Debug, Clone)]
pub struct Applied {
    pub primary: MutationResult,
    pub secondary: Vec<Mutation>,
    /// Inverses in undo order (most recent first)
    pub inverses: Vec<Mutation>,
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Engine with the derived-field effect for `schema`
    pub fn new(schema: Arc<FormSchema>) -> Self {
        let mut engine = Self::empty();
        engine.register(RecomputeDerivedFields::new(schema));
        engine
    }

    pub fn empty() -> Self {
        Self { effects: Vec::new() }
    }

    pub fn register(&mut self, effect: impl PostEffect + 'static) {
        self.effects.push(Box::new(effect));
    }

    /// Secondary mutations from every effect, in registration order
    pub fn analyze(&self, changed: &[FieldPath], record: &Record) -> Vec<Mutation> {
        self.effects
            .iter()
            .flat_map(|effect| effect.analyze(changed, record))
            .collect()
    }

    /// Run the cascade for paths changed outside a mutation (e.g. by undo)
    pub fn settle(
        &self,
        changed: Vec<FieldPath>,
        record: &mut Record,
        schema: &FormSchema,
    ) -> Result<(Vec<Mutation>, Vec<Mutation>), EditorError> {
        let mut applied = Vec::new();
        let mut inverses = Vec::new();
        let mut changed = changed;
        let mut passes = 0;

        while !changed.is_empty() {
            if passes == MAX_PASSES {
                warn!(passes, pending = changed.len(), "Derived fields did not settle");
                break;
            }
            let secondary = self.analyze(&changed, record);
            changed = Vec::new();
            for mutation in secondary {
                let result = mutation.apply(record, schema)?;
                inverses.extend(result.inverse);
                changed.extend(result.changed);
                applied.push(mutation);
            }
            passes += 1;
        }

        Ok((applied, inverses))
    }

    /// Apply a mutation with all its post-effects
    pub fn apply_with_effects(
        &self,
        mutation: &Mutation,
        record: &mut Record,
        schema: &FormSchema,
    ) -> Result<Applied, EditorError> {
        let primary = mutation.apply(record, schema)?;
        let (secondary, secondary_inverses) = self.settle(primary.changed.clone(), record, schema)?;

        let mut inverses: Vec<Mutation> = primary.inverse.iter().cloned().collect();
        inverses.extend(secondary_inverses);
        inverses.reverse();

        Ok(Applied {
            primary,
            secondary,
            inverses,
        })
    }
}
