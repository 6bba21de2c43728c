//! # Folio Forms
//!
//! The firm's form schemas: field kinds, derived fields, default
//! templates and export column order for each kind of document.
//!
//! ```rust,ignore
//! let forms = FormRegistry::builtin()?;
//! let boq = forms.get("boq").expect("known form");
//! let engine = FormEngine::new(store, boq);
//! ```

mod forms;

pub use forms::{bill_of_quantity, payment_application, progress_timeline, project_data, site_survey, transmittal};

use folio_record::{FormSchema, SchemaError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Form schemas by name
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    forms: BTreeMap<String, Arc<FormSchema>>,
}

impl FormRegistry {
    /// Registry holding every built-in form
    pub fn builtin() -> Result<Self, SchemaError> {
        let mut registry = Self::empty();
        for build in forms::ALL {
            registry.register(build()?);
        }
        debug!(forms = registry.len(), "Form registry ready");
        Ok(registry)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a schema, replacing any previous one with the same name
    pub fn register(&mut self, schema: FormSchema) {
        self.forms.insert(schema.name().to_string(), Arc::new(schema));
    }

    pub fn get(&self, name: &str) -> Option<Arc<FormSchema>> {
        self.forms.get(name).cloned()
    }

    /// Form names in alphabetical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormSchema> {
        self.forms.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
