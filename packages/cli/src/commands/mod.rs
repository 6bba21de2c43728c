pub mod edit;
pub mod export;
pub mod forms;
pub mod init;
pub mod show;

pub use edit::{add_row, remove_row, set, AddRowArgs, RemoveRowArgs, SetArgs};
pub use export::{export, ExportArgs};
pub use forms::forms;
pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};

use crate::config::Config;
use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use folio_editor::{EngineOptions, FormEngine, FormSchema};
use folio_forms::FormRegistry;
use folio_store::{DocumentPath, FileStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Document addressed by form name and document name
#[derive(Debug, Args)]
pub struct DocumentArgs {
    /// Form name (see `folio forms`)
    pub form: String,

    /// Document name within the form
    pub doc: String,
}

/// Everything a command needs: resolved config, known forms, a store
pub struct Context {
    cwd: PathBuf,
    config: Config,
    forms: FormRegistry,
}

impl Context {
    pub fn new(cwd: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let forms = FormRegistry::builtin().context("Built-in forms are invalid")?;
        Ok(Self {
            cwd: cwd.into(),
            config,
            forms,
        })
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn forms(&self) -> &FormRegistry {
        &self.forms
    }

    pub fn schema(&self, form: &str) -> Result<Arc<FormSchema>> {
        self.forms.get(form).ok_or_else(|| {
            let known: Vec<&str> = self.forms.names().collect();
            anyhow!("Unknown form `{}`. Known forms: {}", form, known.join(", "))
        })
    }

    pub fn document_path(&self, doc: &DocumentArgs) -> Result<DocumentPath> {
        DocumentPath::scoped(&self.config.identity, &format!("{}/{}", doc.form, doc.doc))
            .with_context(|| format!("Invalid document name `{}/{}`", doc.form, doc.doc))
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(self.config.get_store_dir(&self.cwd))
    }

    fn engine_options(&self) -> EngineOptions {
        self.config.engine_options()
    }

    /// Engine with `doc` loaded, still in view mode
    pub async fn open(&self, doc: &DocumentArgs) -> Result<FormEngine<FileStore>> {
        let schema = self.schema(&doc.form)?;
        let path = self.document_path(doc)?;
        let mut engine = FormEngine::with_options(self.store(), schema, self.engine_options());
        engine
            .load(path.clone())
            .await
            .with_context(|| format!("Failed to load {}", path))?;
        Ok(engine)
    }
}

/// Split `field=value` arguments
pub fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => Err(anyhow!("Expected `field=value`, got `{}`", raw)),
    }
}
