use folio_editor::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root directory of the JSON-file document store
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Caller identity documents are scoped under (`users/<identity>/...`)
    #[serde(default = "default_identity")]
    pub identity: String,

    /// Validate kinds and allowed values on every edit
    #[serde(default)]
    pub strict: bool,

    /// Undo depth kept while editing
    #[serde(default = "default_history_levels")]
    pub history_levels: usize,

    /// Where `export` writes files when no `--out` is given
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_store_dir() -> String {
    ".folio".to_string()
}

fn default_identity() -> String {
    "local".to_string()
}

fn default_history_levels() -> usize {
    100
}

fn default_export_dir() -> String {
    "exports".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn get_store_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.store_dir)
    }

    pub fn get_export_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.export_dir)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict: self.strict,
            history_levels: self.history_levels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            identity: default_identity(),
            strict: false,
            history_levels: default_history_levels(),
            export_dir: default_export_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "storeDir": "data",
            "identity": "u1",
            "strict": true,
            "historyLevels": 20
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store_dir, "data");
        assert_eq!(config.identity, "u1");
        assert!(config.strict);
        assert_eq!(config.history_levels, 20);
        assert_eq!(config.export_dir, "exports");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_dir, ".folio");
        assert_eq!(config.identity, "local");
        assert_eq!(config.engine_options(), EngineOptions::default());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());

        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "exportDir": "out" }"#).unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.export_dir, "out");
        assert_eq!(config.get_store_dir(dir.path()), dir.path().join(".folio"));
    }
}
