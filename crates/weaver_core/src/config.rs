//! Weaver configuration.
//!
//! Config file: `~/.config/weaver/config.toml`, overridable with
//! `$WEAVER_CONFIG` or an explicit path. A missing file is not an error -
//! every section has defaults.

use crate::llm::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// History store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Database path; default is `$XDG_DATA_HOME/weaver/history.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaverConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

impl WeaverConfig {
    /// Load configuration. Lookup order: explicit path (must parse),
    /// `$WEAVER_CONFIG`, the default location, built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        if let Ok(env_path) = std::env::var("WEAVER_CONFIG") {
            return Self::load_file(Path::new(&env_path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse one specific config file. Unlike the probing path, a named file
    /// that is missing or malformed is an error the caller sees.
    pub fn load_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weaver").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = WeaverConfig::default();
        assert_eq!(config.llm.endpoint, "http://127.0.0.1:11434");
        assert!(config.history.db_path.is_none());
    }

    #[test]
    fn test_load_file_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[llm]
model = "mistral:7b"

[history]
db_path = "/tmp/weaver-test.db"
"#,
        )
        .unwrap();

        let config = WeaverConfig::load_file(&path).unwrap();
        assert_eq!(config.llm.model, "mistral:7b");
        // Unspecified fields keep their defaults
        assert_eq!(config.llm.endpoint, "http://127.0.0.1:11434");
        assert_eq!(
            config.history.db_path,
            Some(PathBuf::from("/tmp/weaver-test.db"))
        );
    }

    #[test]
    fn test_load_file_missing_is_error() {
        assert!(WeaverConfig::load_file(Path::new("/nonexistent/weaver.toml")).is_err());
    }

    #[test]
    fn test_load_file_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm\nbroken").unwrap();
        assert!(WeaverConfig::load_file(&path).is_err());
    }
}
