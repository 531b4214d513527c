//! Store configuration
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! path = "data/app.db"
//! journal_mode = "delete"
//! busy_timeout_ms = 250
//! ```

use crate::errors::{config_error, io_error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path that opens a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    pub fn pragma_value(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Create missing parent directories of `path`
    #[serde(default = "default_true")]
    pub create_dirs: bool,
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl StoreConfig {
    /// Defaults for a database file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_dirs: true,
            journal_mode: JournalMode::default(),
            foreign_keys: true,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            journal_mode: JournalMode::Memory,
            ..Self::new(MEMORY_PATH)
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(MEMORY_PATH)
    }

    /// # Errors
    ///
    /// `InvalidInput` when the text is not valid TOML for this struct.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| config_error(format!("invalid store config: {}", e)))
    }

    /// # Errors
    ///
    /// `Io` when the file cannot be read, `InvalidInput` when it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| io_error("read_config", e))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlrepo_core::errors::RepoErrorKind;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let cfg = StoreConfig::from_toml_str("path = \"data/app.db\"").unwrap();
        assert_eq!(cfg, StoreConfig::new("data/app.db"));
        assert_eq!(cfg.journal_mode, JournalMode::Wal);
        assert_eq!(cfg.busy_timeout_ms, 5000);
        assert!(cfg.create_dirs);
    }

    #[test]
    fn test_explicit_values() {
        let cfg = StoreConfig::from_toml_str(
            "path = \"x.db\"\njournal_mode = \"delete\"\nforeign_keys = false\nbusy_timeout_ms = 250\n",
        )
        .unwrap();
        assert_eq!(cfg.journal_mode, JournalMode::Delete);
        assert!(!cfg.foreign_keys);
        assert_eq!(cfg.busy_timeout_ms, 250);
    }

    #[test]
    fn test_bad_journal_mode_is_invalid_input() {
        let err = StoreConfig::from_toml_str("path = \"x.db\"\njournal_mode = \"truncate\"")
            .unwrap_err();
        assert_eq!(err.kind(), RepoErrorKind::InvalidInput);
    }

    #[test]
    fn test_in_memory() {
        assert!(StoreConfig::in_memory().is_in_memory());
        assert!(!StoreConfig::new("a.db").is_in_memory());
    }
}
