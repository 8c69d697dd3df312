//! Connection configuration.
//!
//! ```
//! use trellis::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     foreign_keys = false
//!     journal_mode = "wal"
//! "#).unwrap();
//! assert!(config.path.is_none());
//! assert!(!config.foreign_keys);
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use trellis_core::{Result, TrellisError};
use trellis_sqlite::pragma::{JournalMode, Pragma};

/// How a database is opened. Applied as PRAGMA statements on open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database file; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    pub foreign_keys: bool,
    pub busy_timeout_ms: Option<u32>,
    pub journal_mode: Option<JournalMode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            foreign_keys: true,
            busy_timeout_ms: None,
            journal_mode: None,
        }
    }
}

impl Config {
    /// An in-memory database with default pragmas.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A file-backed database with default pragmas.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| TrellisError::Configuration(e.to_string()))
    }

    /// Pragmas to apply on open, in order.
    pub fn pragmas(&self) -> Vec<Pragma> {
        let mut pragmas = vec![Pragma::foreign_keys(self.foreign_keys)];
        if let Some(millis) = self.busy_timeout_ms {
            pragmas.push(Pragma::busy_timeout(millis));
        }
        if let Some(mode) = self.journal_mode {
            pragmas.push(Pragma::journal_mode(mode));
        }
        pragmas
    }
}
