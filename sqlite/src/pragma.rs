//! SQLite PRAGMA statements applied when a database is opened.
//!
//! [SQLite PRAGMA Documentation](https://sqlite.org/pragma.html)
//!
//! ```
//! use trellis_sqlite::pragma::{JournalMode, Pragma};
//!
//! assert_eq!(Pragma::foreign_keys(true).to_sql().sql(), "PRAGMA foreign_keys = ON");
//! assert_eq!(Pragma::journal_mode(JournalMode::Wal).to_sql().sql(), "PRAGMA journal_mode = WAL");
//! ```

use std::str::FromStr;

use serde::Deserialize;
use trellis_core::{SQL, TrellisError};

/// Journal modes for SQLite databases
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Delete journal file after each transaction
    Delete,
    /// Truncate journal file after each transaction
    Truncate,
    /// Keep journal file persistent
    Persist,
    /// Store journal in memory
    Memory,
    /// Write-Ahead Logging mode
    Wal,
    /// Disable journaling
    Off,
}

impl JournalMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

impl FromStr for JournalMode {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(JournalMode::Delete),
            "truncate" => Ok(JournalMode::Truncate),
            "persist" => Ok(JournalMode::Persist),
            "memory" => Ok(JournalMode::Memory),
            "wal" => Ok(JournalMode::Wal),
            "off" => Ok(JournalMode::Off),
            other => Err(TrellisError::Configuration(format!(
                "unknown journal mode \"{other}\""
            ))),
        }
    }
}

/// Configuration pragmas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pragma {
    /// Enforce foreign key constraints
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_foreign_keys)
    ForeignKeys(bool),

    /// Journal mode for the database connection
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
    JournalMode(JournalMode),

    /// Milliseconds to wait on a locked database before failing
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_busy_timeout)
    BusyTimeout(u32),
}

impl Pragma {
    pub const fn foreign_keys(enabled: bool) -> Self {
        Self::ForeignKeys(enabled)
    }

    pub const fn journal_mode(mode: JournalMode) -> Self {
        Self::JournalMode(mode)
    }

    pub const fn busy_timeout(millis: u32) -> Self {
        Self::BusyTimeout(millis)
    }

    pub fn to_sql(&self) -> SQL {
        match self {
            Pragma::ForeignKeys(enabled) => {
                SQL::raw("PRAGMA foreign_keys =").append_raw(if *enabled { "ON" } else { "OFF" })
            }
            Pragma::JournalMode(mode) => SQL::raw("PRAGMA journal_mode =").append_raw(mode.as_str()),
            Pragma::BusyTimeout(millis) => SQL::raw(format!("PRAGMA busy_timeout = {millis}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragmas_render() {
        assert_eq!(Pragma::foreign_keys(false).to_sql().sql(), "PRAGMA foreign_keys = OFF");
        assert_eq!(Pragma::busy_timeout(250).to_sql().sql(), "PRAGMA busy_timeout = 250");
        assert_eq!(
            Pragma::journal_mode("Wal".parse().unwrap()).to_sql().sql(),
            "PRAGMA journal_mode = WAL"
        );
    }

    #[test]
    fn unknown_journal_mode() {
        assert!("fast".parse::<JournalMode>().is_err());
    }
}
