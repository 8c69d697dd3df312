//! Lazily executed query builders.
//!
//! Builders only record configuration; nothing touches the session until
//! `execute` is awaited. Descriptor parsing errors are held back and
//! reported by `build`/`execute` before any SQL is sent.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use trellis_core::{Result, TrellisError};

use crate::schema::Schema;
use crate::statement::IntoStatement;

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use delete::{DeleteQuery, DeleteReturningQuery};
pub use insert::{InsertQuery, InsertReturningQuery};
pub use select::{Many, One, SelectMode, SelectQuery};
pub use update::{UpdateQuery, UpdateReturningQuery};

/// State shared by every builder: target table, schema and the first
/// configuration error.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub(crate) schema: Arc<Schema>,
    pub(crate) table: String,
    error: Option<String>,
}

impl Target {
    pub(crate) fn new(schema: Arc<Schema>, table: impl Into<String>) -> Self {
        Self {
            schema,
            table: table.into(),
            error: None,
        }
    }

    /// Converts a descriptor, keeping the first failure for `check`.
    pub(crate) fn accept<T>(&mut self, statement: impl IntoStatement<T>) -> Option<T> {
        match statement.into_statement() {
            Ok(statement) => Some(statement),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(match e {
                        TrellisError::InvalidStatement(message) => message,
                        other => other.to_string(),
                    });
                }
                None
            }
        }
    }

    pub(crate) fn check(&self) -> Result<()> {
        match &self.error {
            Some(message) => Err(TrellisError::InvalidStatement(message.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) fn deserialize<T: DeserializeOwned>(value: JsonValue) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TrellisError::Mapping(e.to_string()))
}
