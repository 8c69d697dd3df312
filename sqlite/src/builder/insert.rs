//! Insert builder.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use trellis_core::{Result, RunResult, Session};

use super::{Target, deserialize};
use crate::dialect::{self, Compiled};
use crate::schema::Schema;
use crate::statement::{IntoStatement, Returning, Values};

/// Builds an insert. Single-row or multi-row mode follows the shape passed
/// to [`InsertQuery::values`].
#[derive(Debug)]
pub struct InsertQuery<'a, S: Session> {
    session: &'a S,
    target: Target,
    values: Option<Values>,
}

impl<'a, S: Session> InsertQuery<'a, S> {
    pub fn new(session: &'a S, schema: Arc<Schema>, table: impl Into<String>) -> Self {
        Self {
            session,
            target: Target::new(schema, table),
            values: None,
        }
    }

    /// One object, or an array of objects sharing the same keys.
    pub fn values(mut self, values: impl IntoStatement<Values>) -> Self {
        self.values = self.target.accept(values);
        self
    }

    /// Projects the inserted rows, `{"id": true}` style.
    pub fn returning(mut self, returning: impl IntoStatement<Returning>) -> InsertReturningQuery<'a, S> {
        let returning = self.target.accept(returning);
        InsertReturningQuery {
            insert: self,
            returning,
        }
    }

    pub fn build(&self) -> Result<Compiled> {
        self.compile(None)
    }

    fn compile(&self, returning: Option<&Returning>) -> Result<Compiled> {
        self.target.check()?;
        dialect::insert::insert(
            &self.target.schema,
            &self.target.table,
            self.values.as_ref(),
            returning,
        )
    }

    pub async fn execute(self) -> Result<RunResult> {
        let Compiled { sql, params, .. } = self.build()?;
        self.session.prepare(sql, params).run().await
    }
}

/// An insert projecting the inserted rows.
#[derive(Debug)]
pub struct InsertReturningQuery<'a, S: Session> {
    insert: InsertQuery<'a, S>,
    returning: Option<Returning>,
}

impl<S: Session> InsertReturningQuery<'_, S> {
    pub fn build(&self) -> Result<Compiled> {
        self.insert
            .compile(Some(self.returning.as_ref().unwrap_or(&Returning::default())))
    }

    /// Resolves to an object for a single-row insert and to an array for a
    /// multi-row insert.
    pub async fn execute(self) -> Result<JsonValue> {
        let Compiled {
            sql,
            params,
            mapper,
        } = self.build()?;
        let many = self.insert.values.as_ref().is_some_and(Values::is_many);
        let rows = self.insert.session.prepare(sql, params).all().await?;
        let mut rows = mapper.map_rows(rows)?;

        if many {
            Ok(JsonValue::Array(rows))
        } else if rows.is_empty() {
            Ok(JsonValue::Null)
        } else {
            Ok(rows.swap_remove(0))
        }
    }

    pub async fn execute_as<T: DeserializeOwned>(self) -> Result<T> {
        deserialize(self.execute().await?)
    }
}
