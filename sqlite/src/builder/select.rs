//! Select builder.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use trellis_core::{Result, Session};

use super::{Target, deserialize};
use crate::dialect::{self, Compiled, SelectState};
use crate::schema::Schema;
use crate::statement::{GroupBy, Include, IntoStatement, Join, Map, OrderBy, Where};

mod private {
    pub trait Sealed {}
}

/// Result cardinality of a select, fixed at construction.
pub trait SelectMode: private::Sealed {}

/// First row or nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct One;

/// Every row, in store order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Many;

impl private::Sealed for One {}
impl private::Sealed for Many {}
impl SelectMode for One {}
impl SelectMode for Many {}

/// Builds a select over one table.
///
/// Configuration calls may come in any order; each replaces the previous
/// value of its clause, except [`SelectQuery::join`] which accumulates.
#[derive(Debug)]
pub struct SelectQuery<'a, S: Session, M: SelectMode> {
    session: &'a S,
    target: Target,
    state: SelectState,
    _mode: PhantomData<M>,
}

impl<'a, S: Session, M: SelectMode> SelectQuery<'a, S, M> {
    pub fn new(session: &'a S, schema: Arc<Schema>, table: impl Into<String>) -> Self {
        Self {
            session,
            target: Target::new(schema, table),
            state: SelectState::default(),
            _mode: PhantomData,
        }
    }

    /// Joins another table; its columns become `<alias>.<column>` fields.
    pub fn join(mut self, join: Join) -> Self {
        self.state.joins.push(join);
        self
    }

    /// Replaces the output shape.
    pub fn map(mut self, map: impl IntoStatement<Map>) -> Self {
        self.state.map = self.target.accept(map);
        self
    }

    /// Embeds related rows under their relation names.
    pub fn include(mut self, include: impl IntoStatement<Include>) -> Self {
        self.state.include = self.target.accept(include);
        self
    }

    pub fn r#where(mut self, filter: impl IntoStatement<Where>) -> Self {
        self.state.r#where = self.target.accept(filter);
        self
    }

    pub fn group_by(mut self, group_by: impl IntoStatement<GroupBy>) -> Self {
        self.state.group_by = self.target.accept(group_by);
        self
    }

    pub fn having(mut self, filter: impl IntoStatement<Where>) -> Self {
        self.state.having = self.target.accept(filter);
        self
    }

    pub fn order_by(mut self, order_by: impl IntoStatement<OrderBy>) -> Self {
        self.state.order_by = self.target.accept(order_by);
        self
    }

    /// Negative values leave the clause out.
    pub fn limit(mut self, limit: i64) -> Self {
        self.state.limit = Some(limit);
        self
    }

    /// Negative values leave the clause out.
    pub fn offset(mut self, offset: i64) -> Self {
        self.state.offset = Some(offset);
        self
    }

    /// Compiles without executing.
    pub fn build(&self) -> Result<Compiled> {
        self.target.check()?;
        dialect::select::select(&self.target.schema, &self.target.table, &self.state)
    }
}

impl<S: Session> SelectQuery<'_, S, One> {
    /// Runs the query and shapes the first row, if any.
    pub async fn execute(self) -> Result<Option<JsonValue>> {
        let Compiled {
            sql,
            params,
            mapper,
        } = self.build()?;
        let row = self.session.prepare(sql, params).get().await?;
        row.map(|row| mapper.map_row(row)).transpose()
    }

    pub async fn execute_as<T: DeserializeOwned>(self) -> Result<Option<T>> {
        self.execute().await?.map(deserialize).transpose()
    }
}

impl<S: Session> SelectQuery<'_, S, Many> {
    /// Runs the query and shapes every row.
    pub async fn execute(self) -> Result<Vec<JsonValue>> {
        let Compiled {
            sql,
            params,
            mapper,
        } = self.build()?;
        let rows = self.session.prepare(sql, params).all().await?;
        mapper.map_rows(rows)
    }

    pub async fn execute_as<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.execute()
            .await?
            .into_iter()
            .map(deserialize)
            .collect()
    }
}
