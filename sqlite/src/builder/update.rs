//! Update builder.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use trellis_core::{Result, RunResult, Session};

use super::{Target, deserialize};
use crate::dialect::{self, Compiled};
use crate::schema::Schema;
use crate::statement::{IntoStatement, Returning, Sets, Where};

/// Builds an update. Keys absent from the sets are left untouched.
#[derive(Debug)]
pub struct UpdateQuery<'a, S: Session> {
    session: &'a S,
    target: Target,
    sets: Option<Sets>,
    filter: Option<Where>,
}

impl<'a, S: Session> UpdateQuery<'a, S> {
    pub fn new(session: &'a S, schema: Arc<Schema>, table: impl Into<String>) -> Self {
        Self {
            session,
            target: Target::new(schema, table),
            sets: None,
            filter: None,
        }
    }

    pub fn set(mut self, sets: impl IntoStatement<Sets>) -> Self {
        self.sets = self.target.accept(sets);
        self
    }

    /// Filters by bare logical column names.
    pub fn r#where(mut self, filter: impl IntoStatement<Where>) -> Self {
        self.filter = self.target.accept(filter);
        self
    }

    pub fn returning(mut self, returning: impl IntoStatement<Returning>) -> UpdateReturningQuery<'a, S> {
        let returning = self.target.accept(returning);
        UpdateReturningQuery {
            update: self,
            returning,
        }
    }

    pub fn build(&self) -> Result<Compiled> {
        self.compile(None)
    }

    fn compile(&self, returning: Option<&Returning>) -> Result<Compiled> {
        self.target.check()?;
        dialect::update::update(
            &self.target.schema,
            &self.target.table,
            self.sets.as_ref(),
            self.filter.as_ref(),
            returning,
        )
    }

    pub async fn execute(self) -> Result<RunResult> {
        let Compiled { sql, params, .. } = self.build()?;
        self.session.prepare(sql, params).run().await
    }
}

/// An update projecting the updated rows.
#[derive(Debug)]
pub struct UpdateReturningQuery<'a, S: Session> {
    update: UpdateQuery<'a, S>,
    returning: Option<Returning>,
}

impl<S: Session> UpdateReturningQuery<'_, S> {
    pub fn build(&self) -> Result<Compiled> {
        self.update
            .compile(Some(self.returning.as_ref().unwrap_or(&Returning::default())))
    }

    /// Resolves to the first updated row, or null when nothing matched.
    pub async fn execute(self) -> Result<JsonValue> {
        Ok(self.all().await?.into_iter().next().unwrap_or(JsonValue::Null))
    }

    /// Resolves to every updated row.
    pub async fn all(self) -> Result<Vec<JsonValue>> {
        let Compiled {
            sql,
            params,
            mapper,
        } = self.build()?;
        let rows = self.update.session.prepare(sql, params).all().await?;
        mapper.map_rows(rows)
    }

    pub async fn execute_as<T: DeserializeOwned>(self) -> Result<T> {
        deserialize(self.execute().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::Recorder;
    use crate::dialect::fixtures;
    use serde_json::json;
    use trellis_core::{Row, TrellisError};

    #[tokio::test]
    async fn returning_resolves_first_row_or_null() {
        let session = Recorder::with_rows(vec![Row::from_pairs([("name", "B")])]);
        let updated = UpdateQuery::new(&session, fixtures::schema(), "users")
            .set(json!({"name": "B"}))
            .r#where(json!({"id": {"==": 1}}))
            .returning(json!({"name": true}))
            .execute()
            .await
            .unwrap();
        assert_eq!(updated, json!({"name": "B"}));

        let empty = Recorder::default();
        let nothing = UpdateQuery::new(&empty, fixtures::schema(), "users")
            .set(json!({"name": "B"}))
            .returning(json!({"name": true}))
            .execute()
            .await
            .unwrap();
        assert_eq!(nothing, JsonValue::Null);
    }

    #[tokio::test]
    async fn execute_reports_changes() {
        let session = Recorder::default();
        let result = UpdateQuery::new(&session, fixtures::schema(), "roles")
            .set(json!({"name": "x"}))
            .execute()
            .await
            .unwrap();
        assert_eq!(result.changes, 0);
        assert_eq!(session.calls()[0].0, "update roles set name = ?");
    }

    #[tokio::test]
    async fn missing_sets_is_reported_without_io() {
        let session = Recorder::default();
        let result = UpdateQuery::new(&session, fixtures::schema(), "roles")
            .r#where(json!({"id": {"==": 1}}))
            .execute()
            .await;
        assert!(matches!(result, Err(TrellisError::MissingSets(_))));
        assert!(session.calls().is_empty());
    }
}
