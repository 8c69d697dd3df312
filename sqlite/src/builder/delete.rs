//! Delete builder.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use trellis_core::{Result, RunResult, Session};

use super::{Target, deserialize};
use crate::dialect::{self, Compiled};
use crate::schema::Schema;
use crate::statement::{IntoStatement, Returning, Where};

/// Builds a delete.
#[derive(Debug)]
pub struct DeleteQuery<'a, S: Session> {
    session: &'a S,
    target: Target,
    filter: Option<Where>,
}

impl<'a, S: Session> DeleteQuery<'a, S> {
    pub fn new(session: &'a S, schema: Arc<Schema>, table: impl Into<String>) -> Self {
        Self {
            session,
            target: Target::new(schema, table),
            filter: None,
        }
    }

    /// Filters by bare logical column names.
    pub fn r#where(mut self, filter: impl IntoStatement<Where>) -> Self {
        self.filter = self.target.accept(filter);
        self
    }

    pub fn returning(mut self, returning: impl IntoStatement<Returning>) -> DeleteReturningQuery<'a, S> {
        let returning = self.target.accept(returning);
        DeleteReturningQuery {
            delete: self,
            returning,
        }
    }

    pub fn build(&self) -> Result<Compiled> {
        self.compile(None)
    }

    fn compile(&self, returning: Option<&Returning>) -> Result<Compiled> {
        self.target.check()?;
        dialect::delete::delete(
            &self.target.schema,
            &self.target.table,
            self.filter.as_ref(),
            returning,
        )
    }

    pub async fn execute(self) -> Result<RunResult> {
        let Compiled { sql, params, .. } = self.build()?;
        self.session.prepare(sql, params).run().await
    }
}

/// A delete projecting the removed rows.
#[derive(Debug)]
pub struct DeleteReturningQuery<'a, S: Session> {
    delete: DeleteQuery<'a, S>,
    returning: Option<Returning>,
}

impl<S: Session> DeleteReturningQuery<'_, S> {
    pub fn build(&self) -> Result<Compiled> {
        self.delete
            .compile(Some(self.returning.as_ref().unwrap_or(&Returning::default())))
    }

    /// Resolves to the first removed row, or null when nothing matched.
    pub async fn execute(self) -> Result<JsonValue> {
        Ok(self.all().await?.into_iter().next().unwrap_or(JsonValue::Null))
    }

    /// Resolves to every removed row.
    pub async fn all(self) -> Result<Vec<JsonValue>> {
        let Compiled {
            sql,
            params,
            mapper,
        } = self.build()?;
        let rows = self.delete.session.prepare(sql, params).all().await?;
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
    use trellis_core::Row;

    #[tokio::test]
    async fn all_returns_every_removed_row() {
        let session = Recorder::with_rows(vec![
            Row::from_pairs([("id", 1)]),
            Row::from_pairs([("id", 2)]),
        ]);
        let removed = DeleteQuery::new(&session, fixtures::schema(), "comments")
            .r#where(json!({"postId": {"==": 9}}))
            .returning(json!({"id": true}))
            .all()
            .await
            .unwrap();

        assert_eq!(removed, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(
            session.calls()[0].0,
            "delete from comments where post_id = ? returning id as \"id\""
        );
    }
}
