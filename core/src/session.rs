//! The store boundary: raw SQL in, rows and change metadata out.

use std::future::Future;

use crate::error::Result;
use crate::row::Row;
use crate::value::SQLiteValue;

/// Change metadata returned by [`Session::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Rows modified by the statement
    pub changes: u64,
    /// Rowid of the most recent successful insert on the connection
    pub last_insert_id: i64,
}

/// Executes SQL with positional parameters against a single store handle.
///
/// Only these calls perform I/O. Implementations own the store handle and
/// serialize access to it; no pooling happens at this layer.
pub trait Session: Send + Sync {
    /// Runs a statement for its side effects.
    fn run(
        &self,
        sql: &str,
        params: &[SQLiteValue],
    ) -> impl Future<Output = Result<RunResult>> + Send;

    /// Runs a query and returns the first row, if any.
    fn get(
        &self,
        sql: &str,
        params: &[SQLiteValue],
    ) -> impl Future<Output = Result<Option<Row>>> + Send;

    /// Runs a query and returns every row in store order.
    fn all(&self, sql: &str, params: &[SQLiteValue])
    -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Runs one or more parameterless statements separated by `;`.
    fn exec_batch(&self, sql: &str) -> impl Future<Output = Result<()>> + Send;

    /// A session with exclusive use of the store handle, taken for the
    /// lifetime of one transaction. Other sessions sharing the handle wait
    /// until every clone of the returned session is dropped.
    ///
    /// The default shares the handle unchanged.
    fn acquire(&self) -> impl Future<Output = Result<Self>> + Send
    where
        Self: Clone + Sized,
    {
        let session = self.clone();
        async move { Ok(session) }
    }

    /// Bundles a fixed SQL text and parameter list into a reusable handle.
    fn prepare(&self, sql: impl Into<String>, params: Vec<SQLiteValue>) -> Prepared<'_, Self>
    where
        Self: Sized,
    {
        Prepared {
            session: self,
            sql: sql.into(),
            params,
        }
    }
}

/// A SQL text and parameter pair bound to a session.
#[derive(Debug)]
pub struct Prepared<'s, S: Session> {
    session: &'s S,
    sql: String,
    params: Vec<SQLiteValue>,
}

impl<'s, S: Session> Prepared<'s, S> {
    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[inline]
    pub fn params(&self) -> &[SQLiteValue] {
        &self.params
    }

    pub async fn run(&self) -> Result<RunResult> {
        self.session.run(&self.sql, &self.params).await
    }

    pub async fn get(&self) -> Result<Option<Row>> {
        self.session.get(&self.sql, &self.params).await
    }

    pub async fn all(&self) -> Result<Vec<Row>> {
        self.session.all(&self.sql, &self.params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and answers with a canned row.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<SQLiteValue>)>>,
    }

    impl Recorder {
        fn record(&self, sql: &str, params: &[SQLiteValue]) {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
        }
    }

    impl Session for Recorder {
        async fn run(&self, sql: &str, params: &[SQLiteValue]) -> Result<RunResult> {
            self.record(sql, params);
            Ok(RunResult {
                changes: 1,
                last_insert_id: 7,
            })
        }

        async fn get(&self, sql: &str, params: &[SQLiteValue]) -> Result<Option<Row>> {
            self.record(sql, params);
            Ok(Some(Row::from_pairs([("id", 7)])))
        }

        async fn all(&self, sql: &str, params: &[SQLiteValue]) -> Result<Vec<Row>> {
            self.record(sql, params);
            Ok(vec![Row::from_pairs([("id", 7)])])
        }

        async fn exec_batch(&self, sql: &str) -> Result<()> {
            self.record(sql, &[]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn prepared_reuses_sql_and_params() {
        let session = Recorder::default();
        let prepared = session.prepare("select id from t where id = ?", vec![7.into()]);

        assert_eq!(prepared.run().await.unwrap().last_insert_id, 7);
        assert_eq!(
            prepared.get().await.unwrap().unwrap().get("id"),
            Some(&SQLiteValue::Integer(7))
        );
        assert_eq!(prepared.all().await.unwrap().len(), 1);

        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(
            calls
                .iter()
                .all(|(sql, params)| sql == "select id from t where id = ?"
                    && params == &[SQLiteValue::Integer(7)])
        );
    }
}
