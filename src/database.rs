//! The database facade: a session paired with a frozen schema.

use std::sync::Arc;

use trellis_core::{Result, Session};
use trellis_sqlite::{Declaration, Schema};

use crate::transaction::Transaction;

/// Entry point for queries against one session and one schema.
///
/// Query builders borrow the database and do nothing until executed.
#[derive(Debug, Clone)]
pub struct Database<S> {
    session: S,
    schema: Arc<Schema>,
}

impl<S: Session> Database<S> {
    pub fn new(session: S, schema: Schema) -> Self {
        Self::with_schema(session, Arc::new(schema))
    }

    pub fn with_schema(session: S, schema: Arc<Schema>) -> Self {
        Self { session, schema }
    }

    query_methods_impl!();

    /// Creates every table of the schema that does not exist yet.
    pub async fn create(&self) -> Result<()> {
        for statement in self.schema.create_statements() {
            self.session.run(&statement, &[]).await?;
        }
        Ok(())
    }

    /// A database on the same session whose schema is this one overlaid with
    /// `declarations`. Declarations under existing keys replace the old ones.
    pub fn merge<K, D>(&self, declarations: impl IntoIterator<Item = (K, D)>) -> Result<Self>
    where
        S: Clone,
        K: Into<String>,
        D: Into<Declaration>,
    {
        let schema = self.schema.merge(
            declarations
                .into_iter()
                .map(|(key, declaration)| (key.into(), declaration.into())),
        )?;
        Ok(Self::new(self.session.clone(), schema))
    }

    /// Runs `f` in a transaction, committing on `Ok` and rolling back on
    /// `Err`. Transactions opened from inside `f` nest as savepoints.
    ///
    /// The transaction holds the session until it finishes: queries from
    /// other clones of this database wait, so `f` must go through the
    /// [`Transaction`] it is given. Dropping the returned future before it
    /// completes rolls the transaction back.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        S: Clone,
        F: AsyncFnOnce(&Transaction<S>) -> Result<R>,
    {
        Transaction::begin(&self.session, self.schema.clone(), f).await
    }
}
