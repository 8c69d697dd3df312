//! Transactions and nested savepoints.
//!
//! The outermost transaction uses `begin deferred`/`commit`/`rollback`.
//! Every transaction opened inside another one is a savepoint named
//! `sp<depth>`: released when its callback succeeds, rolled back to and
//! released when it fails. The callback's error always propagates to the
//! caller, even when the rollback itself fails.
//!
//! The outermost transaction runs on [`Session::acquire`], so statements
//! from other sessions sharing the store handle wait until it finishes.

use std::sync::Arc;

use trellis_core::{Result, Session, TrellisError, trellis_trace_tx, trellis_warn};
use trellis_sqlite::Schema;

/// A transaction scope handed to transaction callbacks.
#[derive(Debug)]
pub struct Transaction<S> {
    session: S,
    schema: Arc<Schema>,
    depth: u32,
}

impl<S: Session + Clone> Transaction<S> {
    query_methods_impl!();

    /// Nesting depth: 0 for the outermost transaction.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Aborts the current scope: return this from the callback to roll back
    /// without a store error.
    ///
    /// ```ignore
    /// db.transaction(async |tx| {
    ///     tx.insert("users").values(json!({"email": "a@x.com"})).execute().await?;
    ///     tx.rollback()
    /// }).await
    /// ```
    pub fn rollback<T>(&self) -> Result<T> {
        Err(TrellisError::Rollback)
    }

    /// Runs `f` inside a savepoint nested in this transaction.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: AsyncFnOnce(&Transaction<S>) -> Result<R>,
    {
        let depth = self.depth + 1;
        let name = format!("sp{depth}");
        let nested = Transaction {
            session: self.session.clone(),
            schema: self.schema.clone(),
            depth,
        };

        trellis_trace_tx!("savepoint", depth);
        self.session.exec_batch(&format!("savepoint {name}")).await?;

        match f(&nested).await {
            Ok(value) => {
                trellis_trace_tx!("release", depth);
                self.session.exec_batch(&format!("release {name}")).await?;
                Ok(value)
            }
            Err(e) => {
                trellis_trace_tx!("rollback", depth);
                if let Err(error) = self
                    .session
                    .exec_batch(&format!("rollback to {name}; release {name}"))
                    .await
                {
                    trellis_warn!(%error, depth, "savepoint rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Runs `f` in a top-level deferred transaction on an acquired session.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) async fn begin<F, R>(session: &S, schema: Arc<Schema>, f: F) -> Result<R>
    where
        F: AsyncFnOnce(&Transaction<S>) -> Result<R>,
    {
        let transaction = Transaction {
            session: session.acquire().await?,
            schema,
            depth: 0,
        };

        trellis_trace_tx!("begin", 0);
        transaction.session.exec_batch("begin deferred").await?;

        match f(&transaction).await {
            Ok(value) => {
                trellis_trace_tx!("commit", 0);
                transaction.session.exec_batch("commit").await?;
                Ok(value)
            }
            Err(e) => {
                trellis_trace_tx!("rollback", 0);
                if let Err(error) = transaction.session.exec_batch("rollback").await {
                    trellis_warn!(%error, "transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}
