//! [`Session`] over a rusqlite connection.
//!
//! The connection sits behind an async mutex; each call holds it for one
//! statement. Clones share the connection. [`Session::acquire`] takes the
//! connection for a whole transaction: the other clones wait until it is
//! released, and releasing it with the transaction still open rolls it back.

use std::ops::Deref;
use std::sync::Arc;

use ::rusqlite::{Connection, params_from_iter};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use trellis_core::{
    Result, Row, RunResult, SQLiteValue, Session, trellis_trace_query, trellis_warn,
};
use trellis_sqlite::Schema;

use crate::{Config, Database};

#[derive(Debug, Clone)]
pub struct RusqliteSession {
    handle: Handle,
}

#[derive(Debug, Clone)]
enum Handle {
    Shared(Arc<Mutex<Connection>>),
    Held(Arc<Mutex<Held>>),
}

/// The connection taken by one transaction.
#[derive(Debug)]
struct Held(OwnedMutexGuard<Connection>);

impl Drop for Held {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn drop(&mut self) {
        if self.0.is_autocommit() {
            return;
        }
        trellis_warn!("rolling back a transaction that was dropped before it finished");
        if let Err(error) = self.0.execute_batch("rollback") {
            trellis_warn!(%error, "rollback of a dropped transaction failed");
        }
    }
}

enum Locked<'a> {
    Shared(MutexGuard<'a, Connection>),
    Held(MutexGuard<'a, Held>),
}

impl Deref for Locked<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            Locked::Shared(conn) => conn,
            Locked::Held(held) => &held.0,
        }
    }
}

impl RusqliteSession {
    pub fn new(conn: Connection) -> Self {
        Self {
            handle: Handle::Shared(Arc::new(Mutex::new(conn))),
        }
    }

    /// Opens the configured database and applies its pragmas.
    pub async fn open(config: &Config) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        let session = Self::new(conn);
        // journal_mode answers with a row, so pragmas go through `all`
        for pragma in config.pragmas() {
            session.all(pragma.to_sql().sql(), &[]).await?;
        }
        Ok(session)
    }

    /// Gives exclusive access to the underlying connection.
    pub async fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        let conn = self.lock().await;
        f(&conn)
    }

    async fn lock(&self) -> Locked<'_> {
        match &self.handle {
            Handle::Shared(conn) => Locked::Shared(conn.lock().await),
            Handle::Held(held) => Locked::Held(held.lock().await),
        }
    }
}

impl Session for RusqliteSession {
    async fn run(&self, sql: &str, params: &[SQLiteValue]) -> Result<RunResult> {
        trellis_trace_query!(sql, params.len());
        let conn = self.lock().await;
        let mut stmt = conn.prepare_cached(sql)?;
        let changes = stmt.execute(params_from_iter(params))?;
        Ok(RunResult {
            changes: changes as u64,
            last_insert_id: conn.last_insert_rowid(),
        })
    }

    async fn get(&self, sql: &str, params: &[SQLiteValue]) -> Result<Option<Row>> {
        trellis_trace_query!(sql, params.len());
        let conn = self.lock().await;
        let mut stmt = conn.prepare_cached(sql)?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(params))?;
        match rows.next()? {
            Some(row) => Ok(Some(read_row(&columns, row)?)),
            None => Ok(None),
        }
    }

    async fn all(&self, sql: &str, params: &[SQLiteValue]) -> Result<Vec<Row>> {
        trellis_trace_query!(sql, params.len());
        let conn = self.lock().await;
        let mut stmt = conn.prepare_cached(sql)?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_row(&columns, row)?);
        }
        Ok(out)
    }

    async fn exec_batch(&self, sql: &str) -> Result<()> {
        trellis_trace_query!(sql, 0);
        let conn = self.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn acquire(&self) -> Result<Self> {
        match &self.handle {
            Handle::Shared(conn) => {
                let guard = Arc::clone(conn).lock_owned().await;
                Ok(Self {
                    handle: Handle::Held(Arc::new(Mutex::new(Held(guard)))),
                })
            }
            Handle::Held(_) => Ok(self.clone()),
        }
    }
}

fn read_row(columns: &Arc<[String]>, row: &::rusqlite::Row<'_>) -> Result<Row> {
    let values = (0..columns.len())
        .map(|i| row.get::<_, SQLiteValue>(i))
        .collect::<::rusqlite::Result<Vec<_>>>()?;
    Ok(Row::new(columns.clone(), values))
}

impl Database<RusqliteSession> {
    /// Opens a rusqlite-backed database for `schema`.
    ///
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> trellis::Result<()> {
    /// use trellis::{Config, Database, Schema};
    ///
    /// let db = Database::open(&Config::in_memory(), Schema::builder().build()?).await?;
    /// db.create().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(config: &Config, schema: Schema) -> Result<Self> {
        let session = RusqliteSession::open(config).await?;
        Ok(Database::new(session, schema))
    }
}
