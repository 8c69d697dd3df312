//! # trellis
//!
//! A lightweight data-access layer for SQLite. Tables and relations are
//! declared at runtime, queries are described with JSON-shaped descriptors
//! and compiled into parameterized SQL, and related rows are embedded in the
//! results as nested JSON.
//!
//! ```
//! use serde_json::json;
//! use trellis::columns::{integer, text};
//! use trellis::{Config, Database, Schema, relations, sqlite_table};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> trellis::Result<()> {
//! let users = sqlite_table("users", |t| {
//!     t.column("id", integer("id").primary_key());
//!     t.column("name", text("name").not_null());
//! })?;
//! let posts = sqlite_table("posts", |t| {
//!     t.column("id", integer("id").primary_key());
//!     t.column("authorId", integer("author_id").references("users", "id"));
//!     t.column("title", text("title"));
//! })?;
//! let schema = Schema::builder()
//!     .table("users", users.clone())
//!     .table("posts", posts.clone())
//!     .relations("postsRelations", relations(&posts, |r| {
//!         r.one("author", &users, &["authorId"], &["id"]);
//!     }))
//!     .build()?;
//!
//! let db = Database::open(&Config::in_memory(), schema).await?;
//! db.create().await?;
//! db.insert("users").values(json!({"name": "A"})).execute().await?;
//! db.insert("posts").values(json!({"authorId": 1, "title": "Hi"})).execute().await?;
//!
//! let posts = db.find_all("posts").include(json!({"author": true})).execute().await?;
//! assert_eq!(posts[0]["author"]["name"], "A");
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! | Feature    | Default | Description                         |
//! |------------|---------|-------------------------------------|
//! | `rusqlite` | yes     | rusqlite-backed session (bundled)   |
//! | `tracing`  | yes     | query and transaction events        |

#[macro_use]
mod macros;

mod config;
mod database;
pub mod sqlite;
mod transaction;

pub use config::Config;
pub use database::Database;
pub use transaction::Transaction;

#[cfg(feature = "rusqlite")]
pub use sqlite::rusqlite::RusqliteSession;

pub use trellis_core::{
    Prepared, Result, Row, RunResult, SQL, SQLiteValue, Session, TrellisError, error,
};
pub use trellis_sqlite::{
    Column, Compiled, Declaration, GroupBy, Include, IntoStatement, Join, JoinKind, JournalMode,
    Map, MapNode, Operator, Order, OrderBy, Pragma, Relation, RelationKind, Relations, Returning,
    Schema, SchemaBuilder, Sets, Table, Values, Where, builder, columns, dialect, pragma,
    relations, sqlite_table, statement,
};
