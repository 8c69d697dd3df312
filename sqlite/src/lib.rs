//! SQLite schema registry, statement compiler and query builders for trellis.
//!
//! Tables and relations are declared at runtime, collected into a
//! [`Schema`], and queried through builders that compile JSON-shaped
//! descriptors into parameterized SQL.

pub mod builder;
pub mod columns;
pub mod dialect;
pub mod pragma;
pub mod relations;
pub mod schema;
pub mod statement;
pub mod table;

pub use builder::{
    DeleteQuery, DeleteReturningQuery, InsertQuery, InsertReturningQuery, Many, One, SelectQuery,
    UpdateQuery, UpdateReturningQuery,
};
pub use columns::{Column, ColumnKind, DataType, Reference};
pub use dialect::{Compiled, RowMapper};
pub use pragma::{JournalMode, Pragma};
pub use relations::{Relation, RelationKind, Relations, relations};
pub use schema::{Declaration, Schema, SchemaBuilder};
pub use statement::{
    GroupBy, Include, IntoStatement, Join, JoinKind, Map, MapNode, Operator, Order, OrderBy,
    Returning, Sets, Values, Where,
};
pub use table::{Table, sqlite_table};
