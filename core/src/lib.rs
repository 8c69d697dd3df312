//! Dialect-independent plumbing for trellis: errors, storage values, SQL
//! fragments with positional parameters, raw rows and the async session
//! boundary.

pub mod error;
pub mod row;
pub mod session;
pub mod sql;
pub mod tracing;
pub mod value;

// Re-export key types and traits
pub use error::{Result, TrellisError};
pub use row::Row;
pub use session::{Prepared, RunResult, Session};
pub use sql::SQL;
pub use value::SQLiteValue;
