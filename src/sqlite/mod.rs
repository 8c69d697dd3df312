//! Store drivers.

#[cfg(feature = "rusqlite")]
pub mod rusqlite;
