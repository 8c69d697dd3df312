//! SQLite REAL columns.

use super::{ColumnBuilder, ColumnKind, ColumnType};

#[derive(Debug, Clone, Copy, Default)]
pub struct RealColumn;

impl ColumnType for RealColumn {
    const KIND: ColumnKind = ColumnKind::Real;
}

pub type RealBuilder = ColumnBuilder<RealColumn>;

/// Declares a REAL (8-byte IEEE float) column stored under `name`.
pub fn real(name: impl Into<String>) -> RealBuilder {
    ColumnBuilder::new(name)
}
