//! SQLite INTEGER columns.

use super::{ColumnBuilder, ColumnKind, ColumnType};

/// Marker for plain INTEGER columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerColumn;

impl ColumnType for IntegerColumn {
    const KIND: ColumnKind = ColumnKind::Integer;
}

pub type IntegerBuilder = ColumnBuilder<IntegerColumn>;

/// Declares an INTEGER column stored under `name`.
pub fn integer(name: impl Into<String>) -> IntegerBuilder {
    ColumnBuilder::new(name)
}

impl ColumnBuilder<IntegerColumn> {
    /// Makes this column the PRIMARY KEY.
    ///
    /// An `INTEGER PRIMARY KEY` aliases the ROWID, so it is never null and
    /// always has a value assigned by the store.
    ///
    /// See: <https://sqlite.org/lang_createtable.html#rowid>
    pub fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            not_null: true,
            has_default: true,
            ..self
        }
    }

    /// Enables AUTOINCREMENT, which prevents ROWID reuse after deletes.
    pub fn autoincrement(self) -> Self {
        Self {
            autoincrement: true,
            ..self
        }
    }
}
