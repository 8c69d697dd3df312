//! SQLite TEXT columns.

use super::{ColumnBuilder, ColumnKind, ColumnType};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextColumn;

impl ColumnType for TextColumn {
    const KIND: ColumnKind = ColumnKind::Text;
}

pub type TextBuilder = ColumnBuilder<TextColumn>;

/// Declares a TEXT column stored under `name`.
pub fn text(name: impl Into<String>) -> TextBuilder {
    ColumnBuilder::new(name)
}
