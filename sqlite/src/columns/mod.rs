//! Column descriptors, their DDL rendering and value coercion.
//!
//! A column is declared with one of the kind constructors ([`integer`],
//! [`text`], [`real`], [`blob`], [`boolean`], [`date`]), configured through
//! the returned [`ColumnBuilder`] and finalized by the table builder under a
//! logical name.

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value as JsonValue;
use trellis_core::{Result, SQLiteValue, TrellisError};

pub mod blob;
pub mod boolean;
pub mod date;
pub mod integer;
pub mod real;
pub mod text;

pub use blob::{BlobBuilder, BlobColumn, blob};
pub use boolean::{BooleanBuilder, BooleanColumn, boolean};
pub use date::{DateBuilder, DateColumn, date};
pub use integer::{IntegerBuilder, IntegerColumn, integer};
pub use real::{RealBuilder, RealColumn, real};
pub use text::{TextBuilder, TextColumn, text};

/// SQLite storage class a column is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
}

impl DataType {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Text => "text",
            DataType::Real => "real",
            DataType::Blob => "blob",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column kind, which decides both the storage class and the value codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Text,
    Real,
    Blob,
    /// Stored as integer `0`/`1`
    Boolean,
    /// Stored as integer epoch milliseconds
    Date,
}

impl ColumnKind {
    /// The storage class used in DDL.
    pub const fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Integer | ColumnKind::Boolean | ColumnKind::Date => DataType::Integer,
            ColumnKind::Text => DataType::Text,
            ColumnKind::Real => DataType::Real,
            ColumnKind::Blob => DataType::Blob,
        }
    }
}

/// Marker implemented by every column kind type.
pub trait ColumnType {
    const KIND: ColumnKind;
}

/// Target of a column-level `references` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Another table's column, by physical names
    Column { table: String, column: String },
    /// Verbatim reference expression, e.g. `entities(id) on delete cascade`
    Raw(String),
}

impl Reference {
    pub fn to_sql(&self) -> String {
        match self {
            Reference::Column { table, column } => format!("{table}({column})"),
            Reference::Raw(raw) => raw.clone(),
        }
    }

    /// Returns true if this reference points at a column of `table`.
    pub fn targets(&self, table: &str) -> bool {
        matches!(self, Reference::Column { table: t, .. } if t == table)
    }
}

/// An immutable column descriptor owned by its table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    logical_name: String,
    kind: ColumnKind,
    unique: bool,
    not_null: bool,
    has_default: bool,
    default: Option<SQLiteValue>,
    references: Option<Reference>,
    primary_key: bool,
    autoincrement: bool,
}

impl Column {
    /// Physical column name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used by queries, filters and result shapes.
    #[inline]
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    #[inline]
    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }

    #[inline]
    pub const fn data_type(&self) -> DataType {
        self.kind.data_type()
    }

    #[inline]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    #[inline]
    pub const fn is_not_null(&self) -> bool {
        self.not_null
    }

    #[inline]
    pub const fn has_default(&self) -> bool {
        self.has_default
    }

    /// The encoded default value rendered into DDL.
    #[inline]
    pub fn default_value(&self) -> Option<&SQLiteValue> {
        self.default.as_ref()
    }

    #[inline]
    pub fn references(&self) -> Option<&Reference> {
        self.references.as_ref()
    }

    #[inline]
    pub fn has_references(&self) -> bool {
        self.references.is_some()
    }

    #[inline]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    #[inline]
    pub const fn is_autoincrement(&self) -> bool {
        self.autoincrement
    }

    /// Converts a caller value into the value bound for this column.
    pub fn encode(&self, value: &JsonValue) -> Result<SQLiteValue> {
        match self.kind {
            ColumnKind::Boolean => boolean::encode(value),
            ColumnKind::Date => date::encode(value),
            ColumnKind::Blob => blob::encode(value),
            ColumnKind::Integer | ColumnKind::Text | ColumnKind::Real => {
                Ok(SQLiteValue::from_json(value))
            }
        }
    }

    /// Converts a stored value back into the caller representation.
    pub fn decode(&self, value: SQLiteValue) -> Result<JsonValue> {
        match self.kind {
            ColumnKind::Boolean => Ok(boolean::decode(value)),
            ColumnKind::Date => date::decode(value),
            ColumnKind::Integer | ColumnKind::Text | ColumnKind::Real | ColumnKind::Blob => {
                Ok(value.into_json())
            }
        }
    }

    /// The expression embedding this column in a `json_object`, read through
    /// `alias`. JSON cannot hold blobs, so they travel as hex text.
    pub(crate) fn json_expression(&self, alias: &str) -> String {
        match self.kind {
            ColumnKind::Blob => format!(
                "case when {alias}.{name} is null then null else hex({alias}.{name}) end",
                name = self.name
            ),
            _ => format!("{alias}.{}", self.name),
        }
    }

    /// Decodes a value embedded in a JSON relation payload.
    ///
    /// SQLite's JSON functions already surface integers, reals and text as
    /// JSON scalars, so only the coercing kinds need a second pass.
    pub fn decode_json(&self, value: JsonValue) -> Result<JsonValue> {
        match (self.kind, value) {
            (ColumnKind::Boolean | ColumnKind::Date, value) => {
                self.decode(SQLiteValue::from_json(&value))
            }
            (ColumnKind::Blob, JsonValue::String(hex)) => blob::from_hex(&hex),
            (_, value) => Ok(value),
        }
    }

    /// Renders the column definition used inside `CREATE TABLE`.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.data_type());

        if self.unique {
            sql.push_str(" unique");
        }
        if self.not_null {
            sql.push_str(" not null");
        }
        if let Some(default) = &self.default {
            sql.push_str(" default ");
            sql.push_str(&default.to_literal());
        }
        if let Some(reference) = &self.references {
            sql.push_str(" references ");
            sql.push_str(&reference.to_sql());
        }
        if self.primary_key {
            sql.push_str(" primary key");
            if self.autoincrement {
                sql.push_str(" autoincrement");
            }
        }
        sql
    }
}

/// Chainable column configuration, finalized by the table builder.
#[derive(Debug, Clone)]
pub struct ColumnBuilder<K> {
    name: String,
    unique: bool,
    not_null: bool,
    has_default: bool,
    default: Option<JsonValue>,
    references: Option<Reference>,
    primary_key: bool,
    autoincrement: bool,
    _kind: PhantomData<K>,
}

impl<K: ColumnType> ColumnBuilder<K> {
    /// Creates a builder for the physical column `name` with no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: false,
            not_null: false,
            has_default: false,
            default: None,
            references: None,
            primary_key: false,
            autoincrement: false,
            _kind: PhantomData,
        }
    }

    pub fn not_null(self) -> Self {
        Self {
            not_null: true,
            ..self
        }
    }

    pub fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    /// Sets a default value; it passes through the column codec before rendering.
    pub fn default(self, value: impl Into<JsonValue>) -> Self {
        Self {
            has_default: true,
            default: Some(value.into()),
            ..self
        }
    }

    /// References another table's column by physical names.
    pub fn references(self, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            references: Some(Reference::Column {
                table: table.into(),
                column: column.into(),
            }),
            ..self
        }
    }

    /// References with a verbatim clause such as `entities(id) on delete cascade`.
    pub fn references_raw(self, reference: impl Into<String>) -> Self {
        Self {
            references: Some(Reference::Raw(reference.into())),
            ..self
        }
    }

    /// Finalizes the column under `logical_name`.
    pub fn build(self, logical_name: impl Into<String>) -> Result<Column> {
        let logical_name = logical_name.into();

        if self.name.is_empty() {
            return Err(TrellisError::Configuration(format!(
                "column \"{logical_name}\" has an empty name"
            )));
        }
        if self.autoincrement && !self.primary_key {
            return Err(TrellisError::Configuration(format!(
                "column \"{}\" uses autoincrement without primary key",
                self.name
            )));
        }

        let mut column = Column {
            name: self.name,
            logical_name,
            kind: K::KIND,
            unique: self.unique,
            not_null: self.not_null,
            has_default: self.has_default,
            default: None,
            references: self.references,
            primary_key: self.primary_key,
            autoincrement: self.autoincrement,
        };
        if let Some(default) = self.default {
            column.default = Some(column.encode(&default)?);
        }
        Ok(column)
    }
}
