//! Storage value type bound as a positional parameter and read back from rows.

use serde_json::{Number, Value as JsonValue};

/// Represents a SQLite storage value
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum SQLiteValue {
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value (owned string)
    Text(String),
    /// Blob value (owned binary data)
    Blob(Vec<u8>),
    /// NULL value
    #[default]
    Null,
}

impl SQLiteValue {
    /// Returns true for SQL NULL.
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, SQLiteValue::Null)
    }

    /// Converts a JSON value into its natural storage representation.
    ///
    /// Booleans become `0`/`1`, numbers keep their integer or real nature,
    /// arrays and objects are stored as JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => SQLiteValue::Null,
            JsonValue::Bool(b) => SQLiteValue::Integer(i64::from(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SQLiteValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    SQLiteValue::Real(f)
                } else {
                    // u64 beyond i64::MAX
                    SQLiteValue::Text(n.to_string())
                }
            }
            JsonValue::String(s) => SQLiteValue::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => SQLiteValue::Text(value.to_string()),
        }
    }

    /// Converts the storage value into JSON without any column-specific coercion.
    pub fn into_json(self) -> JsonValue {
        match self {
            SQLiteValue::Null => JsonValue::Null,
            SQLiteValue::Integer(i) => JsonValue::Number(i.into()),
            SQLiteValue::Real(r) => Number::from_f64(r).map_or(JsonValue::Null, JsonValue::Number),
            SQLiteValue::Text(s) => JsonValue::String(s),
            SQLiteValue::Blob(b) => JsonValue::Array(b.into_iter().map(JsonValue::from).collect()),
        }
    }

    /// Renders the value as a SQL literal (used for DDL defaults).
    pub fn to_literal(&self) -> String {
        match self {
            SQLiteValue::Null => "null".to_string(),
            SQLiteValue::Integer(i) => i.to_string(),
            SQLiteValue::Real(r) => r.to_string(),
            SQLiteValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SQLiteValue::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }
}

impl std::fmt::Display for SQLiteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            SQLiteValue::Integer(i) => i.to_string(),
            SQLiteValue::Real(r) => r.to_string(),
            SQLiteValue::Text(s) => s.clone(),
            SQLiteValue::Blob(b) => String::from_utf8_lossy(b).to_string(),
            SQLiteValue::Null => String::new(),
        };
        write!(f, "{value}")
    }
}

//------------------------------------------------------------------------------
// From<T> implementations
//------------------------------------------------------------------------------

impl From<i64> for SQLiteValue {
    fn from(value: i64) -> Self {
        SQLiteValue::Integer(value)
    }
}

impl From<i32> for SQLiteValue {
    fn from(value: i32) -> Self {
        SQLiteValue::Integer(value as i64)
    }
}

impl From<u32> for SQLiteValue {
    fn from(value: u32) -> Self {
        SQLiteValue::Integer(value as i64)
    }
}

impl From<f64> for SQLiteValue {
    fn from(value: f64) -> Self {
        SQLiteValue::Real(value)
    }
}

impl From<bool> for SQLiteValue {
    fn from(value: bool) -> Self {
        SQLiteValue::Integer(i64::from(value))
    }
}

impl From<&str> for SQLiteValue {
    fn from(value: &str) -> Self {
        SQLiteValue::Text(value.to_string())
    }
}

impl From<String> for SQLiteValue {
    fn from(value: String) -> Self {
        SQLiteValue::Text(value)
    }
}

impl From<Vec<u8>> for SQLiteValue {
    fn from(value: Vec<u8>) -> Self {
        SQLiteValue::Blob(value)
    }
}

impl<T> From<Option<T>> for SQLiteValue
where
    T: Into<SQLiteValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(SQLiteValue::Null, Into::into)
    }
}

impl From<&JsonValue> for SQLiteValue {
    fn from(value: &JsonValue) -> Self {
        SQLiteValue::from_json(value)
    }
}

//------------------------------------------------------------------------------
// Database Driver Implementations
//------------------------------------------------------------------------------

#[cfg(feature = "rusqlite")]
impl rusqlite::ToSql for SQLiteValue {
    fn to_sql(&self) -> ::rusqlite::Result<::rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value, ValueRef};

        Ok(match self {
            SQLiteValue::Null => ToSqlOutput::Owned(Value::Null),
            SQLiteValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SQLiteValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SQLiteValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SQLiteValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice())),
        })
    }
}

#[cfg(feature = "rusqlite")]
impl rusqlite::types::FromSql for SQLiteValue {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        Ok(SQLiteValue::from(value))
    }
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::types::ValueRef<'_>> for SQLiteValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        match value {
            rusqlite::types::ValueRef::Null => SQLiteValue::Null,
            rusqlite::types::ValueRef::Integer(i) => SQLiteValue::Integer(i),
            rusqlite::types::ValueRef::Real(r) => SQLiteValue::Real(r),
            rusqlite::types::ValueRef::Text(items) => {
                SQLiteValue::Text(String::from_utf8_lossy(items).into_owned())
            }
            rusqlite::types::ValueRef::Blob(items) => SQLiteValue::Blob(items.to_vec()),
        }
    }
}
