//! Date columns, stored as INTEGER epoch milliseconds.
//!
//! On the caller side dates are RFC 3339 strings in UTC with millisecond
//! precision (`2024-05-01T12:30:00.000Z`), which deserialize directly into
//! `chrono::DateTime<Utc>`. Integer epoch milliseconds are accepted on input
//! as well.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use trellis_core::{Result, SQLiteValue, TrellisError};

use super::{ColumnBuilder, ColumnKind, ColumnType};

#[derive(Debug, Clone, Copy, Default)]
pub struct DateColumn;

impl ColumnType for DateColumn {
    const KIND: ColumnKind = ColumnKind::Date;
}

pub type DateBuilder = ColumnBuilder<DateColumn>;

/// Declares a date column stored under `name`.
pub fn date(name: impl Into<String>) -> DateBuilder {
    ColumnBuilder::new(name)
}

/// Renders epoch milliseconds in the caller representation.
pub fn format_millis(millis: i64) -> Result<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| TrellisError::Mapping(format!("{millis} is out of the date range")))
}

/// Parses an RFC 3339 string into epoch milliseconds.
pub fn parse_millis(value: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| TrellisError::Mapping(format!("invalid date \"{value}\": {e}")))
}

pub(crate) fn encode(value: &JsonValue) -> Result<SQLiteValue> {
    match value {
        JsonValue::Null => Ok(SQLiteValue::Null),
        JsonValue::String(s) => parse_millis(s).map(SQLiteValue::Integer),
        JsonValue::Number(n) => n
            .as_i64()
            .map(SQLiteValue::Integer)
            .ok_or_else(|| TrellisError::Mapping(format!("{n} is not an epoch millisecond"))),
        other => Err(TrellisError::Mapping(format!("{other} is not a date"))),
    }
}

pub(crate) fn decode(value: SQLiteValue) -> Result<JsonValue> {
    match value {
        SQLiteValue::Integer(millis) => format_millis(millis).map(JsonValue::String),
        SQLiteValue::Real(millis) => format_millis(millis as i64).map(JsonValue::String),
        other => Ok(other.into_json()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_round_trip_through_epoch_millis() {
        let column = date("created_at").not_null().build("createdAt").unwrap();
        let value = json!("2024-05-01T12:30:00.250Z");

        let stored = column.encode(&value).unwrap();
        assert_eq!(stored, SQLiteValue::Integer(1_714_566_600_250));
        assert_eq!(column.decode(stored).unwrap(), value);
    }

    #[test]
    fn offsets_normalize_to_utc() {
        let stored = encode(&json!("2024-05-01T14:30:00+02:00")).unwrap();
        assert_eq!(decode(stored).unwrap(), json!("2024-05-01T12:30:00.000Z"));
    }

    #[test]
    fn integer_defaults_render_as_literals() {
        let column = date("created_at").default(0).build("createdAt").unwrap();
        assert_eq!(column.to_sql(), "created_at integer default 0");
    }

    #[test]
    fn garbage_is_a_mapping_error() {
        assert!(matches!(
            encode(&json!("yesterday")),
            Err(TrellisError::Mapping(_))
        ));
    }
}
