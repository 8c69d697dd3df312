//! Boolean columns, stored as INTEGER `0`/`1`.
//!
//! SQLite has no native boolean storage class.
//! See: <https://sqlite.org/datatype3.html#boolean_datatype>

use serde_json::Value as JsonValue;
use trellis_core::{Result, SQLiteValue};

use super::{ColumnBuilder, ColumnKind, ColumnType};

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanColumn;

impl ColumnType for BooleanColumn {
    const KIND: ColumnKind = ColumnKind::Boolean;
}

pub type BooleanBuilder = ColumnBuilder<BooleanColumn>;

/// Declares a boolean column stored under `name`.
pub fn boolean(name: impl Into<String>) -> BooleanBuilder {
    ColumnBuilder::new(name)
}

pub(crate) fn encode(value: &JsonValue) -> Result<SQLiteValue> {
    Ok(match value {
        JsonValue::Bool(b) => SQLiteValue::Integer(i64::from(*b)),
        other => SQLiteValue::from_json(other),
    })
}

pub(crate) fn decode(value: SQLiteValue) -> JsonValue {
    match value {
        SQLiteValue::Integer(i) => JsonValue::Bool(i != 0),
        SQLiteValue::Real(r) => JsonValue::Bool(r != 0.0),
        other => other.into_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booleans_round_trip_through_integers() {
        let column = boolean("is_active").default(true).build("isActive").unwrap();
        assert_eq!(column.to_sql(), "is_active integer default 1");

        for value in [json!(true), json!(false), json!(null)] {
            let stored = column.encode(&value).unwrap();
            assert_eq!(column.decode(stored).unwrap(), value);
        }
        assert_eq!(column.decode(SQLiteValue::Integer(7)).unwrap(), json!(true));
    }

    #[test]
    fn embedded_json_integers_decode_to_booleans() {
        let column = boolean("is_active").build("isActive").unwrap();
        assert_eq!(column.decode_json(json!(0)).unwrap(), json!(false));
    }
}
