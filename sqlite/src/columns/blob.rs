//! SQLite BLOB columns.
//!
//! Blobs travel as JSON arrays of bytes on the caller side.

use serde_json::Value as JsonValue;
use trellis_core::{Result, SQLiteValue, TrellisError};

use super::{ColumnBuilder, ColumnKind, ColumnType};

#[derive(Debug, Clone, Copy, Default)]
pub struct BlobColumn;

impl ColumnType for BlobColumn {
    const KIND: ColumnKind = ColumnKind::Blob;
}

pub type BlobBuilder = ColumnBuilder<BlobColumn>;

/// Declares a BLOB column stored under `name`.
pub fn blob(name: impl Into<String>) -> BlobBuilder {
    ColumnBuilder::new(name)
}

pub(crate) fn encode(value: &JsonValue) -> Result<SQLiteValue> {
    let JsonValue::Array(items) = value else {
        return Ok(SQLiteValue::from_json(value));
    };

    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|byte| u8::try_from(byte).ok())
                .ok_or_else(|| TrellisError::Mapping(format!("{item} is not a byte")))
        })
        .collect::<Result<Vec<u8>>>()
        .map(SQLiteValue::Blob)
}

/// Parses the hex text a relation payload carries back into a byte array.
pub(crate) fn from_hex(text: &str) -> Result<JsonValue> {
    if text.len() % 2 != 0 {
        return Err(TrellisError::Mapping(format!("odd-length hex blob \"{text}\"")));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .map(JsonValue::from)
                .ok_or_else(|| TrellisError::Mapping(format!("invalid hex blob \"{text}\"")))
        })
        .collect::<Result<Vec<_>>>()
        .map(JsonValue::Array)
}
