//! Raw rows returned by a [`Session`](crate::session::Session).

use std::sync::Arc;

use crate::value::SQLiteValue;

/// A raw result row: column names shared across the result set, one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SQLiteValue>,
}

impl Row {
    /// Creates a row. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<SQLiteValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SQLiteValue>,
    {
        let (columns, values): (Vec<String>, Vec<SQLiteValue>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value of the first column named `column`.
    pub fn get(&self, column: &str) -> Option<&SQLiteValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Iterates `(column, value)` pairs in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SQLiteValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Consumes the row into `(column, value)` pairs in result order.
    pub fn into_pairs(self) -> impl Iterator<Item = (String, SQLiteValue)> {
        let columns = self.columns;
        self.values
            .into_iter()
            .enumerate()
            .map(move |(i, v)| (columns[i].clone(), v))
    }
}
