//! SQL text paired with its positional parameters.
//!
//! Every fragment carries the values for the `?` placeholders it contains, and
//! concatenating fragments concatenates their parameter lists in the same
//! order. The final parameter list therefore always matches placeholder order
//! in the rendered text, which is what positional binding relies on.

use crate::value::SQLiteValue;

/// A fragment of SQL with the values bound to its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQL {
    text: String,
    params: Vec<SQLiteValue>,
}

impl SQL {
    /// Creates an empty fragment.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            text: String::new(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment from raw SQL text with no parameters.
    #[inline]
    pub fn raw<T: AsRef<str>>(sql: T) -> Self {
        Self {
            text: sql.as_ref().to_string(),
            params: Vec::new(),
        }
    }

    /// Creates a single `?` placeholder bound to `value`.
    #[inline]
    pub fn parameter(value: impl Into<SQLiteValue>) -> Self {
        Self {
            text: "?".to_string(),
            params: vec![value.into()],
        }
    }

    /// Creates a parenthesized placeholder list `(?, ?, ?)`, one parameter per
    /// value, in iteration order.
    pub fn parameters<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SQLiteValue>,
    {
        let params: Vec<SQLiteValue> = values.into_iter().map(Into::into).collect();
        let placeholders = vec!["?"; params.len()].join(", ");
        Self {
            text: format!("({placeholders})"),
            params,
        }
    }

    /// Appends raw text directly, without a separating space.
    #[inline]
    pub fn push_raw(&mut self, sql: impl AsRef<str>) {
        self.text.push_str(sql.as_ref());
    }

    /// Appends another fragment directly, without a separating space.
    #[inline]
    pub fn push(&mut self, other: SQL) {
        self.text.push_str(&other.text);
        self.params.extend(other.params);
    }

    /// Appends a single `?` placeholder bound to `value`.
    #[inline]
    pub fn push_param(&mut self, value: impl Into<SQLiteValue>) {
        self.text.push('?');
        self.params.push(value.into());
    }

    /// Appends raw text separated by a single space.
    pub fn append_raw(mut self, sql: impl AsRef<str>) -> Self {
        let sql = sql.as_ref();
        if !sql.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(sql);
        }
        self
    }

    /// Appends another fragment separated by a single space.
    pub fn append(mut self, other: SQL) -> Self {
        if other.text.is_empty() {
            self.params.extend(other.params);
            return self;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.push(other);
        self
    }

    /// Joins fragments with `separator`, keeping parameter order.
    pub fn join<I>(sqls: I, separator: &str) -> SQL
    where
        I: IntoIterator<Item = SQL>,
    {
        let mut out = SQL::empty();
        for (i, sql) in sqls.into_iter().enumerate() {
            if i > 0 {
                out.text.push_str(separator);
            }
            out.push(sql);
        }
        out
    }

    /// Wraps the fragment in parentheses.
    pub fn parens(self) -> SQL {
        let mut out = SQL::raw("(");
        out.push(self);
        out.push_raw(")");
        out
    }

    /// Returns true if the fragment renders no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The rendered SQL text.
    #[inline]
    pub fn sql(&self) -> &str {
        &self.text
    }

    /// The bound parameters in placeholder order.
    #[inline]
    pub fn params(&self) -> &[SQLiteValue] {
        &self.params
    }

    /// Splits the fragment into its text and parameters.
    #[inline]
    pub fn into_parts(self) -> (String, Vec<SQLiteValue>) {
        (self.text, self.params)
    }
}

impl From<&str> for SQL {
    fn from(value: &str) -> Self {
        SQL::raw(value)
    }
}

impl std::fmt::Display for SQL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
