//! Query descriptors consumed by the dialect.
//!
//! Every descriptor can be built in Rust or parsed from the plain JSON form
//! callers send through higher-level services, e.g.
//! `{"name": {"$in": ["A", "B"]}}` for a filter or `{"id": true}` for a
//! returning projection.

use std::fmt;

use serde_json::{Map as JsonMap, Value as JsonValue};
use trellis_core::{Result, TrellisError};

pub mod filter;
pub mod include;
pub mod map;

pub use filter::Where;
pub use include::Include;
pub use map::{Map, MapNode};

/// Comparison operators usable in filters and join conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
    In,
    NotIn,
}

impl Operator {
    #[inline]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Like => "like",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }

    /// Parses the JSON spelling of an operator (`==`, `!=`, `$like`, `$in`, ...).
    pub fn from_key(key: &str) -> Result<Self> {
        Ok(match key {
            "==" | "=" | "$eq" => Operator::Eq,
            "!=" | "<>" | "$ne" => Operator::Ne,
            "<" | "$lt" => Operator::Lt,
            ">" | "$gt" => Operator::Gt,
            "<=" | "$lte" => Operator::Le,
            ">=" | "$gte" => Operator::Ge,
            "$like" => Operator::Like,
            "$in" => Operator::In,
            "$not in" | "$nin" => Operator::NotIn,
            other => {
                return Err(TrellisError::InvalidStatement(format!(
                    "unknown operator \"{other}\""
                )));
            }
        })
    }

    /// Set operators take an array operand.
    #[inline]
    pub const fn is_set(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    #[inline]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Ordered `order by` keys, referring to projection aliases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy(pub Vec<(String, Order)>);

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(mut self, key: impl Into<String>) -> Self {
        self.0.push((key.into(), Order::Asc));
        self
    }

    pub fn desc(mut self, key: impl Into<String>) -> Self {
        self.0.push((key.into(), Order::Desc));
        self
    }

    /// Parses `{"users.name": "asc", "users.id": "desc"}`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = expect_object(value, "order by")?;
        let mut order = OrderBy::new();
        for (key, direction) in object {
            let direction = match direction.as_str().map(str::to_ascii_lowercase).as_deref() {
                Some("asc") => Order::Asc,
                Some("desc") => Order::Desc,
                _ => {
                    return Err(TrellisError::InvalidStatement(format!(
                        "order by \"{key}\" must be \"asc\" or \"desc\""
                    )));
                }
            };
            order.0.push((key.clone(), direction));
        }
        Ok(order)
    }
}

/// `group by` keys, referring to projection aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupBy(pub Vec<String>);

impl GroupBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(key.into());
        self
    }

    /// Parses `{"users.roleId": true}`; `false` entries are dropped.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        Ok(GroupBy(selected_keys(value, "group by")?))
    }
}

/// Logical column names projected by `returning`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Returning(pub Vec<String>);

impl Returning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, key: impl Into<String>) -> Self {
        self.0.push(key.into());
        self
    }

    /// Parses `{"id": true, "email": true}`; `false` entries are dropped.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        Ok(Returning(selected_keys(value, "returning")?))
    }
}

/// Insert payload: one object, or an array of objects sharing a key set.
#[derive(Debug, Clone, PartialEq)]
pub struct Values {
    rows: Vec<JsonMap<String, JsonValue>>,
    many: bool,
}

impl Values {
    pub fn one(row: JsonMap<String, JsonValue>) -> Self {
        Self {
            rows: vec![row],
            many: false,
        }
    }

    pub fn many(rows: Vec<JsonMap<String, JsonValue>>) -> Self {
        Self { rows, many: true }
    }

    /// True when built from an array, which decides the insert result shape.
    #[inline]
    pub fn is_many(&self) -> bool {
        self.many
    }

    #[inline]
    pub fn rows(&self) -> &[JsonMap<String, JsonValue>] {
        &self.rows
    }

    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(row) => Ok(Values::one(row.clone())),
            JsonValue::Array(rows) => rows
                .iter()
                .map(|row| expect_object(row, "values").cloned())
                .collect::<Result<Vec<_>>>()
                .map(Values::many),
            other => Err(TrellisError::InvalidStatement(format!(
                "values must be an object or an array of objects, got {other}"
            ))),
        }
    }
}

/// Update payload. Absent keys are left untouched; `null` stores NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sets(pub JsonMap<String, JsonValue>);

impl Sets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn from_json(value: &JsonValue) -> Result<Self> {
        expect_object(value, "sets").map(|object| Sets(object.clone()))
    }
}

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

/// A join of a schema table under an alias.
///
/// The joined columns become addressable as `<alias>.<column>` fields and the
/// default projection gains a nested `<alias>` object.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub(crate) table: String,
    pub(crate) alias: String,
    pub(crate) kind: JoinKind,
    pub(crate) condition: Option<(String, Operator, String)>,
}

impl Join {
    /// Inner join of the table registered as `table`, aliased `alias`.
    pub fn inner(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            kind: JoinKind::Inner,
            condition: None,
        }
    }

    /// Left join of the table registered as `table`, aliased `alias`.
    pub fn left(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            kind: JoinKind::Left,
            ..Self::inner(table, alias)
        }
    }

    /// Join condition `<alias>.<column> <operator> <field>`, where `column`
    /// is a logical column of the joined table and `field` an already
    /// resolved field key such as `posts.authorId`.
    pub fn on(mut self, column: impl Into<String>, operator: Operator, field: impl Into<String>) -> Self {
        self.condition = Some((column.into(), operator, field.into()));
        self
    }

    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// Accepts a descriptor either typed or as its JSON form.
///
/// Parsing errors surface when the query executes, before any I/O.
pub trait IntoStatement<T> {
    fn into_statement(self) -> Result<T>;
}

macro_rules! impl_into_statement {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoStatement<$ty> for $ty {
                #[inline]
                fn into_statement(self) -> Result<$ty> {
                    Ok(self)
                }
            }

            impl IntoStatement<$ty> for JsonValue {
                fn into_statement(self) -> Result<$ty> {
                    <$ty>::from_json(&self)
                }
            }

            impl IntoStatement<$ty> for &JsonValue {
                fn into_statement(self) -> Result<$ty> {
                    <$ty>::from_json(self)
                }
            }
        )+
    };
}

impl_into_statement!(Where, Map, Include, OrderBy, GroupBy, Returning, Values, Sets);

pub(crate) fn expect_object<'v>(
    value: &'v JsonValue,
    what: &str,
) -> Result<&'v JsonMap<String, JsonValue>> {
    value.as_object().ok_or_else(|| {
        TrellisError::InvalidStatement(format!("{what} must be an object, got {value}"))
    })
}

fn selected_keys(value: &JsonValue, what: &str) -> Result<Vec<String>> {
    let object = expect_object(value, what)?;
    let mut keys = Vec::with_capacity(object.len());
    for (key, flag) in object {
        match flag {
            JsonValue::Bool(true) => keys.push(key.clone()),
            JsonValue::Bool(false) | JsonValue::Null => {}
            other => {
                return Err(TrellisError::InvalidStatement(format!(
                    "{what} \"{key}\" must be a boolean, got {other}"
                )));
            }
        }
    }
    Ok(keys)
}
