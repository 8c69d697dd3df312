//! Filter trees for `where` and `having`.

use serde_json::Value as JsonValue;
use trellis_core::{Result, TrellisError};

use super::{Operator, expect_object};

/// A boolean filter tree.
///
/// Leaves compare a field with a value; `And`/`Or` nodes combine children.
/// An empty group renders nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    And(Vec<Where>),
    Or(Vec<Where>),
    Cond {
        field: String,
        operator: Operator,
        value: JsonValue,
    },
}

impl Default for Where {
    fn default() -> Self {
        Where::And(Vec::new())
    }
}

macro_rules! comparison {
    ($($(#[$doc:meta])* $name:ident => $op:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
                Self::cond(field, Operator::$op, value)
            }
        )+
    };
}

impl Where {
    pub fn cond(field: impl Into<String>, operator: Operator, value: impl Into<JsonValue>) -> Self {
        Where::Cond {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    comparison! {
        /// `field = value`, or `field is null` when `value` is null
        eq => Eq,
        /// `field != value`, or `field is not null` when `value` is null
        ne => Ne,
        lt => Lt,
        gt => Gt,
        le => Le,
        ge => Ge,
        like => Like,
    }

    /// `field in (?, ...)`, one parameter per element.
    pub fn in_<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        Self::cond(
            field,
            Operator::In,
            JsonValue::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `field not in (?, ...)`, one parameter per element.
    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        Self::cond(
            field,
            Operator::NotIn,
            JsonValue::Array(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn all(children: impl IntoIterator<Item = Where>) -> Self {
        Where::And(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = Where>) -> Self {
        Where::Or(children.into_iter().collect())
    }

    /// Combines with `other` under `and`, flattening into an existing `And` group.
    pub fn and(self, other: Where) -> Self {
        match self {
            Where::And(mut children) => {
                children.push(other);
                Where::And(children)
            }
            this => Where::And(vec![this, other]),
        }
    }

    /// Combines with `other` under `or`, flattening into an existing `Or` group.
    pub fn or(self, other: Where) -> Self {
        match self {
            Where::Or(mut children) => {
                children.push(other);
                Where::Or(children)
            }
            this => Where::Or(vec![this, other]),
        }
    }

    /// True if the tree has no leaves and therefore renders nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Where::And(children) | Where::Or(children) => children.iter().all(Where::is_empty),
            Where::Cond { .. } => false,
        }
    }

    /// Parses the JSON filter form.
    ///
    /// Keys of an object are combined with an implicit `and`. `$and`/`$or`
    /// take an object (its entries are combined) or an array of filters.
    /// Any other key is a field whose value maps operators to operands:
    /// `{"age": {">": 18, "<": 65}, "$or": {"name": {"==": "A"}, "email": {"$like": "%@x.com"}}}`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = expect_object(value, "where")?;
        let mut children = Vec::with_capacity(object.len());

        for (key, statement) in object {
            match key.as_str() {
                "$and" => children.push(Where::And(Self::group(statement)?)),
                "$or" => children.push(Where::Or(Self::group(statement)?)),
                field => {
                    let operators = expect_object(statement, "where")?;
                    for (operator, operand) in operators {
                        let operator = Operator::from_key(operator)?;
                        if operator.is_set() && !operand.is_array() {
                            return Err(TrellisError::InvalidStatement(format!(
                                "\"{field}\" {operator} needs an array, got {operand}"
                            )));
                        }
                        children.push(Where::cond(field, operator, operand.clone()));
                    }
                }
            }
        }

        Ok(match children.len() {
            1 => children.remove(0),
            _ => Where::And(children),
        })
    }

    fn group(statement: &JsonValue) -> Result<Vec<Where>> {
        match statement {
            JsonValue::Array(items) => items.iter().map(Where::from_json).collect(),
            JsonValue::Object(object) => object
                .iter()
                .map(|(key, value)| {
                    let mut entry = serde_json::Map::with_capacity(1);
                    entry.insert(key.clone(), value.clone());
                    Where::from_json(&JsonValue::Object(entry))
                })
                .collect(),
            other => Err(TrellisError::InvalidStatement(format!(
                "filter group must be an object or an array, got {other}"
            ))),
        }
    }
}
