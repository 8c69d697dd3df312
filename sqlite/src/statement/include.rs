//! Relation inclusion requests.

use serde_json::Value as JsonValue;
use trellis_core::{Result, TrellisError};

use super::expect_object;

/// Relations to embed in each result row, keyed by relation name.
///
/// A nested `Include` both selects further relations of the referenced table
/// and, for `many` relations, carries an optional row `limit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Include {
    limit: Option<i64>,
    relations: Vec<(String, Include)>,
}

impl Include {
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes `relation` with no nested relations.
    pub fn relation(self, relation: impl Into<String>) -> Self {
        self.nested(relation, Include::new())
    }

    /// Includes `relation` and the relations requested by `include` on its table.
    pub fn nested(mut self, relation: impl Into<String>, include: Include) -> Self {
        let relation = relation.into();
        match self.relations.iter_mut().find(|(k, _)| *k == relation) {
            Some((_, existing)) => *existing = include,
            None => self.relations.push((relation, include)),
        }
        self
    }

    /// Caps the rows embedded for a `many` relation. Ignored for `one` relations.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[inline]
    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Include)> {
        self.relations.iter().map(|(k, i)| (k.as_str(), i))
    }

    pub fn get(&self, relation: &str) -> Option<&Include> {
        self.relations
            .iter()
            .find(|(k, _)| k == relation)
            .map(|(_, i)| i)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Parses `{"author": true, "posts": {"limit": 5, "comments": true}}`.
    ///
    /// `false` and `null` entries are skipped.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = expect_object(value, "include")?;
        let mut include = Include::new();
        for (key, entry) in object {
            match (key.as_str(), entry) {
                ("limit", JsonValue::Number(n)) => {
                    include.limit = Some(n.as_i64().ok_or_else(|| {
                        TrellisError::InvalidStatement(format!("include limit {n} is not an integer"))
                    })?);
                }
                (_, JsonValue::Bool(true)) => include = include.relation(key.clone()),
                (_, JsonValue::Bool(false) | JsonValue::Null) => {}
                (_, JsonValue::Object(_)) => include = include.nested(key.clone(), Include::from_json(entry)?),
                (_, other) => {
                    return Err(TrellisError::InvalidStatement(format!(
                        "include \"{key}\" must be a boolean or an object, got {other}"
                    )));
                }
            }
        }
        Ok(include)
    }
}
