//! Result shape descriptors.

use serde_json::Value as JsonValue;
use trellis_core::{Result, TrellisError};

use super::expect_object;

/// A node of the result shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MapNode {
    /// A field key such as `users.email` or `author.name`
    Field(String),
    /// A raw SQL expression selected as-is, e.g. `count(*)`
    Raw(String),
    /// A nested object
    Nested(Map),
}

/// Output shape of a select: ordered keys mapped to fields, raw expressions
/// or nested shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: Vec<(String, MapNode)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.insert(key.into(), MapNode::Field(field.into()));
        self
    }

    pub fn raw(mut self, key: impl Into<String>, expression: impl Into<String>) -> Self {
        self.insert(key.into(), MapNode::Raw(expression.into()));
        self
    }

    pub fn nested(mut self, key: impl Into<String>, map: Map) -> Self {
        self.insert(key.into(), MapNode::Nested(map));
        self
    }

    /// Inserts or replaces `key`, keeping its first position.
    pub fn insert(&mut self, key: String, node: MapNode) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = node,
            None => self.entries.push((key, node)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MapNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapNode)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses `{"id": "users.id", "total": {"$raw": "count(*)"}, "author": {"name": "a.name"}}`.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = expect_object(value, "map")?;
        let mut map = Map::new();
        for (key, node) in object {
            let node = match node {
                JsonValue::String(field) => MapNode::Field(field.clone()),
                JsonValue::Object(inner) => match inner.get("$raw") {
                    Some(JsonValue::String(expression)) if inner.len() == 1 => {
                        MapNode::Raw(expression.clone())
                    }
                    Some(_) => {
                        return Err(TrellisError::InvalidStatement(format!(
                            "map \"{key}\": $raw must be the only key and a string"
                        )));
                    }
                    None => MapNode::Nested(Map::from_json(node)?),
                },
                other => {
                    return Err(TrellisError::InvalidStatement(format!(
                        "map \"{key}\" must be a field, a $raw expression or an object, got {other}"
                    )));
                }
            };
            map.insert(key.clone(), node);
        }
        Ok(map)
    }
}
