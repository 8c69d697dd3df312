//! Declarative relations between tables.
//!
//! Relations reference tables by physical name and columns by logical name;
//! the [`Schema`] resolves both. A `many` relation carries no join keys when
//! declared. Schema assembly copies them from the matching `one` relation on
//! the opposite table.

use serde_json::{Map as JsonMap, Value as JsonValue};
use trellis_core::{Result, SQL, TrellisError};

use crate::schema::Schema;
use crate::statement::Include;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Embeds a single object (or null)
    One,
    /// Embeds an array of objects
    Many,
}

/// A directional link from a source table to a referenced table.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub(crate) kind: RelationKind,
    pub(crate) source_table: String,
    pub(crate) referenced_table: String,
    pub(crate) source_fields: Vec<String>,
    pub(crate) referenced_fields: Vec<String>,
    pub(crate) identifier: Option<String>,
}

impl Relation {
    #[inline]
    pub const fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Physical name of the declaring table.
    #[inline]
    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    /// Physical name of the embedded table.
    #[inline]
    pub fn referenced_table(&self) -> &str {
        &self.referenced_table
    }

    /// Join keys on the source side, by logical column name.
    #[inline]
    pub fn source_fields(&self) -> &[String] {
        &self.source_fields
    }

    /// Join keys on the referenced side, by logical column name.
    #[inline]
    pub fn referenced_fields(&self) -> &[String] {
        &self.referenced_fields
    }

    #[inline]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Tags the relation so a `many` relation can pick among several
    /// structurally matching `one` relations.
    pub fn identified_by(&mut self, identifier: impl Into<String>) -> &mut Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Whether the embedded value may be null.
    ///
    /// A `one` relation is guaranteed non-null only when every source field
    /// is `not null` and itself references the embedded table. `many`
    /// relations always embed an array.
    pub fn is_optional(&self, schema: &Schema) -> bool {
        if self.kind == RelationKind::Many {
            return false;
        }
        let Ok(source) = schema.table_by_physical(&self.source_table) else {
            return true;
        };
        !self.source_fields.iter().all(|field| {
            source.column(field).is_some_and(|column| {
                column.is_not_null()
                    && column
                        .references()
                        .is_some_and(|r| r.targets(&self.referenced_table))
            })
        })
    }

    /// Renders the correlated subquery embedding this relation.
    ///
    /// `parent` is the SQL name the source row is visible under: the base
    /// table at the top level, the enclosing relation's alias when nested.
    /// Referenced tables are aliased `r1`, `r2`, ... in rendering order.
    pub(crate) fn render(
        &self,
        schema: &Schema,
        parent: &str,
        include: &Include,
        aliases: &mut usize,
    ) -> Result<SQL> {
        let source = schema.table_by_physical(&self.source_table)?;
        let referenced = schema.table_by_physical(&self.referenced_table)?;

        *aliases += 1;
        let alias = format!("r{aliases}");

        let mut properties: Vec<SQL> = referenced
            .columns()
            .iter()
            .map(|c| {
                SQL::raw(format!(
                    "'{}', {}",
                    c.logical_name(),
                    c.json_expression(&alias)
                ))
            })
            .collect();
        for (key, nested) in include.iter() {
            let relation = schema.relation(referenced.name(), key)?;
            let mut property = SQL::raw(format!("'{key}', json("));
            property.push(relation.render(schema, &alias, nested, aliases)?);
            property.push_raw(")");
            properties.push(property);
        }
        let mut object = SQL::raw("json_object(");
        object.push(SQL::join(properties, ", "));
        object.push_raw(")");

        let condition = self.correlation(source, referenced, parent, &alias)?;

        let sql = match self.kind {
            RelationKind::One => SQL::raw("select")
                .append(object)
                .append_raw(format!(
                    "from {} as {alias} where {condition}",
                    referenced.original_name()
                )),
            RelationKind::Many => {
                let mut rows = SQL::raw(format!(
                    "select * from {} as {alias} where {condition}",
                    referenced.original_name()
                ));
                if let Some(limit) = include.limit_value() {
                    rows = rows.append_raw("limit").append(SQL::parameter(limit));
                }
                let mut aggregate = SQL::raw("json_group_array(");
                aggregate.push(object);
                aggregate.push_raw(")");
                SQL::raw("select")
                    .append(aggregate)
                    .append_raw("from")
                    .append(rows.parens())
                    .append_raw(format!("as {alias}"))
            }
        };
        Ok(sql.parens())
    }

    fn correlation(
        &self,
        source: &Table,
        referenced: &Table,
        parent: &str,
        alias: &str,
    ) -> Result<String> {
        let pairs = self
            .source_fields
            .iter()
            .zip(&self.referenced_fields)
            .map(|(source_field, referenced_field)| {
                let source_column = source.try_column(source_field)?;
                let referenced_column = referenced.try_column(referenced_field)?;
                Ok(format!(
                    "{alias}.{} = {parent}.{}",
                    referenced_column.name(),
                    source_column.name()
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(pairs.join(" and "))
    }

    /// Rebuilds nested result data from the JSON payload of [`Relation::render`].
    ///
    /// The payload arrives as JSON text at the top level and as JSON when
    /// nested; both are accepted.
    pub(crate) fn decode(
        &self,
        schema: &Schema,
        include: &Include,
        payload: JsonValue,
    ) -> Result<JsonValue> {
        let payload = match payload {
            JsonValue::String(text) => serde_json::from_str(&text)?,
            other => other,
        };
        let referenced = schema.table_by_physical(&self.referenced_table)?;

        match (self.kind, payload) {
            (RelationKind::One, JsonValue::Object(object)) => {
                decode_object(schema, referenced, include, object).map(JsonValue::Object)
            }
            (RelationKind::One, _) => Ok(JsonValue::Null),
            (RelationKind::Many, JsonValue::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::Object(object) => {
                        decode_object(schema, referenced, include, object).map(JsonValue::Object)
                    }
                    other => Err(TrellisError::Mapping(format!(
                        "expected an object in relation payload, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array),
            (RelationKind::Many, _) => Ok(JsonValue::Array(Vec::new())),
        }
    }
}

fn decode_object(
    schema: &Schema,
    table: &Table,
    include: &Include,
    object: JsonMap<String, JsonValue>,
) -> Result<JsonMap<String, JsonValue>> {
    let mut decoded = JsonMap::with_capacity(object.len());
    for (key, value) in object {
        let value = if let Some(column) = table.column(&key) {
            column.decode_json(value)?
        } else if let Some(nested) = include.get(&key) {
            schema
                .relation(table.name(), &key)?
                .decode(schema, nested, value)?
        } else {
            value
        };
        decoded.insert(key, value);
    }
    Ok(decoded)
}

/// The relations declared for one source table, keyed by relation name.
#[derive(Debug, Clone, PartialEq)]
pub struct Relations {
    pub(crate) table: String,
    pub(crate) fields: Vec<(String, Relation)>,
}

impl Relations {
    /// Physical name of the source table.
    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.fields.iter().map(|(k, r)| (k.as_str(), r))
    }
}

/// Collects relations for [`relations`].
#[derive(Debug)]
pub struct RelationsBuilder {
    table: String,
    fields: Vec<(String, Relation)>,
}

impl RelationsBuilder {
    fn push(&mut self, name: &str, relation: Relation) -> &mut Relation {
        self.fields.retain(|(k, _)| k != name);
        self.fields.push((name.to_string(), relation));
        let last = self.fields.len() - 1;
        &mut self.fields[last].1
    }

    /// Declares a `one` relation joined on `fields` (logical columns of the
    /// source table) equal to `references` (logical columns of `referenced`).
    pub fn one(
        &mut self,
        name: &str,
        referenced: &Table,
        fields: &[&str],
        references: &[&str],
    ) -> &mut Relation {
        let relation = Relation {
            kind: RelationKind::One,
            source_table: self.table.clone(),
            referenced_table: referenced.original_name().to_string(),
            source_fields: fields.iter().map(|f| f.to_string()).collect(),
            referenced_fields: references.iter().map(|f| f.to_string()).collect(),
            identifier: None,
        };
        self.push(name, relation)
    }

    /// Declares a `many` relation; its join keys come from the matching `one`
    /// relation declared on `referenced`.
    pub fn many(&mut self, name: &str, referenced: &Table) -> &mut Relation {
        let relation = Relation {
            kind: RelationKind::Many,
            source_table: self.table.clone(),
            referenced_table: referenced.original_name().to_string(),
            source_fields: Vec::new(),
            referenced_fields: Vec::new(),
            identifier: None,
        };
        self.push(name, relation)
    }
}

/// Declares the relations of `table`.
///
/// ```
/// use trellis_sqlite::columns::{integer, text};
/// use trellis_sqlite::{relations, sqlite_table};
///
/// let users = sqlite_table("users", |t| {
///     t.column("id", integer("id").primary_key());
/// })
/// .unwrap();
/// let posts = sqlite_table("posts", |t| {
///     t.column("id", integer("id").primary_key());
///     t.column("authorId", integer("author_id").not_null().references("users", "id"));
///     t.column("title", text("title"));
/// })
/// .unwrap();
///
/// let posts_relations = relations(&posts, |r| {
///     r.one("author", &users, &["authorId"], &["id"]);
/// });
/// assert!(posts_relations.get("author").is_some());
/// ```
pub fn relations(table: &Table, define: impl FnOnce(&mut RelationsBuilder)) -> Relations {
    let mut builder = RelationsBuilder {
        table: table.original_name().to_string(),
        fields: Vec::new(),
    };
    define(&mut builder);
    Relations {
        table: builder.table,
        fields: builder.fields,
    }
}
