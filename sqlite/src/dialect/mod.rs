//! The SQL compiler.
//!
//! Each statement kind compiles its descriptors into SQL text, the positional
//! parameters in placeholder order and a [`RowMapper`] that reshapes raw rows
//! into the declared output. Compilation is pure; nothing here touches the
//! store.

use std::sync::Arc;

use hashbrown::HashMap;
use serde_json::{Map as JsonMap, Value as JsonValue};
use trellis_core::{Result, Row, SQL, SQLiteValue, TrellisError};

use crate::columns::Column;
use crate::schema::Schema;
use crate::statement::{Include, Map, MapNode, Operator, Returning, Where};
use crate::table::Table;

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use select::SelectState;

/// Output of compilation.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub sql: String,
    pub params: Vec<SQLiteValue>,
    pub mapper: RowMapper,
}

impl Compiled {
    fn new(sql: SQL, mapper: RowMapper) -> Self {
        let (sql, params) = sql.into_parts();
        Self {
            sql,
            params,
            mapper,
        }
    }
}

/// A field addressable by filters and maps.
#[derive(Debug, Clone)]
pub(crate) struct Field {
    sql: String,
    column: Column,
}

/// Field keys available to a statement.
///
/// Selects address `<table>.<column>` (logical names) and
/// `<alias>.<column>` for joins; bare column names fall back to the base
/// table. Mutations address bare logical column names.
#[derive(Debug, Clone, Default)]
pub(crate) struct Fields {
    base: Option<String>,
    entries: HashMap<String, Field>,
}

impl Fields {
    pub(crate) fn for_select(table: &Table) -> Self {
        let mut fields = Fields {
            base: Some(table.name().to_string()),
            entries: HashMap::with_capacity(table.columns().len()),
        };
        fields.add(table.name(), table.original_name(), table);
        fields
    }

    pub(crate) fn for_mutation(table: &Table) -> Self {
        let entries = table
            .columns()
            .iter()
            .map(|column| {
                (
                    column.logical_name().to_string(),
                    Field {
                        sql: column.name().to_string(),
                        column: column.clone(),
                    },
                )
            })
            .collect();
        Fields {
            base: None,
            entries,
        }
    }

    /// Registers `table`'s columns as `<prefix>.<column>` rendered against `sql_name`.
    pub(crate) fn add(&mut self, prefix: &str, sql_name: &str, table: &Table) {
        for column in table.columns() {
            self.entries.insert(
                format!("{prefix}.{}", column.logical_name()),
                Field {
                    sql: format!("{sql_name}.{}", column.name()),
                    column: column.clone(),
                },
            );
        }
    }

    pub(crate) fn resolve(&self, key: &str) -> Result<&Field> {
        if let Some(field) = self.entries.get(key) {
            return Ok(field);
        }
        if let Some(base) = self.base.as_deref().filter(|_| !key.contains('.')) {
            if let Some(field) = self.entries.get(&format!("{base}.{key}")) {
                return Ok(field);
            }
        }
        Err(TrellisError::ColumnNotFound(key.to_string()))
    }
}

/// Renders a filter tree. Nested groups with more than one rendered child
/// are parenthesized; empty groups render nothing.
pub(crate) fn render_filter(fields: &Fields, filter: &Where) -> Result<SQL> {
    render_filter_inner(fields, filter, false)
}

fn render_filter_inner(fields: &Fields, filter: &Where, nested: bool) -> Result<SQL> {
    let (children, separator) = match filter {
        Where::And(children) => (children, " and "),
        Where::Or(children) => (children, " or "),
        Where::Cond {
            field,
            operator,
            value,
        } => return render_condition(fields, field, *operator, value),
    };

    let parts = children
        .iter()
        .map(|child| render_filter_inner(fields, child, true))
        .filter(|part| !matches!(part, Ok(sql) if sql.is_empty()))
        .collect::<Result<Vec<_>>>()?;

    let grouped = nested && parts.len() > 1;
    let joined = SQL::join(parts, separator);
    Ok(if grouped { joined.parens() } else { joined })
}

fn render_condition(
    fields: &Fields,
    key: &str,
    operator: Operator,
    value: &JsonValue,
) -> Result<SQL> {
    let field = fields.resolve(key)?;

    match (operator, value) {
        (Operator::Eq, JsonValue::Null) => Ok(SQL::raw(format!("{} is null", field.sql))),
        (Operator::Ne, JsonValue::Null) => Ok(SQL::raw(format!("{} is not null", field.sql))),
        (Operator::In | Operator::NotIn, JsonValue::Array(items)) => {
            let params = items
                .iter()
                .map(|item| field.column.encode(item))
                .collect::<Result<Vec<_>>>()?;
            Ok(SQL::raw(format!("{} {operator}", field.sql)).append(SQL::parameters(params)))
        }
        (Operator::In | Operator::NotIn, other) => Err(TrellisError::InvalidStatement(format!(
            "\"{key}\" {operator} needs an array, got {other}"
        ))),
        (operator, value) => Ok(SQL::raw(format!("{} {operator}", field.sql))
            .append(SQL::parameter(field.column.encode(value)?))),
    }
}

/// Quotes an identifier or alias, doubling embedded quotes.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Renders `returning <col> as "<key>", ...`.
pub(crate) fn render_returning(table: &Table, returning: &Returning) -> Result<SQL> {
    if returning.0.is_empty() {
        return Err(TrellisError::InvalidStatement(format!(
            "empty returning projection for \"{}\"",
            table.name()
        )));
    }
    let columns = returning
        .0
        .iter()
        .map(|key| {
            table
                .try_column(key)
                .map(|column| format!("{} as {}", column.name(), quote(key)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SQL::raw("returning").append_raw(columns.join(", ")))
}

/// Reshapes raw rows into the declared output.
#[derive(Debug, Clone)]
pub enum RowMapper {
    Select(SelectMapper),
    Returning(ReturningMapper),
}

impl RowMapper {
    pub fn map_row(&self, row: Row) -> Result<JsonValue> {
        match self {
            RowMapper::Select(mapper) => mapper.map_row(&row),
            RowMapper::Returning(mapper) => mapper.map_row(row),
        }
    }

    pub fn map_rows(&self, rows: Vec<Row>) -> Result<Vec<JsonValue>> {
        rows.into_iter().map(|row| self.map_row(row)).collect()
    }
}

/// Applies a select's map tree and decodes its included relations.
#[derive(Debug, Clone)]
pub struct SelectMapper {
    schema: Arc<Schema>,
    table: String,
    fields: Fields,
    map: Map,
    include: Include,
}

impl SelectMapper {
    fn map_row(&self, row: &Row) -> Result<JsonValue> {
        let mut object = self.map_node(&self.map, row)?;

        for (key, include) in self.include.iter() {
            let relation = self.schema.relation(&self.table, key)?;
            let payload = row.get(key).cloned().unwrap_or_default().into_json();
            object.insert(
                key.to_string(),
                relation.decode(&self.schema, include, payload)?,
            );
        }
        Ok(JsonValue::Object(object))
    }

    fn map_node(&self, map: &Map, row: &Row) -> Result<JsonMap<String, JsonValue>> {
        let mut object = JsonMap::new();
        for (key, node) in map.iter() {
            let value = match node {
                MapNode::Field(field) => {
                    let value = row_value(row, field)?;
                    self.fields.resolve(field)?.column.decode(value)?
                }
                MapNode::Raw(expression) => row_value(row, expression)?.into_json(),
                MapNode::Nested(nested) => JsonValue::Object(self.map_node(nested, row)?),
            };
            object.insert(key.to_string(), value);
        }
        Ok(object)
    }
}

fn row_value(row: &Row, column: &str) -> Result<SQLiteValue> {
    row.get(column)
        .cloned()
        .ok_or_else(|| TrellisError::Mapping(format!("column \"{column}\" missing from row")))
}

/// Decodes `returning` rows by logical column name.
#[derive(Debug, Clone)]
pub struct ReturningMapper {
    table: Table,
}

impl ReturningMapper {
    fn map_row(&self, row: Row) -> Result<JsonValue> {
        let mut object = JsonMap::with_capacity(row.len());
        for (key, value) in row.into_pairs() {
            let value = match self.table.column(&key) {
                Some(column) => column.decode(value)?,
                None => value.into_json(),
            };
            object.insert(key, value);
        }
        Ok(JsonValue::Object(object))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared schema for dialect tests: users, posts, comments, roles.

    use std::sync::Arc;

    use crate::columns::{boolean, date, integer, text};
    use crate::relations::relations;
    use crate::schema::Schema;
    use crate::table::sqlite_table;

    pub(crate) fn schema() -> Arc<Schema> {
        let roles = sqlite_table("roles", |t| {
            t.column("id", integer("id").primary_key());
            t.column("name", text("name").not_null());
        })
        .unwrap();
        let users = sqlite_table("app_users", |t| {
            t.column("id", integer("id").primary_key());
            t.column("email", text("email").unique().not_null());
            t.column("name", text("name"));
            t.column("roleId", integer("role_id").references("roles", "id"));
            t.column("isActive", boolean("is_active").default(true));
        })
        .unwrap();
        let posts = sqlite_table("posts", |t| {
            t.column("id", integer("id").primary_key());
            t.column("authorId", integer("author_id").not_null().references("app_users", "id"));
            t.column("title", text("title").not_null());
            t.column("createdAt", date("created_at"));
        })
        .unwrap();
        let comments = sqlite_table("comments", |t| {
            t.column("id", integer("id").primary_key());
            t.column("postId", integer("post_id").not_null().references("posts", "id"));
            t.column("body", text("body"));
        })
        .unwrap();

        let schema = Schema::builder()
            .table("roles", roles.clone())
            .table("users", users.clone())
            .table("posts", posts.clone())
            .table("comments", comments.clone())
            .relations("usersRelations", relations(&users, |r| {
                r.many("posts", &posts);
                r.one("role", &roles, &["roleId"], &["id"]);
            }))
            .relations("postsRelations", relations(&posts, |r| {
                r.one("author", &users, &["authorId"], &["id"]);
                r.many("comments", &comments);
            }))
            .relations("commentsRelations", relations(&comments, |r| {
                r.one("post", &posts, &["postId"], &["id"]);
            }))
            .build()
            .unwrap();
        Arc::new(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_fields() -> Fields {
        let schema = fixtures::schema();
        Fields::for_select(schema.table("users").unwrap())
    }

    #[test]
    fn in_expands_one_parameter_per_element() {
        let fields = user_fields();
        let filter = Where::from_json(&json!({"name": {"$in": ["A", "B"]}})).unwrap();
        let sql = render_filter(&fields, &filter).unwrap();

        assert_eq!(sql.sql(), "app_users.name in (?, ?)");
        assert_eq!(sql.params(), &[SQLiteValue::from("A"), SQLiteValue::from("B")]);
    }

    #[test]
    fn in_parameter_order_is_independent_of_depth() {
        let fields = user_fields();
        let filter = Where::from_json(&json!({
            "users.email": {"$like": "%@x.com"},
            "$or": [
                {"users.id": {">": 10}},
                {"$and": {"name": {"$in": ["A", "B"]}, "users.isActive": {"==": true}}}
            ]
        }))
        .unwrap();
        let sql = render_filter(&fields, &filter).unwrap();

        assert_eq!(
            sql.sql(),
            "app_users.email like ? and (app_users.id > ? or \
             (app_users.name in (?, ?) and app_users.is_active = ?))"
        );
        assert_eq!(
            sql.params(),
            &[
                SQLiteValue::from("%@x.com"),
                SQLiteValue::Integer(10),
                SQLiteValue::from("A"),
                SQLiteValue::from("B"),
                SQLiteValue::Integer(1),
            ]
        );
    }

    #[test]
    fn explicit_and_matches_implicit_and() {
        let fields = user_fields();
        let tree = json!({"name": {"==": "A"}, "users.id": {"<": 3}});
        let implicit = render_filter(&fields, &Where::from_json(&tree).unwrap()).unwrap();
        let explicit =
            render_filter(&fields, &Where::from_json(&json!({"$and": tree})).unwrap()).unwrap();

        assert_eq!(implicit.params(), explicit.params());
        assert_eq!(implicit.sql(), "app_users.name = ? and app_users.id < ?");
        assert_eq!(explicit.sql(), implicit.sql());
    }

    #[test]
    fn null_comparisons_bind_nothing() {
        let fields = user_fields();
        let filter = Where::eq("name", JsonValue::Null).and(Where::ne("roleId", JsonValue::Null));
        let sql = render_filter(&fields, &filter).unwrap();

        assert_eq!(
            sql.sql(),
            "app_users.name is null and app_users.role_id is not null"
        );
        assert!(sql.params().is_empty());
    }

    #[test]
    fn empty_groups_render_nothing() {
        let fields = user_fields();
        let filter = Where::all([Where::any([]), Where::eq("id", 1)]);
        assert_eq!(render_filter(&fields, &filter).unwrap().sql(), "app_users.id = ?");
        assert!(render_filter(&fields, &Where::default()).unwrap().is_empty());
    }

    #[test]
    fn unknown_fields_are_reported() {
        let fields = user_fields();
        assert!(matches!(
            render_filter(&fields, &Where::eq("nickname", "x")),
            Err(TrellisError::ColumnNotFound(_))
        ));
    }
}
