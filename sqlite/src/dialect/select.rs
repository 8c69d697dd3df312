//! `select` compilation.

use std::sync::Arc;

use trellis_core::{Result, SQL, TrellisError};

use super::{Compiled, Fields, RowMapper, SelectMapper, quote, render_filter};
use crate::schema::Schema;
use crate::statement::{GroupBy, Include, Join, JoinKind, Map, MapNode, OrderBy, Where};
use crate::table::Table;

/// Accumulated select configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectState {
    pub joins: Vec<Join>,
    pub map: Option<Map>,
    pub include: Option<Include>,
    pub r#where: Option<Where>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Where>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// The default projection: every column as `<table>.<column>`.
fn default_map(prefix: &str, table: &Table) -> Map {
    table.columns().iter().fold(Map::new(), |map, column| {
        map.field(
            column.logical_name(),
            format!("{prefix}.{}", column.logical_name()),
        )
    })
}

/// Compiles a select against the table registered as `table`.
///
/// Clause order: `select <fields, includes> from <table> [join ...] [where]
/// [group by] [having] [order by] [limit ?] [offset ?]`.
pub fn select(schema: &Arc<Schema>, table: &str, state: &SelectState) -> Result<Compiled> {
    let base = schema.table(table)?;
    let mut fields = Fields::for_select(base);
    let mut map = default_map(base.name(), base);

    let mut joins = SQL::empty();
    for join in &state.joins {
        joins = joins.append(render_join(schema, &mut fields, &mut map, join)?);
    }
    let map = state.map.clone().unwrap_or(map);

    let mut projection: Vec<(String, String)> = Vec::new();
    collect_projection(&fields, &map, &mut projection)?;
    let mut items: Vec<SQL> = projection
        .iter()
        .map(|(alias, sql)| SQL::raw(format!("{sql} as {}", quote(alias))))
        .collect();

    let include = state.include.clone().unwrap_or_default();
    let mut aliases = 0;
    for (key, nested) in include.iter() {
        let relation = schema.relation(base.name(), key)?;
        items.push(
            relation
                .render(schema, base.original_name(), nested, &mut aliases)?
                .append_raw(format!("as {}", quote(key))),
        );
    }

    if items.is_empty() {
        return Err(TrellisError::InvalidStatement(format!(
            "select from \"{}\" projects nothing",
            base.name()
        )));
    }

    let mut sql = SQL::raw("select")
        .append(SQL::join(items, ", "))
        .append_raw(format!("from {}", base.original_name()))
        .append(joins);

    if let Some(filter) = &state.r#where {
        let filter = render_filter(&fields, filter)?;
        if !filter.is_empty() {
            sql = sql.append_raw("where").append(filter);
        }
    }

    if let Some(GroupBy(keys)) = &state.group_by {
        if !keys.is_empty() {
            let keys: Vec<String> = keys.iter().map(|k| quote(k)).collect();
            sql = sql.append_raw(format!("group by {}", keys.join(", ")));
        }
    }

    if let Some(having) = &state.having {
        let having = render_filter(&fields, having)?;
        if !having.is_empty() {
            sql = sql.append_raw("having").append(having);
        }
    }

    if let Some(OrderBy(keys)) = &state.order_by {
        if !keys.is_empty() {
            let keys: Vec<String> = keys
                .iter()
                .map(|(k, order)| format!("{} {}", quote(k), order.as_sql()))
                .collect();
            sql = sql.append_raw(format!("order by {}", keys.join(", ")));
        }
    }

    let limit = state.limit.filter(|l| *l >= 0);
    let offset = state.offset.filter(|o| *o >= 0);
    match (limit, offset) {
        (Some(limit), _) => sql = sql.append_raw("limit").append(SQL::parameter(limit)),
        (None, Some(_)) => sql = sql.append_raw("limit -1"),
        (None, None) => {}
    }
    if let Some(offset) = offset {
        sql = sql.append_raw("offset").append(SQL::parameter(offset));
    }

    let mapper = RowMapper::Select(SelectMapper {
        schema: Arc::clone(schema),
        table: base.name().to_string(),
        fields,
        map,
        include,
    });
    Ok(Compiled::new(sql, mapper))
}

fn render_join(
    schema: &Schema,
    fields: &mut Fields,
    map: &mut Map,
    join: &Join,
) -> Result<SQL> {
    let table = schema.table(&join.table)?;
    let Some((column, operator, field)) = &join.condition else {
        return Err(TrellisError::InvalidStatement(format!(
            "join \"{}\" has no condition",
            join.alias
        )));
    };
    if operator.is_set() {
        return Err(TrellisError::InvalidStatement(format!(
            "join \"{}\" cannot use {operator}",
            join.alias
        )));
    }
    if map.get(&join.alias).is_some() {
        return Err(TrellisError::InvalidStatement(format!(
            "join alias \"{}\" is already in use",
            join.alias
        )));
    }

    let column = table.try_column(column)?;
    let other = fields.resolve(field)?.sql.clone();
    let keyword = match join.kind {
        JoinKind::Inner => "join",
        JoinKind::Left => "left join",
    };
    let alias = quote(&join.alias);
    let sql = SQL::raw(format!(
        "{keyword} {} as {alias} on {alias}.{} {operator} {other}",
        table.original_name(),
        column.name(),
    ));

    fields.add(&join.alias, &alias, table);
    map.insert(
        join.alias.clone(),
        MapNode::Nested(default_map(&join.alias, table)),
    );
    Ok(sql)
}

/// Flattens the map tree into `(alias, sql)` select items, first occurrence wins.
fn collect_projection(fields: &Fields, map: &Map, out: &mut Vec<(String, String)>) -> Result<()> {
    for (_, node) in map.iter() {
        let (alias, sql) = match node {
            MapNode::Field(key) => (key.clone(), fields.resolve(key)?.sql.clone()),
            MapNode::Raw(expression) => (expression.clone(), expression.clone()),
            MapNode::Nested(nested) => {
                collect_projection(fields, nested, out)?;
                continue;
            }
        };
        if !out.iter().any(|(a, _)| *a == alias) {
            out.push((alias, sql));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::fixtures;
    use crate::statement::Operator;
    use serde_json::json;
    use trellis_core::SQLiteValue;

    #[test]
    fn default_projection_uses_field_keys_as_aliases() {
        let schema = fixtures::schema();
        let compiled = select(&schema, "roles", &SelectState::default()).unwrap();

        assert_eq!(
            compiled.sql,
            "select roles.id as \"roles.id\", roles.name as \"roles.name\" from roles"
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn clauses_render_in_order_with_bound_pagination() {
        let schema = fixtures::schema();
        let state = SelectState {
            map: Some(
                Map::new()
                    .field("roleId", "users.roleId")
                    .raw("total", "count(*)"),
            ),
            r#where: Some(Where::eq("isActive", true)),
            group_by: Some(GroupBy::new().key("users.roleId")),
            having: Some(Where::gt("users.id", 0)),
            order_by: Some(OrderBy::new().desc("count(*)")),
            limit: Some(10),
            offset: Some(20),
            ..Default::default()
        };
        let compiled = select(&schema, "users", &state).unwrap();

        assert_eq!(
            compiled.sql,
            "select app_users.role_id as \"users.roleId\", count(*) as \"count(*)\" from app_users \
             where app_users.is_active = ? group by \"users.roleId\" having app_users.id > ? \
             order by \"count(*)\" desc limit ? offset ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                SQLiteValue::Integer(1),
                SQLiteValue::Integer(0),
                SQLiteValue::Integer(10),
                SQLiteValue::Integer(20),
            ]
        );
    }

    #[test]
    fn aliases_are_quoted_identifiers() {
        let schema = fixtures::schema();
        let state = SelectState {
            map: Some(
                Map::new()
                    .raw("first", "json_extract('[7]', '$[0]')")
                    .field("odd", "roles.name"),
            ),
            order_by: Some(OrderBy::new().asc("json_extract('[7]', '$[0]')")),
            ..Default::default()
        };
        let compiled = select(&schema, "roles", &state).unwrap();

        assert_eq!(
            compiled.sql,
            "select json_extract('[7]', '$[0]') as \"json_extract('[7]', '$[0]')\", \
             roles.name as \"roles.name\" from roles \
             order by \"json_extract('[7]', '$[0]')\" asc"
        );
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn offset_without_limit() {
        let schema = fixtures::schema();
        let state = SelectState {
            limit: Some(-1),
            offset: Some(5),
            ..Default::default()
        };
        let compiled = select(&schema, "roles", &state).unwrap();

        assert!(compiled.sql.ends_with("from roles limit -1 offset ?"));
        assert_eq!(compiled.params, vec![SQLiteValue::Integer(5)]);
    }

    #[test]
    fn joins_extend_fields_and_default_map() {
        let schema = fixtures::schema();
        let state = SelectState {
            joins: vec![Join::left("roles", "role").on("id", Operator::Eq, "users.roleId")],
            r#where: Some(Where::eq("role.name", "admin")),
            ..Default::default()
        };
        let compiled = select(&schema, "users", &state).unwrap();

        assert!(compiled.sql.contains(
            "\"role\".id as \"role.id\", \"role\".name as \"role.name\" from app_users \
             left join roles as \"role\" on \"role\".id = app_users.role_id \
             where \"role\".name = ?"
        ));
        assert_eq!(compiled.params, vec![SQLiteValue::from("admin")]);
    }

    #[test]
    fn one_include_correlates_with_the_base_table() {
        let schema = fixtures::schema();
        let state = SelectState {
            map: Some(Map::new().field("id", "posts.id")),
            include: Some(Include::new().relation("author")),
            ..Default::default()
        };
        let compiled = select(&schema, "posts", &state).unwrap();

        assert_eq!(
            compiled.sql,
            "select posts.id as \"posts.id\", (select json_object('id', r1.id, 'email', r1.email, \
             'name', r1.name, 'roleId', r1.role_id, 'isActive', r1.is_active) from app_users as r1 \
             where r1.id = posts.author_id) as \"author\" from posts"
        );
    }

    #[test]
    fn nested_many_include_binds_limits_in_text_order() {
        let schema = fixtures::schema();
        let include = Include::from_json(&json!({
            "posts": {"limit": 3, "comments": {"limit": 2}}
        }))
        .unwrap();
        let state = SelectState {
            map: Some(Map::new().field("id", "users.id")),
            include: Some(include),
            r#where: Some(Where::eq("id", 7)),
            ..Default::default()
        };
        let compiled = select(&schema, "users", &state).unwrap();

        assert_eq!(
            compiled.sql,
            "select app_users.id as \"users.id\", (select json_group_array(json_object('id', r1.id, \
             'authorId', r1.author_id, 'title', r1.title, 'createdAt', r1.created_at, \
             'comments', json((select json_group_array(json_object('id', r2.id, 'postId', r2.post_id, \
             'body', r2.body)) from (select * from comments as r2 where r2.post_id = r1.id limit ?) as r2)))) \
             from (select * from posts as r1 where r1.author_id = app_users.id limit ?) as r1) as \"posts\" \
             from app_users where app_users.id = ?"
        );
        assert_eq!(
            compiled.params,
            vec![
                SQLiteValue::Integer(2),
                SQLiteValue::Integer(3),
                SQLiteValue::Integer(7)
            ]
        );
    }

    #[test]
    fn include_errors() {
        let schema = fixtures::schema();
        let unknown = SelectState {
            include: Some(Include::new().relation("followers")),
            ..Default::default()
        };
        assert!(matches!(
            select(&schema, "users", &unknown),
            Err(TrellisError::RelationNotFound { .. })
        ));

        let no_group = SelectState {
            include: Some(Include::new().relation("users")),
            ..Default::default()
        };
        assert!(matches!(
            select(&schema, "roles", &no_group),
            Err(TrellisError::RelationNotFound { .. })
        ));
        assert!(matches!(
            select(&schema, "tags", &SelectState::default()),
            Err(TrellisError::TableNotFound(_))
        ));
    }
}
