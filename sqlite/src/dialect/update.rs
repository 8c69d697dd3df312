//! `update` compilation.

use std::sync::Arc;

use trellis_core::{Result, SQL, TrellisError};

use super::{Compiled, Fields, ReturningMapper, RowMapper, render_filter, render_returning};
use crate::schema::Schema;
use crate::statement::{Returning, Sets, Where};

/// Compiles `update <table> set <col> = ?, ... [where ...] [returning ...]`.
///
/// Keys absent from `sets` are left untouched.
pub fn update(
    schema: &Arc<Schema>,
    table: &str,
    sets: Option<&Sets>,
    filter: Option<&Where>,
    returning: Option<&Returning>,
) -> Result<Compiled> {
    let table = schema.table(table)?;
    let sets = match sets {
        Some(Sets(sets)) if !sets.is_empty() => sets,
        _ => return Err(TrellisError::MissingSets(table.name().to_string())),
    };

    let assignments = sets
        .iter()
        .map(|(key, value)| {
            let column = table.try_column(key)?;
            Ok(SQL::raw(format!("{} =", column.name())).append(SQL::parameter(column.encode(value)?)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut sql = SQL::raw(format!("update {} set", table.original_name()))
        .append(SQL::join(assignments, ", "));

    if let Some(filter) = filter {
        let filter = render_filter(&Fields::for_mutation(table), filter)?;
        if !filter.is_empty() {
            sql = sql.append_raw("where").append(filter);
        }
    }

    if let Some(returning) = returning {
        sql = sql.append(render_returning(table, returning)?);
    }

    let mapper = RowMapper::Returning(ReturningMapper {
        table: table.clone(),
    });
    Ok(Compiled::new(sql, mapper))
}
