//! `delete` compilation.

use std::sync::Arc;

use trellis_core::{Result, SQL};

use super::{Compiled, Fields, ReturningMapper, RowMapper, render_filter, render_returning};
use crate::schema::Schema;
use crate::statement::{Returning, Where};

/// Compiles `delete from <table> [where ...] [returning ...]`.
pub fn delete(
    schema: &Arc<Schema>,
    table: &str,
    filter: Option<&Where>,
    returning: Option<&Returning>,
) -> Result<Compiled> {
    let table = schema.table(table)?;
    let mut sql = SQL::raw(format!("delete from {}", table.original_name()));

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
