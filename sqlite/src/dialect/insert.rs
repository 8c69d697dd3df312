//! `insert` compilation.

use std::sync::Arc;

use trellis_core::{Result, SQL, TrellisError};

use super::{Compiled, ReturningMapper, RowMapper, render_returning};
use crate::schema::Schema;
use crate::statement::{Returning, Values};

/// Compiles `insert into <table> (<cols>) values (...), ... [returning ...]`.
///
/// The first row's keys, in order, define the column list; every other row
/// must carry the same key set. A single empty row inserts `default values`.
pub fn insert(
    schema: &Arc<Schema>,
    table: &str,
    values: Option<&Values>,
    returning: Option<&Returning>,
) -> Result<Compiled> {
    let table = schema.table(table)?;
    let rows = match values {
        Some(values) if !values.rows().is_empty() => values.rows(),
        _ => return Err(TrellisError::MissingValues(table.name().to_string())),
    };

    let keys: Vec<&String> = rows[0].keys().collect();
    let columns = keys
        .iter()
        .map(|key| table.try_column(key))
        .collect::<Result<Vec<_>>>()?;

    let mut sql = SQL::raw(format!("insert into {}", table.original_name()));

    if columns.is_empty() {
        if rows.len() > 1 || rows.iter().any(|row| !row.is_empty()) {
            return Err(TrellisError::InvalidStatement(format!(
                "insert into \"{}\" mixes empty and non-empty rows",
                table.name()
            )));
        }
        sql = sql.append_raw("default values");
    } else {
        let names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
        sql = sql.append_raw(format!("({}) values", names.join(", ")));

        let mut tuples = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != keys.len() || !keys.iter().all(|key| row.contains_key(key.as_str())) {
                return Err(TrellisError::InvalidStatement(format!(
                    "insert into \"{}\": row {index} does not share the key set of row 0",
                    table.name()
                )));
            }
            let params = keys
                .iter()
                .zip(&columns)
                .map(|(key, column)| column.encode(&row[key.as_str()]))
                .collect::<Result<Vec<_>>>()?;
            tuples.push(SQL::parameters(params));
        }
        sql = sql.append(SQL::join(tuples, ", "));
    }

    if let Some(returning) = returning {
        sql = sql.append(render_returning(table, returning)?);
    }

    let mapper = RowMapper::Returning(ReturningMapper {
        table: table.clone(),
    });
    Ok(Compiled::new(sql, mapper))
}
