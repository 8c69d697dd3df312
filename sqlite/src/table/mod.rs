//! Table descriptors and the table builder.

use trellis_core::{Result, TrellisError};

use crate::columns::{Column, ColumnBuilder, ColumnType};

/// A composite `foreign key(...) references other(...)` constraint, by physical names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
}

/// Table-level constraints, by physical column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// A named, ordered set of columns.
///
/// `original_name` is the physical table name. `name` is the schema key the
/// table is registered under; it equals `original_name` until schema assembly
/// assigns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    original_name: String,
    columns: Vec<Column>,
    constraints: Constraints,
}

impl Table {
    /// Logical schema key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical table name.
    #[inline]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks a column up by logical name.
    pub fn column(&self, logical_name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.logical_name() == logical_name)
    }

    /// Looks a column up by logical name, failing with [`TrellisError::ColumnNotFound`].
    pub fn try_column(&self, logical_name: &str) -> Result<&Column> {
        self.column(logical_name).ok_or_else(|| {
            TrellisError::ColumnNotFound(format!("{}.{logical_name}", self.name))
        })
    }

    #[inline]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Renders `CREATE TABLE IF NOT EXISTS`.
    pub fn to_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::to_sql).collect();
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({}",
            self.original_name,
            columns.join(", ")
        );

        if !self.constraints.primary_key.is_empty() {
            sql.push_str(&format!(
                ", primary key({})",
                self.constraints.primary_key.join(", ")
            ));
        }
        for fk in &self.constraints.foreign_keys {
            sql.push_str(&format!(
                ", foreign key({}) references {}({})",
                fk.columns.join(", "),
                fk.foreign_table,
                fk.foreign_columns.join(", ")
            ));
        }

        sql.push(')');
        sql
    }
}

/// Collects columns and constraints for [`sqlite_table`].
///
/// Builder misuse is recorded and reported when the table is finalized, so
/// declarations read as a flat list of calls.
#[derive(Debug)]
pub struct TableBuilder {
    original_name: String,
    columns: Vec<Column>,
    constraints: Constraints,
    error: Option<TrellisError>,
}

impl TableBuilder {
    fn new(original_name: String) -> Self {
        Self {
            original_name,
            columns: Vec::new(),
            constraints: Constraints::default(),
            error: None,
        }
    }

    fn fail(&mut self, error: TrellisError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Adds a column under `logical_name`.
    pub fn column<K: ColumnType>(
        &mut self,
        logical_name: &str,
        builder: ColumnBuilder<K>,
    ) -> &mut Self {
        if self.columns.iter().any(|c| c.logical_name() == logical_name) {
            self.fail(TrellisError::Configuration(format!(
                "column \"{logical_name}\" declared twice in \"{}\"",
                self.original_name
            )));
            return self;
        }
        match builder.build(logical_name) {
            Ok(column) => self.columns.push(column),
            Err(e) => self.fail(e),
        }
        self
    }

    fn physical_names(&mut self, logical_names: &[&str], kind: &str) -> Option<Vec<String>> {
        if logical_names.is_empty() {
            self.fail(TrellisError::Configuration(format!(
                "empty {kind} in \"{}\"",
                self.original_name
            )));
            return None;
        }
        let mut names = Vec::with_capacity(logical_names.len());
        for logical in logical_names {
            match self.columns.iter().find(|c| c.logical_name() == *logical) {
                Some(column) => names.push(column.name().to_string()),
                None => {
                    self.fail(TrellisError::Configuration(format!(
                        "{kind} column \"{logical}\" is not declared in \"{}\"",
                        self.original_name
                    )));
                    return None;
                }
            }
        }
        Some(names)
    }

    /// Declares a composite primary key over already declared columns.
    pub fn primary_key(&mut self, columns: &[&str]) -> &mut Self {
        if let Some(names) = self.physical_names(columns, "primary key") {
            self.constraints.primary_key = names;
        }
        self
    }

    /// Declares a composite foreign key referencing `foreign_columns` of `table`.
    pub fn foreign_key(
        &mut self,
        columns: &[&str],
        table: &Table,
        foreign_columns: &[&str],
    ) -> &mut Self {
        let Some(names) = self.physical_names(columns, "foreign key") else {
            return self;
        };
        if columns.len() != foreign_columns.len() {
            self.fail(TrellisError::Configuration(format!(
                "foreign key in \"{}\" pairs {} columns with {}",
                self.original_name,
                columns.len(),
                foreign_columns.len()
            )));
            return self;
        }
        let foreign_names = foreign_columns
            .iter()
            .map(|logical| table.try_column(logical).map(|c| c.name().to_string()))
            .collect::<Result<Vec<_>>>();
        match foreign_names {
            Ok(foreign_names) => self.constraints.foreign_keys.push(ForeignKey {
                columns: names,
                foreign_table: table.original_name().to_string(),
                foreign_columns: foreign_names,
            }),
            Err(e) => self.fail(e),
        }
        self
    }

    fn build(self) -> Result<Table> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.columns.is_empty() {
            return Err(TrellisError::Configuration(format!(
                "table \"{}\" has no columns",
                self.original_name
            )));
        }
        Ok(Table {
            name: self.original_name.clone(),
            original_name: self.original_name,
            columns: self.columns,
            constraints: self.constraints,
        })
    }
}

/// Declares a table stored under `name`.
///
/// ```
/// use trellis_sqlite::columns::{integer, text};
/// use trellis_sqlite::sqlite_table;
///
/// let users = sqlite_table("users", |t| {
///     t.column("id", integer("id").primary_key());
///     t.column("email", text("email").unique().not_null());
/// })
/// .unwrap();
///
/// assert_eq!(
///     users.to_sql(),
///     "CREATE TABLE IF NOT EXISTS users (id integer not null primary key, email text unique not null)"
/// );
/// ```
pub fn sqlite_table(name: impl Into<String>, define: impl FnOnce(&mut TableBuilder)) -> Result<Table> {
    let mut builder = TableBuilder::new(name.into());
    define(&mut builder);
    builder.build()
}
