//! The schema registry.
//!
//! Tables and relation groups are declared under keys and assembled once into
//! a frozen [`Schema`]: tables and relations live in arenas and refer to each
//! other by name, every `many` relation has its join keys resolved and each
//! table is paired with its relation group before any query runs.

use hashbrown::{HashMap, HashSet};
use trellis_core::{Result, TrellisError, trellis_warn};

use crate::relations::{Relation, RelationKind, Relations};
use crate::table::Table;

/// A schema declaration: a table or the relations of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Table(Table),
    Relations(Relations),
}

impl From<Table> for Declaration {
    fn from(table: Table) -> Self {
        Declaration::Table(table)
    }
}

impl From<Relations> for Declaration {
    fn from(relations: Relations) -> Self {
        Declaration::Relations(relations)
    }
}

/// Collects keyed declarations for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    declarations: Vec<(String, Declaration)>,
}

impl SchemaBuilder {
    /// Registers `table` under the logical name `key`.
    pub fn table(self, key: impl Into<String>, table: Table) -> Self {
        self.declare(key, table)
    }

    /// Registers a relation group under `key`.
    pub fn relations(self, key: impl Into<String>, relations: Relations) -> Self {
        self.declare(key, relations)
    }

    pub fn declare(mut self, key: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        self.declarations.push((key.into(), declaration.into()));
        self
    }

    pub fn build(self) -> Result<Schema> {
        Schema::from_declarations(self.declarations)
    }
}

/// Table index and relation group index of a logical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEntry {
    pub table: usize,
    pub relations: Option<usize>,
}

/// An assembled, read-only schema.
#[derive(Debug, Clone)]
pub struct Schema {
    declarations: Vec<(String, Declaration)>,
    tables: Vec<Table>,
    by_physical: HashMap<String, usize>,
    relations: Vec<(String, Relations)>,
    map: HashMap<String, SchemaEntry>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Assembles a schema from keyed declarations.
    ///
    /// Fails with [`TrellisError::SchemaCorrupted`] on duplicate keys,
    /// duplicate physical tables, duplicate relation groups for a table or
    /// relations naming unknown tables or columns, and with
    /// [`TrellisError::RelationCorrupted`] / [`TrellisError::AmbiguousRelation`]
    /// when a `many` relation cannot be paired.
    pub fn from_declarations(declarations: Vec<(String, Declaration)>) -> Result<Self> {
        let mut tables: Vec<Table> = Vec::new();
        let mut by_physical: HashMap<String, usize> = HashMap::new();
        let mut relations: Vec<(String, Relations)> = Vec::new();
        let mut keys: HashSet<&str> = HashSet::new();

        for (key, declaration) in &declarations {
            if !keys.insert(key.as_str()) {
                return Err(TrellisError::SchemaCorrupted(format!(
                    "\"{key}\" is declared twice"
                )));
            }
            match declaration {
                Declaration::Table(table) => {
                    if by_physical.contains_key(table.original_name()) {
                        return Err(TrellisError::SchemaCorrupted(format!(
                            "table \"{}\" is declared twice",
                            table.original_name()
                        )));
                    }
                    let mut table = table.clone();
                    table.set_name(key.as_str());
                    by_physical.insert(table.original_name().to_string(), tables.len());
                    tables.push(table);
                }
                Declaration::Relations(group) => {
                    if relations.iter().any(|(_, r)| r.table == group.table) {
                        return Err(TrellisError::SchemaCorrupted(format!(
                            "relations for table \"{}\" are declared twice",
                            group.table
                        )));
                    }
                    relations.push((key.clone(), group.clone()));
                }
            }
        }
        drop(keys);

        let mut schema = Schema {
            declarations: Vec::new(),
            tables,
            by_physical,
            relations,
            map: HashMap::new(),
        };
        schema.validate_relations()?;
        schema.resolve_many_relations()?;
        schema.build_map();
        schema.declarations = declarations;
        Ok(schema)
    }

    fn validate_relations(&self) -> Result<()> {
        for (_, group) in &self.relations {
            let source = self.table_by_physical(&group.table).map_err(|_| {
                TrellisError::SchemaCorrupted(format!(
                    "relations declared for unknown table \"{}\"",
                    group.table
                ))
            })?;

            for (name, relation) in &group.fields {
                let referenced =
                    self.table_by_physical(&relation.referenced_table)
                        .map_err(|_| {
                            TrellisError::SchemaCorrupted(format!(
                                "relation \"{name}\" of \"{}\" references unknown table \"{}\"",
                                source.name(),
                                relation.referenced_table
                            ))
                        })?;

                if relation.kind != RelationKind::One {
                    continue;
                }
                if relation.source_fields.is_empty()
                    || relation.source_fields.len() != relation.referenced_fields.len()
                {
                    return Err(TrellisError::SchemaCorrupted(format!(
                        "relation \"{name}\" of \"{}\" pairs {} fields with {} references",
                        source.name(),
                        relation.source_fields.len(),
                        relation.referenced_fields.len()
                    )));
                }
                let fields = relation.source_fields.iter().map(|f| (source, f));
                let references = relation.referenced_fields.iter().map(|f| (referenced, f));
                for (table, field) in fields.chain(references) {
                    if table.column(field).is_none() {
                        return Err(TrellisError::SchemaCorrupted(format!(
                            "relation \"{name}\" of \"{}\" uses unknown column \"{}.{field}\"",
                            source.name(),
                            table.name()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Copies join keys onto every `many` relation from its `one` counterpart.
    ///
    /// A `one` relation O pairs with a `many` relation R when O points from
    /// R's referenced table back to R's source table. R's source fields are
    /// O's referenced fields and vice versa. When R carries an identifier only
    /// candidates with the same identifier count. Exactly one candidate must
    /// remain.
    fn resolve_many_relations(&mut self) -> Result<()> {
        let mut resolved: Vec<(usize, usize, Vec<String>, Vec<String>)> = Vec::new();

        for (group_index, (_, group)) in self.relations.iter().enumerate() {
            for (field_index, (name, many)) in group.fields.iter().enumerate() {
                if many.kind != RelationKind::Many {
                    continue;
                }

                let candidates: Vec<&Relation> = self
                    .relations
                    .iter()
                    .flat_map(|(_, other)| other.fields.iter().map(|(_, r)| r))
                    .filter(|one| {
                        one.kind == RelationKind::One
                            && one.referenced_table == many.source_table
                            && one.source_table == many.referenced_table
                            && (many.identifier.is_none() || one.identifier == many.identifier)
                    })
                    .collect();

                let table = self.table_by_physical(&group.table)?.name().to_string();
                match candidates.as_slice() {
                    [one] => resolved.push((
                        group_index,
                        field_index,
                        one.referenced_fields.clone(),
                        one.source_fields.clone(),
                    )),
                    [] => {
                        return Err(TrellisError::RelationCorrupted {
                            table,
                            relation: name.clone(),
                        });
                    }
                    many_matches => {
                        return Err(TrellisError::AmbiguousRelation {
                            table,
                            relation: name.clone(),
                            candidates: many_matches.len(),
                        });
                    }
                }
            }
        }

        for (group_index, field_index, source_fields, referenced_fields) in resolved {
            let relation = &mut self.relations[group_index].1.fields[field_index].1;
            relation.source_fields = source_fields;
            relation.referenced_fields = referenced_fields;
        }
        Ok(())
    }

    fn build_map(&mut self) {
        self.map = self
            .tables
            .iter()
            .enumerate()
            .map(|(index, table)| {
                let relations = self
                    .relations
                    .iter()
                    .position(|(_, group)| group.table == table.original_name());
                (
                    table.name().to_string(),
                    SchemaEntry {
                        table: index,
                        relations,
                    },
                )
            })
            .collect();
    }

    /// Looks a table up by logical name.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.map
            .get(name)
            .map(|entry| &self.tables[entry.table])
            .ok_or_else(|| TrellisError::TableNotFound(name.to_string()))
    }

    /// Looks a table up by physical name.
    pub fn table_by_physical(&self, name: &str) -> Result<&Table> {
        self.by_physical
            .get(name)
            .map(|&index| &self.tables[index])
            .ok_or_else(|| TrellisError::TableNotFound(name.to_string()))
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn entry(&self, name: &str) -> Option<SchemaEntry> {
        self.map.get(name).copied()
    }

    /// The relation group of the table registered as `name`.
    pub fn relations_of(&self, name: &str) -> Option<&Relations> {
        self.map
            .get(name)
            .and_then(|entry| entry.relations)
            .map(|index| &self.relations[index].1)
    }

    /// Looks up relation `relation` of the table registered as `table`.
    pub fn relation(&self, table: &str, relation: &str) -> Result<&Relation> {
        self.relations_of(table)
            .and_then(|group| group.get(relation))
            .ok_or_else(|| TrellisError::RelationNotFound {
                table: table.to_string(),
                relation: relation.to_string(),
            })
    }

    /// The declarations this schema was assembled from.
    pub fn declarations(&self) -> &[(String, Declaration)] {
        &self.declarations
    }

    /// Reassembles the schema with `declarations` overlaid: a declaration
    /// under an existing key replaces it in place, new keys are appended.
    pub fn merge(
        &self,
        declarations: impl IntoIterator<Item = (String, Declaration)>,
    ) -> Result<Schema> {
        let mut merged = self.declarations.clone();
        for (key, declaration) in declarations {
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => {
                    trellis_warn!(key = %key, "schema declaration overwritten by merge");
                    *existing = declaration;
                }
                None => merged.push((key, declaration)),
            }
        }
        Schema::from_declarations(merged)
    }

    /// `CREATE TABLE IF NOT EXISTS` statements in declaration order.
    pub fn create_statements(&self) -> Vec<String> {
        self.tables.iter().map(Table::to_sql).collect()
    }
}
