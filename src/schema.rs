use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Raw type clause as written, e.g. `VARCHAR(255) NOT NULL`.
    #[serde(rename = "type")]
    pub typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn references(&self, table_name: &str) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.references_table == table_name)
    }
}

/// Tables keyed by name, in insertion order.
///
/// Tables are never replaced: inserting a name that is already present is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<Table>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table unless its name is taken. Returns `true` when the table was added.
    pub fn insert(&mut self, table: Table) -> bool {
        if self.index.contains_key(&table.table_name) {
            return false;
        }
        self.index.insert(table.table_name.clone(), self.tables.len());
        self.tables.push(table);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.index.get(name).map(|&i| &self.tables[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<Table> for Schema {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for table in iter {
            schema.insert(table);
        }
        schema
    }
}
