//! Table schemas and the catalog lookup the planner plans against.

use lq_ast::{ColumnDef, TableRef};

/// Schema of one table. Columns are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub namespace: String,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        TableSchema {
            namespace: namespace.into(),
            name: name.into(),
            columns,
        }
    }

    /// Column by case-insensitive name, with its position.
    pub fn column(&self, name: &str) -> Option<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key(&self) -> Option<usize> {
        self.columns.iter().position(|column| column.primary_key)
    }

    /// `namespace.table`, for messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// Read access to table schemas.
///
/// `table` is always namespace-qualified when the planner asks.
pub trait Catalog {
    fn table(&self, table: &TableRef) -> Option<&TableSchema>;
}
