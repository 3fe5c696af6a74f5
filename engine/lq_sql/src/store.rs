//! The store seam.

use lq_types::{AccessMode, NamedType};
use lq_value::Value;

use crate::errors::StoreError;
use crate::plan::PreparedStatement;
use crate::schema::Catalog;

/// Rows produced by one statement, fully materialized.
///
/// `columns` mirrors the statement's planned result fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<NamedType>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn empty() -> Self {
        RowSet::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An open transaction against the relational store.
pub trait Store {
    /// Whether this transaction may write. Decides whether actions run in a
    /// mutating context.
    fn access_mode(&self) -> AccessMode;

    /// Schemas visible to this transaction.
    fn catalog(&self) -> &dyn Catalog;

    /// Run a planned statement with its positional parameters.
    fn execute(&mut self, statement: &PreparedStatement, params: &[Value]) -> Result<RowSet, StoreError>;

    /// Drop every table in `namespace`.
    fn drop_namespace(&mut self, namespace: &str) -> Result<(), StoreError>;
}
