//! LedgerQL SQL - everything between an embedded SQL tree and the store.
//!
//! - [`Planner`] checks a statement against the catalog and the variables in
//!   scope, then rewrites it into a [`PreparedStatement`] with positional
//!   parameters.
//! - [`generate`] renders the rewritten tree as SQL text. The same tree
//!   always renders to the same bytes, so every validator issues identical
//!   statements.
//! - [`Store`] is the seam to the transactional database. [`MemoryDb`] is an
//!   in-process implementation for embedding and tests.

mod errors;
pub mod generate;
mod memory;
mod plan;
mod schema;
mod store;

pub use errors::{PlanError, StoreError};
pub use memory::{MemoryDb, MemoryTx};
pub use plan::{CatalogPlanner, ParamRef, PlanContext, Planner, PreparedStatement, VariableTypes};
pub use schema::{Catalog, TableSchema};
pub use store::{RowSet, Store};

/// Key of a table in a catalog: `namespace.table`, lowercased.
pub fn table_key(namespace: &str, table: &str) -> String {
    let mut key = String::with_capacity(namespace.len() + table.len() + 1);
    key.push_str(&namespace.to_ascii_lowercase());
    key.push('.');
    key.push_str(&table.to_ascii_lowercase());
    key
}
