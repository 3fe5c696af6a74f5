//! Planning and store errors.

use lq_value::ValueError;

/// A statement that cannot be planned.
///
/// Every variant names the identifier that failed to resolve so the error
/// can be reported against the action that issued the statement.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("unknown table {table}")]
    UnknownTable { table: String },
    #[error("table {table} already exists")]
    TableExists { table: String },
    #[error("unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },
    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("unknown variable {name}")]
    UnknownVariable { name: String },
    #[error("variable {name} has no field {field}")]
    UnknownField { name: String, field: String },
    #[error("INSERT into {table} has {expected} columns but {got} values")]
    ValueCount {
        table: String,
        expected: usize,
        got: usize,
    },
    #[error("table {table} may have at most one primary key column")]
    MultiplePrimaryKeys { table: String },
    #[error("{statement} modifies state and cannot run in a read-only context")]
    MutatesState { statement: &'static str },
    #[error("statement still contains an unbound variable {name}")]
    Unbound { name: String },
}

/// A failure inside the store.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("table {table} does not exist")]
    TableNotFound { table: String },
    #[error("table {table} already exists")]
    TableExists { table: String },
    #[error("column {column} does not exist in table {table}")]
    ColumnNotFound { table: String, column: String },
    #[error("duplicate primary key {key} in table {table}")]
    DuplicateKey { table: String, key: String },
    #[error("null value in column {column} of table {table} violates not-null constraint")]
    NotNull { table: String, column: String },
    #[error("column {column} of table {table}: {source}")]
    Column {
        table: String,
        column: String,
        #[source]
        source: ValueError,
    },
    #[error("statement requires parameter ${index} but only {count} were bound")]
    MissingParam { index: usize, count: usize },
    #[error("{what} must be {expected}, got {got}")]
    InvalidOperand {
        what: &'static str,
        expected: &'static str,
        got: String,
    },
    #[error("transaction is read-only")]
    ReadOnly,
    #[error("unbound variable {name} reached the store")]
    Unbound { name: String },
    #[error(transparent)]
    Value(#[from] ValueError),
}
