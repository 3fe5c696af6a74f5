//! AST node definitions.
//!
//! Nodes own their children (`Box`/`Vec`). Trees are built once by the
//! parser, compiled once into closures, and then dropped or kept only as
//! the source of an action definition.

mod expr;
mod sql;
mod stmt;
mod top_level;

pub use expr::{CallExpr, Expr};
pub use sql::{
    ColumnDef, CreateTable, Delete, DropTable, Insert, OrderBy, Select, SelectItem, SqlExpr,
    SqlStatement, TableRef, Update,
};
pub use stmt::{ActionStmt, AssignTarget, IfBranch, LoopControl, LoopTerm};
pub use top_level::{TopLevelKind, TopLevelStatement};

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
