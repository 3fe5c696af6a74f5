//! LedgerQL AST - pre-parsed statement trees.
//!
//! The interpreter never sees source text. A [`Parser`] turns text into
//! [`TopLevelStatement`]s, and everything downstream works on these trees:
//!
//! - [`ActionStmt`] / [`Expr`]: the procedural language of action bodies
//! - [`SqlStatement`] / [`SqlExpr`]: embedded SQL, before parameter binding
//! - [`TopLevelStatement`]: what a transaction may run directly
//!
//! Every node is a closed enum so the compiler can match each kind exactly
//! once. Variable names keep their prefix (`$name`, `@caller`).

mod action;
pub mod ast;
mod operators;
mod parser;

pub use action::ActionDef;
pub use ast::{
    ActionStmt, AssignTarget, CallExpr, ColumnDef, CreateTable, Delete, DropTable, Expr, IfBranch, Insert,
    LoopControl, LoopTerm, OrderBy, Select, SelectItem, SqlExpr, SqlStatement, TableRef,
    TopLevelKind, TopLevelStatement, Update,
};
pub use operators::{BinaryOp, UnaryOp};
pub use parser::{ParseError, Parser};

/// Prefix of variables bound from parameters and locals.
pub const VARIABLE_PREFIX: char = '$';

/// Prefix of read-only variables resolved from the transaction context.
pub const CONTEXT_PREFIX: char = '@';
