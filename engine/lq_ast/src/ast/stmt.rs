//! Procedural statements of action bodies.

use lq_types::DataType;

use super::expr::{CallExpr, Expr};
use super::sql::SqlStatement;

#[derive(Clone, Debug, PartialEq)]
pub enum ActionStmt {
    /// `$name type [:= init]`
    Declare {
        name: String,
        data_type: DataType,
        init: Option<Expr>,
    },
    Assign {
        target: AssignTarget,
        value: Expr,
    },
    /// `[$a, _, $c :=] ns.action(args)`; `None` receivers discard a column.
    Call {
        receivers: Vec<Option<String>>,
        call: CallExpr,
    },
    ForLoop {
        receiver: String,
        term: LoopTerm,
        body: Vec<ActionStmt>,
    },
    If {
        branches: Vec<IfBranch>,
        otherwise: Option<Vec<ActionStmt>>,
    },
    Sql(SqlStatement),
    LoopControl(LoopControl),
    /// `RETURN a, b`. With no values, just stops the action.
    Return(Vec<Expr>),
    /// `RETURN SELECT ...`: every row becomes a returned row.
    ReturnQuery(SqlStatement),
    /// `RETURN NEXT a, b`
    ReturnNext(Vec<Expr>),
}

/// Left-hand side of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Variable(String),
    /// `$arr[index] := value`
    ArrayElement { variable: String, index: Expr },
}

/// What a `FOR` loop iterates over.
#[derive(Clone, Debug, PartialEq)]
pub enum LoopTerm {
    /// `start..end`, inclusive.
    Range { start: Expr, end: Expr },
    /// One record per row.
    Sql(SqlStatement),
    /// Elements of an array value in index order.
    Array(Expr),
    /// Rows returned by an action, one record each.
    Call(CallExpr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfBranch {
    pub condition: Expr,
    pub then: Vec<ActionStmt>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoopControl {
    Break,
    Continue,
}
