//! Row-level expression evaluation for the in-memory store.
//!
//! Unlike the procedural language, SQL `AND`/`OR` use full three-valued
//! logic: `false AND NULL` is `false`, `true OR NULL` is `true`.

use std::cmp::Ordering;

use lq_ast::{BinaryOp, SqlExpr, UnaryOp};
use lq_types::DataType;
use lq_value::{ArithmeticOp, ComparisonOp, Value};

use crate::errors::StoreError;
use crate::schema::TableSchema;

/// The row an expression is evaluated against.
#[derive(Clone, Copy)]
pub(super) struct Row<'a> {
    pub schema: &'a TableSchema,
    pub values: &'a [Value],
}

pub(super) fn eval(expr: &SqlExpr, row: Option<Row<'_>>, params: &[Value]) -> Result<Value, StoreError> {
    match expr {
        SqlExpr::Column(name) => {
            let Some(row) = row else {
                return Err(StoreError::ColumnNotFound {
                    table: String::new(),
                    column: name.clone(),
                });
            };
            let (index, _) = row.schema.column(name).ok_or_else(|| StoreError::ColumnNotFound {
                table: row.schema.qualified_name(),
                column: name.clone(),
            })?;
            Ok(row.values[index].clone())
        }
        SqlExpr::Variable { name, .. } | SqlExpr::ContextVariable(name) => {
            Err(StoreError::Unbound { name: name.clone() })
        }
        SqlExpr::Literal(value) => Ok(value.clone()),
        SqlExpr::Param(index) => index
            .checked_sub(1)
            .and_then(|i| params.get(i))
            .cloned()
            .ok_or(StoreError::MissingParam {
                index: *index,
                count: params.len(),
            }),
        SqlExpr::Binary { op, left, right } => {
            let left = eval(left, row, params)?;
            let right = eval(right, row, params)?;
            binary(*op, &left, &right)
        }
        SqlExpr::Unary { op, operand } => {
            let operand = eval(operand, row, params)?;
            let op = match op {
                UnaryOp::Neg => lq_value::UnaryOp::Neg,
                UnaryOp::Not => lq_value::UnaryOp::Not,
                UnaryOp::Pos => lq_value::UnaryOp::Pos,
            };
            Ok(operand.unary(op)?)
        }
        SqlExpr::IsNull { expr, negated } => {
            let value = eval(expr, row, params)?;
            Ok(Value::Bool(value.is_null() != *negated))
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, StoreError> {
    let arithmetic = |op| left.arithmetic(right, op).map_err(StoreError::from);
    let compare = |op| left.compare(right, op).map_err(StoreError::from);
    match op {
        BinaryOp::Add => arithmetic(ArithmeticOp::Add),
        BinaryOp::Sub => arithmetic(ArithmeticOp::Sub),
        BinaryOp::Mul => arithmetic(ArithmeticOp::Mul),
        BinaryOp::Div => arithmetic(ArithmeticOp::Div),
        BinaryOp::Mod => arithmetic(ArithmeticOp::Mod),
        BinaryOp::Concat => arithmetic(ArithmeticOp::Concat),
        BinaryOp::Eq => compare(ComparisonOp::Equal),
        BinaryOp::NotEq => Ok(compare(ComparisonOp::Equal)?.unary(lq_value::UnaryOp::Not)?),
        BinaryOp::Lt => compare(ComparisonOp::LessThan),
        BinaryOp::Gt => compare(ComparisonOp::GreaterThan),
        BinaryOp::LtEq => or(&compare(ComparisonOp::LessThan)?, &compare(ComparisonOp::Equal)?),
        BinaryOp::GtEq => or(&compare(ComparisonOp::GreaterThan)?, &compare(ComparisonOp::Equal)?),
        BinaryOp::And => and(left, right),
        BinaryOp::Or => or(left, right),
    }
}

/// `Some(b)` for a boolean, `None` for a null boolean.
fn as_logic(value: &Value) -> Result<Option<bool>, StoreError> {
    match value {
        Value::Bool(b) => Ok(Some(*b)),
        Value::Null(ty) if ty.is_null() || *ty == DataType::BOOL => Ok(None),
        other => Err(StoreError::InvalidOperand {
            what: "logical operand",
            expected: "bool",
            got: other.type_name(),
        }),
    }
}

fn logic_value(value: Option<bool>) -> Value {
    value.map_or(Value::Null(DataType::BOOL), Value::Bool)
}

fn and(left: &Value, right: &Value) -> Result<Value, StoreError> {
    let result = match (as_logic(left)?, as_logic(right)?) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    };
    Ok(logic_value(result))
}

fn or(left: &Value, right: &Value) -> Result<Value, StoreError> {
    let result = match (as_logic(left)?, as_logic(right)?) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    };
    Ok(logic_value(result))
}

/// Whether a `WHERE` condition selects the row. Null does not.
pub(super) fn matches(filter: Option<&SqlExpr>, row: Row<'_>, params: &[Value]) -> Result<bool, StoreError> {
    let Some(filter) = filter else {
        return Ok(true);
    };
    match eval(filter, Some(row), params)? {
        Value::Bool(b) => Ok(b),
        Value::Null(_) => Ok(false),
        other => Err(StoreError::InvalidOperand {
            what: "WHERE condition",
            expected: "bool",
            got: other.type_name(),
        }),
    }
}

/// Sort order of two values: ascending, nulls last.
pub(super) fn order(a: &Value, b: &Value) -> Result<Ordering, StoreError> {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Greater),
        (false, true) => return Ok(Ordering::Less),
        (false, false) => {}
    }
    if a.compare(b, ComparisonOp::LessThan)? == Value::Bool(true) {
        Ok(Ordering::Less)
    } else if a.compare(b, ComparisonOp::GreaterThan)? == Value::Bool(true) {
        Ok(Ordering::Greater)
    } else {
        Ok(Ordering::Equal)
    }
}
