//! Expression compilation.

use lq_ast::{BinaryOp, Expr, UnaryOp};
use lq_stack::ensure_sufficient_stack;
use lq_types::DataType;
use lq_value::{ArithmeticOp, ArrayValue, ComparisonOp, Value};

use super::{expr_fn, CallSite, ExprFn};
use crate::context::ExecutionContext;
use crate::errors::{invalid_operand, return_arity, row_count, type_mismatch, unknown_field, ExecError};

pub(crate) fn expression(expr: &Expr) -> ExprFn {
    match expr {
        Expr::Literal(value) => {
            let value = value.clone();
            expr_fn(move |_| Ok(value.clone()))
        }
        Expr::Variable(name) => {
            let name = name.clone();
            expr_fn(move |ctx| ctx.get_variable(&name))
        }
        Expr::Call(call) => call_expression(CallSite::new(call)),
        Expr::ArrayAccess { array, index } => {
            let array = expression(array);
            let index = expression(index);
            expr_fn(move |ctx| {
                let array = array(ctx)?;
                let index = array_index(&index(ctx)?)?;
                match array {
                    Value::Array(array) => Ok(array.index(index)?),
                    Value::Null(ty) if ty.is_array || ty.is_null() => Ok(Value::Null(ty.element())),
                    other => Err(invalid_operand("indexed value", "an array", other.type_name())),
                }
            })
        }
        Expr::ArraySlice { array, from, to } => {
            let array = expression(array);
            let from = from.as_deref().map(expression);
            let to = to.as_deref().map(expression);
            expr_fn(move |ctx| {
                let array = array(ctx)?;
                let from = from.as_ref().map(|from| from(ctx)).transpose()?;
                let to = to.as_ref().map(|to| to(ctx)).transpose()?;
                match array {
                    Value::Array(array) => slice(&array, from.as_ref(), to.as_ref()),
                    Value::Null(ty) if ty.is_array || ty.is_null() => Ok(Value::Null(ty)),
                    other => Err(invalid_operand("sliced value", "an array", other.type_name())),
                }
            })
        }
        Expr::MakeArray(items) => {
            let items: Vec<ExprFn> = items.iter().map(expression).collect();
            expr_fn(move |ctx| {
                let values = items.iter().map(|item| item(ctx)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(ArrayValue::lift(values)?))
            })
        }
        Expr::FieldAccess { record, field } => {
            let record = expression(record);
            let field = field.clone();
            expr_fn(move |ctx| match record(ctx)? {
                Value::Record(record) => record.get(&field).cloned().ok_or_else(|| unknown_field(&field)),
                other => Err(invalid_operand("field access target", "a record", other.type_name())),
            })
        }
        Expr::Paren(inner) => expression(inner),
        Expr::Binary { op, left, right } => binary(*op, expression(left), expression(right)),
        Expr::Unary { op, operand } => {
            let op = lower_unary(*op);
            let operand = expression(operand);
            expr_fn(move |ctx| Ok(operand(ctx)?.unary(op)?))
        }
        Expr::Is {
            left,
            right,
            not,
            distinct,
        } => {
            let left = expression(left);
            let right = expression(right);
            let op = if *distinct {
                ComparisonOp::IsDistinctFrom
            } else {
                ComparisonOp::Is
            };
            let not = *not;
            expr_fn(move |ctx| {
                let left = left(ctx)?;
                let right = right(ctx)?;
                let result = left.compare(&right, op)?;
                if not {
                    Ok(result.unary(lq_value::UnaryOp::Not)?)
                } else {
                    Ok(result)
                }
            })
        }
        Expr::Cast { expr, target } => {
            let expr = expression(expr);
            let target = *target;
            expr_fn(move |ctx| Ok(expr(ctx)?.cast(target)?))
        }
    }
}

/// A call used as a value: exactly one row holding exactly one value.
fn call_expression(site: CallSite) -> ExprFn {
    expr_fn(move |ctx| {
        let (_, rows) = site.collect(ctx)?;
        let [row] = <[Vec<Value>; 1]>::try_from(rows).map_err(|rows| row_count(&site.name, rows.len()))?;
        let [value] = <[Value; 1]>::try_from(row).map_err(|row| return_arity(&site.name, 1, row.len()))?;
        Ok(value)
    })
}

fn binary(op: BinaryOp, left: ExprFn, right: ExprFn) -> ExprFn {
    match lower_binary(op) {
        Lowered::Logical { and } => expr_fn(move |ctx| {
            let Some(a) = logical_operand(left(ctx)?)? else {
                return Ok(Value::Null(DataType::BOOL));
            };
            let Some(b) = logical_operand(right(ctx)?)? else {
                return Ok(Value::Null(DataType::BOOL));
            };
            Ok(Value::Bool(if and { a && b } else { a || b }))
        }),
        Lowered::Comparison { op, or_equal, negate } => expr_fn(move |ctx| {
            let (a, b) = operands(ctx, &left, &right)?;
            let mut result = a.compare(&b, op)?;
            if or_equal {
                result = either(&result, &a.compare(&b, ComparisonOp::Equal)?);
            }
            if negate {
                result = result.unary(lq_value::UnaryOp::Not)?;
            }
            Ok(result)
        }),
        Lowered::Arithmetic(op) => expr_fn(move |ctx| {
            let (a, b) = operands(ctx, &left, &right)?;
            Ok(a.arithmetic(&b, op)?)
        }),
    }
}

/// A source operator in terms of the value algebra.
enum Lowered {
    Logical {
        and: bool,
    },
    /// `op`, optionally OR-ed with equality, optionally negated.
    Comparison {
        op: ComparisonOp,
        or_equal: bool,
        negate: bool,
    },
    Arithmetic(ArithmeticOp),
}

fn lower_binary(op: BinaryOp) -> Lowered {
    let comparison = |op, or_equal, negate| Lowered::Comparison { op, or_equal, negate };
    match op {
        BinaryOp::And => Lowered::Logical { and: true },
        BinaryOp::Or => Lowered::Logical { and: false },
        BinaryOp::Eq => comparison(ComparisonOp::Equal, false, false),
        BinaryOp::NotEq => comparison(ComparisonOp::Equal, false, true),
        BinaryOp::Lt => comparison(ComparisonOp::LessThan, false, false),
        BinaryOp::LtEq => comparison(ComparisonOp::LessThan, true, false),
        BinaryOp::Gt => comparison(ComparisonOp::GreaterThan, false, false),
        BinaryOp::GtEq => comparison(ComparisonOp::GreaterThan, true, false),
        BinaryOp::Add => Lowered::Arithmetic(ArithmeticOp::Add),
        BinaryOp::Sub => Lowered::Arithmetic(ArithmeticOp::Sub),
        BinaryOp::Mul => Lowered::Arithmetic(ArithmeticOp::Mul),
        BinaryOp::Div => Lowered::Arithmetic(ArithmeticOp::Div),
        BinaryOp::Mod => Lowered::Arithmetic(ArithmeticOp::Mod),
        BinaryOp::Concat => Lowered::Arithmetic(ArithmeticOp::Concat),
    }
}

/// Evaluate both sides, left first. Operator chains nest deeply, so each
/// level checks the remaining stack.
fn operands(
    ctx: &mut ExecutionContext<'_>,
    left: &ExprFn,
    right: &ExprFn,
) -> Result<(Value, Value), ExecError> {
    ensure_sufficient_stack(|| Ok((left(ctx)?, right(ctx)?)))
}

/// `None` for null.
fn logical_operand(value: Value) -> Result<Option<bool>, ExecError> {
    match value {
        Value::Bool(b) => Ok(Some(b)),
        Value::Null(ty) if ty.is_null() || ty == DataType::BOOL => Ok(None),
        other => Err(type_mismatch("bool", other.type_name())),
    }
}

/// Three-valued OR of two comparison results.
fn either(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Bool(true), _) | (_, Value::Bool(true)) => Value::Bool(true),
        (Value::Bool(false), Value::Bool(false)) => Value::Bool(false),
        _ => Value::Null(DataType::BOOL),
    }
}

fn lower_unary(op: UnaryOp) -> lq_value::UnaryOp {
    match op {
        UnaryOp::Neg => lq_value::UnaryOp::Neg,
        UnaryOp::Not => lq_value::UnaryOp::Not,
        UnaryOp::Pos => lq_value::UnaryOp::Pos,
    }
}

/// An array index: a non-null int8.
pub(super) fn array_index(value: &Value) -> Result<i64, ExecError> {
    value
        .as_int()
        .ok_or_else(|| invalid_operand("array index", "a non-null int8", value.type_name()))
}

/// `array[from:to]`, both ends inclusive and clamped to the array. An empty
/// range yields an empty array.
fn slice(array: &ArrayValue, from: Option<&Value>, to: Option<&Value>) -> Result<Value, ExecError> {
    let len = i64::try_from(array.len()).unwrap_or(i64::MAX);
    let from = from.map(array_index).transpose()?.unwrap_or(1).max(1);
    let to = to.map(array_index).transpose()?.unwrap_or(len).min(len);
    let items = if from > to {
        Vec::new()
    } else {
        let start = usize::try_from(from - 1).unwrap_or(0);
        let end = usize::try_from(to).unwrap_or(0);
        array.as_slice().get(start..end).map(<[Value]>::to_vec).unwrap_or_default()
    };
    Ok(Value::Array(ArrayValue::from_items(array.element_type(), items)?))
}
