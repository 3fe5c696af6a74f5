//! Arithmetic and unary operators on scalars.
//!
//! Dispatch is a direct match on the operand pair. Both operands must be
//! scalars of the same kind; a null operand yields a null of the left
//! operand's type (or the right one's, when the left is the untyped null).

use crate::compare::kinds_compatible;
use crate::errors::{
    not_scalar, type_mismatch, unsupported_arithmetic, unsupported_unary, ValueError, ValueResult,
};
use crate::ops::{ArithmeticOp, UnaryOp};
use crate::value::Value;

/// Checked integer result, mapping `None` to an overflow error.
#[inline]
fn checked(result: Option<i64>, op: ArithmeticOp) -> ValueResult<Value> {
    result.map(Value::Int).ok_or(ValueError::Overflow {
        operation: op.operation_name(),
    })
}

fn int_arithmetic(a: i64, b: i64, op: ArithmeticOp) -> ValueResult<Value> {
    match op {
        ArithmeticOp::Add => checked(a.checked_add(b), op),
        ArithmeticOp::Sub => checked(a.checked_sub(b), op),
        ArithmeticOp::Mul => checked(a.checked_mul(b), op),
        ArithmeticOp::Div if b == 0 => Err(ValueError::DivisionByZero),
        ArithmeticOp::Div => checked(a.checked_div(b), op),
        ArithmeticOp::Mod if b == 0 => Err(ValueError::ModuloByZero),
        ArithmeticOp::Mod => checked(a.checked_rem(b), op),
        ArithmeticOp::Concat => Err(unsupported_arithmetic("int8", op)),
    }
}

impl Value {
    /// Apply a binary arithmetic operator.
    pub fn arithmetic(&self, other: &Value, op: ArithmeticOp) -> ValueResult<Value> {
        if !self.is_scalar() {
            return Err(not_scalar(self.type_name()));
        }
        if !other.is_scalar() {
            return Err(not_scalar(other.type_name()));
        }
        if !kinds_compatible(self, other) {
            return Err(type_mismatch(self.type_name(), other.type_name()));
        }

        match (self, other) {
            (Value::Null(ty), Value::Null(_)) if !ty.is_null() => Ok(Value::Null(*ty)),
            (Value::Null(_), Value::Null(ty)) => Ok(Value::Null(*ty)),
            (Value::Null(ty), rhs) if ty.is_null() => Ok(Value::zero_of(rhs)),
            (Value::Null(ty), _) => Ok(Value::Null(*ty)),
            (lhs, Value::Null(_)) => Ok(Value::zero_of(lhs)),
            (Value::Int(a), Value::Int(b)) => int_arithmetic(*a, *b, op),
            (Value::Decimal(a), Value::Decimal(b)) => a.arithmetic(*b, op).map(Value::Decimal),
            (Value::Text(a), Value::Text(b)) => match op {
                ArithmeticOp::Concat => {
                    let mut joined = String::with_capacity(a.len() + b.len());
                    joined.push_str(a);
                    joined.push_str(b);
                    Ok(Value::Text(joined))
                }
                _ => Err(unsupported_arithmetic("text", op)),
            },
            _ => Err(unsupported_arithmetic(self.type_name(), op)),
        }
    }

    /// Apply a unary operator.
    pub fn unary(&self, op: UnaryOp) -> ValueResult<Value> {
        match (self, op) {
            (Value::Null(ty), _) if !ty.is_array => Ok(Value::Null(*ty)),
            (Value::Int(i), UnaryOp::Neg) => i.checked_neg().map(Value::Int).ok_or(
                ValueError::Overflow {
                    operation: "negation",
                },
            ),
            (Value::Int(_) | Value::Decimal(_), UnaryOp::Pos) => Ok(self.clone()),
            (Value::Decimal(d), UnaryOp::Neg) => Ok(Value::Decimal(d.negate())),
            (Value::Bool(b), UnaryOp::Not) => Ok(Value::Bool(!b)),
            (Value::Array(_) | Value::Record(_) | Value::Null(_), _) => {
                Err(not_scalar(self.type_name()))
            }
            _ => Err(unsupported_unary(self.type_name(), op)),
        }
    }

    /// Null of this value's type.
    fn zero_of(value: &Value) -> Value {
        Value::Null(value.data_type().unwrap_or(lq_types::DataType::NULL))
    }
}
