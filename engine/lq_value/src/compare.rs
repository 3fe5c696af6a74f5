//! Three-valued comparison.
//!
//! Comparisons return `Bool` or the null boolean. Outside of `IS` and
//! `IS DISTINCT FROM`, a null on either side makes the result null.

use std::cmp::Ordering;

use lq_types::DataType;

use crate::array::ArrayValue;
use crate::errors::{type_mismatch, unsupported_comparison, ValueResult};
use crate::ops::ComparisonOp;
use crate::record::RecordValue;
use crate::value::Value;

/// The null boolean.
#[inline]
fn unknown() -> Value {
    Value::Null(DataType::BOOL)
}

/// Whether two values may be compared or combined at all.
pub(crate) fn kinds_compatible(left: &Value, right: &Value) -> bool {
    match (left.data_type(), right.data_type()) {
        (Some(a), Some(b)) => a.compatible_kind(&b),
        (None, None) => true,
        (None, Some(ty)) | (Some(ty), None) => ty.is_null(),
    }
}

/// Resolve an ordering against an operator that supports ordering.
fn ordered(ord: Ordering, op: ComparisonOp, type_name: &str) -> ValueResult<Value> {
    let result = match op {
        ComparisonOp::Equal => ord == Ordering::Equal,
        ComparisonOp::LessThan => ord == Ordering::Less,
        ComparisonOp::GreaterThan => ord == Ordering::Greater,
        ComparisonOp::IsDistinctFrom => ord != Ordering::Equal,
        ComparisonOp::Is => return Err(unsupported_comparison(type_name, op)),
    };
    Ok(Value::Bool(result))
}

/// Resolve equality against an operator for kinds without an ordering.
fn equality_only(equal: bool, op: ComparisonOp, type_name: &str) -> ValueResult<Value> {
    match op {
        ComparisonOp::Equal => Ok(Value::Bool(equal)),
        ComparisonOp::IsDistinctFrom => Ok(Value::Bool(!equal)),
        _ => Err(unsupported_comparison(type_name, op)),
    }
}

impl Value {
    /// Compare two values.
    ///
    /// Kinds must match (a typed null only meets its own kind). `IS` is
    /// defined for nulls and booleans; ordering operators for numbers and
    /// text; equality for everything.
    pub fn compare(&self, other: &Value, op: ComparisonOp) -> ValueResult<Value> {
        if !kinds_compatible(self, other) {
            return Err(type_mismatch(self.type_name(), other.type_name()));
        }

        match (self, other) {
            (Value::Null(_), Value::Null(_)) => Ok(match op {
                ComparisonOp::Is => Value::Bool(true),
                ComparisonOp::IsDistinctFrom => Value::Bool(false),
                _ => unknown(),
            }),
            (Value::Null(_), _) | (_, Value::Null(_)) => Ok(match op {
                ComparisonOp::Is => Value::Bool(false),
                ComparisonOp::IsDistinctFrom => Value::Bool(true),
                _ => unknown(),
            }),
            (Value::Int(a), Value::Int(b)) => ordered(a.cmp(b), op, "int8"),
            (Value::Text(a), Value::Text(b)) => ordered(a.cmp(b), op, "text"),
            (Value::Decimal(a), Value::Decimal(b)) => {
                ordered(a.value().cmp(&b.value()), op, "numeric")
            }
            (Value::Bool(a), Value::Bool(b)) => match op {
                ComparisonOp::Equal | ComparisonOp::Is => Ok(Value::Bool(a == b)),
                ComparisonOp::IsDistinctFrom => Ok(Value::Bool(a != b)),
                _ => Err(unsupported_comparison("bool", op)),
            },
            (Value::Blob(a), Value::Blob(b)) => equality_only(a == b, op, "bytea"),
            (Value::Uuid(a), Value::Uuid(b)) => equality_only(a == b, op, "uuid"),
            (Value::Array(a), Value::Array(b)) => compare_arrays(a, b, op),
            (Value::Record(a), Value::Record(b)) => compare_records(a, b, op),
            _ => Err(type_mismatch(self.type_name(), other.type_name())),
        }
    }

    /// Whether two values are not distinct (`NOT (a IS DISTINCT FROM b)`).
    ///
    /// Fails only on a kind mismatch.
    pub fn not_distinct(&self, other: &Value) -> ValueResult<bool> {
        let distinct = self.compare(other, ComparisonOp::IsDistinctFrom)?;
        Ok(matches!(distinct, Value::Bool(false)))
    }
}

/// Element-wise array equality.
///
/// Stops at the first length mismatch, null/non-null pairing, or unequal
/// element. Two nulls in the same position count as equal.
fn compare_arrays(a: &ArrayValue, b: &ArrayValue, op: ComparisonOp) -> ValueResult<Value> {
    if !matches!(op, ComparisonOp::Equal | ComparisonOp::IsDistinctFrom) {
        return Err(unsupported_comparison(a.data_type(), op));
    }
    let mut equal = a.len() == b.len();
    if equal {
        for (x, y) in a.iter().zip(b.iter()) {
            if !x.not_distinct(y)? {
                equal = false;
                break;
            }
        }
    }
    equality_only(equal, op, "array")
}

/// Order-sensitive record equality.
fn compare_records(a: &RecordValue, b: &RecordValue, op: ComparisonOp) -> ValueResult<Value> {
    if !matches!(op, ComparisonOp::Equal | ComparisonOp::IsDistinctFrom) {
        return Err(unsupported_comparison("record", op));
    }
    let mut equal = a.len() == b.len();
    if equal {
        for ((name_a, x), (name_b, y)) in a.iter().zip(b.iter()) {
            if name_a != name_b || !kinds_compatible(x, y) || !x.not_distinct(y)? {
                equal = false;
                break;
            }
        }
    }
    equality_only(equal, op, "record")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
