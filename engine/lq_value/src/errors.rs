//! Error types for the value algebra.
//!
//! Every failure the algebra can produce is a [`ValueError`] variant with
//! structured fields. Factory functions build the common ones so call sites
//! stay short and the messages stay consistent.

use lq_types::DataType;

use crate::ops::{ArithmeticOp, ComparisonOp, UnaryOp};

/// Result of a value operation.
pub type ValueResult<T> = Result<T, ValueError>;

/// Typed error category for value operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    // Kind conflicts
    #[error("type mismatch: cannot combine {left} with {right}")]
    TypeMismatch { left: String, right: String },
    #[error("expected a scalar value, got {got}")]
    NotScalar { got: String },
    #[error("cannot compare {type_name} values with operator {op}")]
    UnsupportedComparison { type_name: String, op: ComparisonOp },
    #[error("cannot apply arithmetic operator {op} to {type_name}")]
    UnsupportedArithmetic { type_name: String, op: ArithmeticOp },
    #[error("cannot apply unary operator {op} to {type_name}")]
    UnsupportedUnary { type_name: String, op: UnaryOp },

    // Domain
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("numeric overflow in {operation}")]
    Overflow { operation: &'static str },
    #[error("value {value} does not fit in {target}")]
    OutOfRange { value: String, target: String },
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: String, to: String },
    #[error("invalid input for type {to}: {input:?}")]
    CastParse { input: String, to: String },

    // Arrays and records
    #[error("array index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("array index must be at least 1, got {index}")]
    InvalidIndex { index: i64 },
    #[error("array index {index} exceeds the maximum array length {max}")]
    ArrayTooLong { index: i64, max: usize },
    #[error("cannot allocate {len} array elements")]
    ArrayAllocation { len: usize },
    #[error("cannot build an array from zero elements")]
    EmptyArray,
    #[error("record already has a field named {name}")]
    DuplicateField { name: String },
}

#[cold]
pub fn type_mismatch(left: impl ToString, right: impl ToString) -> ValueError {
    ValueError::TypeMismatch {
        left: left.to_string(),
        right: right.to_string(),
    }
}

#[cold]
pub fn not_scalar(got: impl ToString) -> ValueError {
    ValueError::NotScalar {
        got: got.to_string(),
    }
}

#[cold]
pub fn unsupported_comparison(type_name: impl ToString, op: ComparisonOp) -> ValueError {
    ValueError::UnsupportedComparison {
        type_name: type_name.to_string(),
        op,
    }
}

#[cold]
pub fn unsupported_arithmetic(type_name: impl ToString, op: ArithmeticOp) -> ValueError {
    ValueError::UnsupportedArithmetic {
        type_name: type_name.to_string(),
        op,
    }
}

#[cold]
pub fn unsupported_unary(type_name: impl ToString, op: UnaryOp) -> ValueError {
    ValueError::UnsupportedUnary {
        type_name: type_name.to_string(),
        op,
    }
}

#[cold]
pub fn invalid_cast(from: impl ToString, to: &DataType) -> ValueError {
    ValueError::InvalidCast {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[cold]
pub fn cast_parse(input: impl Into<String>, to: &DataType) -> ValueError {
    ValueError::CastParse {
        input: input.into(),
        to: to.to_string(),
    }
}

#[cold]
pub fn out_of_range(value: impl ToString, target: impl ToString) -> ValueError {
    ValueError::OutOfRange {
        value: value.to_string(),
        target: target.to_string(),
    }
}
