//! Fixed-point decimal values that carry their declared precision and scale.

use std::fmt;

use lq_types::{BaseType, DataType, MAX_DECIMAL_PRECISION};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{out_of_range, unsupported_arithmetic, ValueError, ValueResult};
use crate::ops::ArithmeticOp;

/// Minimum scale of a quotient, so `1 / 3` does not collapse to `0`.
const DIV_MIN_SCALE: u16 = 6;

/// A decimal number together with its `numeric(precision, scale)` type.
///
/// The stored value always has exactly `scale` fractional digits and at
/// most `precision - scale` integer digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecimalValue {
    value: Decimal,
    precision: u16,
    scale: u16,
}

/// Number of significant digits in the mantissa (at least 1).
fn digit_count(value: &Decimal) -> u16 {
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

fn scale_of(value: &Decimal) -> u16 {
    u16::try_from(value.scale()).unwrap_or(MAX_DECIMAL_PRECISION)
}

impl DecimalValue {
    /// Wrap a decimal, inferring the tightest precision that holds it.
    pub fn new(value: Decimal) -> ValueResult<Self> {
        Self::fit(value, 1)
    }

    /// Rescale a decimal into `numeric(precision, scale)`.
    ///
    /// Extra fractional digits are rounded half-to-even. Too many integer
    /// digits is an out-of-range error.
    pub fn with_type(value: Decimal, precision: u16, scale: u16) -> ValueResult<Self> {
        let target = || format!("numeric({precision},{scale})");
        if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
            return Err(out_of_range(value, target()));
        }
        let mut scaled =
            value.round_dp_with_strategy(u32::from(scale), RoundingStrategy::MidpointNearestEven);
        scaled.rescale(u32::from(scale));
        let integer_digits = digit_count(&scaled).saturating_sub(scale);
        if scale_of(&scaled) != scale || integer_digits > precision - scale {
            return Err(out_of_range(value, target()));
        }
        Ok(DecimalValue {
            value: scaled,
            precision,
            scale,
        })
    }

    /// Wrap `value`, widening precision to at least `min_precision`.
    fn fit(value: Decimal, min_precision: u16) -> ValueResult<Self> {
        let scale = scale_of(&value);
        let precision = min_precision.max(digit_count(&value)).max(scale).max(1);
        if precision > MAX_DECIMAL_PRECISION {
            return Err(out_of_range(value, "numeric"));
        }
        Ok(DecimalValue {
            value,
            precision,
            scale,
        })
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.value
    }

    #[inline]
    pub fn precision(&self) -> u16 {
        self.precision
    }

    #[inline]
    pub fn scale(&self) -> u16 {
        self.scale
    }

    pub fn data_type(&self) -> DataType {
        DataType::scalar(BaseType::Decimal {
            precision: self.precision,
            scale: self.scale,
        })
    }

    /// Apply an arithmetic operator.
    ///
    /// Operands may differ in precision and scale. The result is computed
    /// exactly, then stored at the wider scale (or the sum of scales for
    /// multiplication) with enough precision to hold it.
    pub(crate) fn arithmetic(self, other: DecimalValue, op: ArithmeticOp) -> ValueResult<Self> {
        let (a, b) = (self.value, other.value);
        let widest_scale = self.scale.max(other.scale);
        let (result, scale) = match op {
            ArithmeticOp::Add => (a.checked_add(b), widest_scale),
            ArithmeticOp::Sub => (a.checked_sub(b), widest_scale),
            ArithmeticOp::Mul => (
                a.checked_mul(b),
                (self.scale + other.scale).min(MAX_DECIMAL_PRECISION),
            ),
            ArithmeticOp::Div => {
                if b.is_zero() {
                    return Err(ValueError::DivisionByZero);
                }
                (
                    a.checked_div(b),
                    widest_scale.max(DIV_MIN_SCALE).min(MAX_DECIMAL_PRECISION),
                )
            }
            ArithmeticOp::Mod => {
                if b.is_zero() {
                    return Err(ValueError::ModuloByZero);
                }
                (a.checked_rem(b), widest_scale)
            }
            ArithmeticOp::Concat => return Err(unsupported_arithmetic(self.data_type(), op)),
        };
        let result = result.ok_or(ValueError::Overflow {
            operation: op.operation_name(),
        })?;
        let mut rounded =
            result.round_dp_with_strategy(u32::from(scale), RoundingStrategy::MidpointNearestEven);
        rounded.rescale(u32::from(scale));
        Self::fit(rounded, self.precision.max(other.precision))
    }

    #[must_use]
    pub(crate) fn negate(self) -> Self {
        DecimalValue {
            value: -self.value,
            ..self
        }
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}
