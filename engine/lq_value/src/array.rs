//! One-dimensional, 1-indexed arrays of scalars.

use lq_types::DataType;

use crate::errors::{not_scalar, type_mismatch, ValueError, ValueResult};
use crate::value::Value;

/// Most elements an array may hold. Writes and appends past it fail instead
/// of allocating.
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// An array of scalar values of one kind.
///
/// Elements are either scalars of the element type or typed nulls. Indexing
/// is 1-based, and [`set`](ArrayValue::set) past the end grows the array,
/// filling the gap with nulls.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    element: DataType,
    items: Vec<Value>,
}

impl ArrayValue {
    /// An empty array with the given element type.
    pub fn new(element: DataType) -> Self {
        ArrayValue {
            element: element.element(),
            items: Vec::new(),
        }
    }

    /// Build an array, admitting each item against the element type.
    pub fn from_items(element: DataType, items: Vec<Value>) -> ValueResult<Self> {
        let mut array = ArrayValue::new(element);
        array.items.reserve(items.len());
        for item in items {
            array.push(item)?;
        }
        Ok(array)
    }

    /// Lift scalars into an array whose element type is taken from the items.
    ///
    /// The first typed item decides the kind. Decimal items are widened to a
    /// common precision and scale.
    pub fn lift(items: Vec<Value>) -> ValueResult<Self> {
        if items.is_empty() {
            return Err(ValueError::EmptyArray);
        }
        let mut element = DataType::NULL;
        for item in &items {
            let Some(ty) = item.data_type() else {
                return Err(not_scalar(item.type_name()));
            };
            if ty.is_array {
                return Err(not_scalar(ty));
            }
            if element.is_null() {
                element = ty;
            } else if !ty.is_null() {
                element = widen(element, ty)?;
            }
        }
        ArrayValue::from_items(element, items)
    }

    /// Element type (always a scalar type).
    #[inline]
    pub fn element_type(&self) -> DataType {
        self.element
    }

    /// The array's own type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.element.as_array()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements in index order, as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    /// The elements, consuming the array.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// Element at 1-based index `index`.
    pub fn index(&self, index: i64) -> ValueResult<Value> {
        self.slot(index)
            .and_then(|i| self.items.get(i))
            .cloned()
            .ok_or(ValueError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            })
    }

    /// Store `value` at 1-based index `index`, growing the array if needed.
    ///
    /// Indices beyond [`MAX_ARRAY_LEN`] are rejected.
    pub fn set(&mut self, index: i64, value: Value) -> ValueResult<()> {
        let Some(slot) = self.slot(index) else {
            return Err(ValueError::InvalidIndex { index });
        };
        if slot >= MAX_ARRAY_LEN {
            return Err(ValueError::ArrayTooLong {
                index,
                max: MAX_ARRAY_LEN,
            });
        }
        let value = self.admit(value)?;
        if slot >= self.items.len() {
            self.grow_to(slot + 1)?;
        }
        self.items[slot] = value;
        Ok(())
    }

    /// Append an element.
    pub fn push(&mut self, value: Value) -> ValueResult<()> {
        if self.items.len() >= MAX_ARRAY_LEN {
            return Err(ValueError::ArrayTooLong {
                index: i64::try_from(self.items.len() + 1).unwrap_or(i64::MAX),
                max: MAX_ARRAY_LEN,
            });
        }
        let value = self.admit(value)?;
        self.items
            .try_reserve(1)
            .map_err(|_| ValueError::ArrayAllocation {
                len: self.items.len() + 1,
            })?;
        self.items.push(value);
        Ok(())
    }

    /// Extend with typed nulls up to `len` elements.
    fn grow_to(&mut self, len: usize) -> ValueResult<()> {
        self.items
            .try_reserve(len - self.items.len())
            .map_err(|_| ValueError::ArrayAllocation { len })?;
        self.items.resize(len, Value::Null(self.element));
        Ok(())
    }

    /// Zero-based slot for a 1-based index.
    fn slot(&self, index: i64) -> Option<usize> {
        if index < 1 {
            return None;
        }
        usize::try_from(index - 1).ok()
    }

    /// Check a value against the element type, retyping nulls and rescaling
    /// decimals to the element's precision.
    ///
    /// An array created without a concrete element type adopts the kind of
    /// the first typed value stored in it.
    fn admit(&mut self, value: Value) -> ValueResult<Value> {
        let Some(ty) = value.data_type() else {
            return Err(not_scalar(value.type_name()));
        };
        if ty.is_array {
            return Err(not_scalar(ty));
        }
        if value.is_null() {
            if !self.element.compatible_kind(&ty) {
                return Err(type_mismatch(self.data_type(), ty));
            }
            return Ok(Value::Null(self.element));
        }
        if self.element.is_null() {
            self.element = ty;
            for item in &mut self.items {
                *item = Value::Null(ty);
            }
            return Ok(value);
        }
        if !self.element.compatible_kind(&ty) {
            return Err(type_mismatch(self.data_type(), ty));
        }
        if self.element.is_decimal() && !self.element.equals_strict(&ty) {
            return value.cast(self.element);
        }
        Ok(value)
    }
}

/// Common type of two same-kind scalar types.
fn widen(a: DataType, b: DataType) -> ValueResult<DataType> {
    use lq_types::BaseType;

    if !a.compatible_kind(&b) {
        return Err(type_mismatch(a, b));
    }
    match (a.base, b.base) {
        (
            BaseType::Decimal {
                precision: p1,
                scale: s1,
            },
            BaseType::Decimal {
                precision: p2,
                scale: s2,
            },
        ) => {
            let scale = s1.max(s2);
            let integer_digits = (p1 - s1).max(p2 - s2);
            DataType::decimal(integer_digits + scale, scale)
                .map_err(|_| crate::errors::out_of_range(a, b))
        }
        _ => Ok(a),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
