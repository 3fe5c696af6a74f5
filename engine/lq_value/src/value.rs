//! The closed set of runtime values.

use std::fmt;

use lq_types::DataType;
use rust_decimal::Decimal;

use crate::array::ArrayValue;
use crate::decimal::DecimalValue;
use crate::errors::{type_mismatch, ValueResult};
use crate::record::RecordValue;

/// A runtime value.
///
/// Nulls are typed: `Null(int8)` is the null integer. The untyped null
/// (`Null(DataType::NULL)`) comes from a bare `NULL` literal and is
/// compatible with every kind. A typed null only meets values of its own
/// kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null(DataType),
    Int(i64),
    Text(String),
    Bool(bool),
    Blob(Vec<u8>),
    Uuid(uuid::Uuid),
    Decimal(DecimalValue),
    Array(ArrayValue),
    Record(RecordValue),
}

impl Value {
    #[inline]
    pub fn int(value: i64) -> Self {
        Value::Int(value)
    }

    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    #[inline]
    pub fn blob(value: impl Into<Vec<u8>>) -> Self {
        Value::Blob(value.into())
    }

    /// A decimal with the tightest type that holds `value`.
    pub fn decimal(value: Decimal) -> ValueResult<Self> {
        DecimalValue::new(value).map(Value::Decimal)
    }

    /// The untyped null.
    #[inline]
    pub fn null() -> Self {
        Value::Null(DataType::NULL)
    }

    /// The zero value of a type: a null of that type.
    ///
    /// Used for declared-but-unassigned variables and for the typed slots a
    /// query result is scanned into.
    #[inline]
    pub fn zero(data_type: DataType) -> Self {
        Value::Null(data_type)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Whether this is a scalar (not an array, a null array, or a record).
    pub fn is_scalar(&self) -> bool {
        match self {
            Value::Null(ty) => !ty.is_array,
            Value::Array(_) | Value::Record(_) => false,
            _ => true,
        }
    }

    /// Type of the value. Records have no type descriptor.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Value::Null(ty) => *ty,
            Value::Int(_) => DataType::INT,
            Value::Text(_) => DataType::TEXT,
            Value::Bool(_) => DataType::BOOL,
            Value::Blob(_) => DataType::BLOB,
            Value::Uuid(_) => DataType::UUID,
            Value::Decimal(d) => d.data_type(),
            Value::Array(a) => a.data_type(),
            Value::Record(_) => return None,
        })
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> String {
        match self.data_type() {
            Some(ty) => ty.to_string(),
            None => "record".to_string(),
        }
    }

    /// Whether this value can be bound where `declared` is expected.
    ///
    /// Types must match strictly, except that a null of any kind binds
    /// anywhere (and is re-typed by [`coerce_null`](Value::coerce_null) or
    /// [`retype_null`](Value::retype_null)).
    pub fn has_type(&self, declared: &DataType) -> bool {
        self.is_null() || self.data_type().is_some_and(|ty| declared.accepts(&ty))
    }

    /// Give any null the type `declared`; other values pass through.
    #[must_use]
    pub fn retype_null(self, declared: DataType) -> Self {
        match self {
            Value::Null(_) => Value::Null(declared),
            other => other,
        }
    }

    /// Give an untyped null the type `declared`; other values pass through.
    #[must_use]
    pub fn coerce_null(self, declared: DataType) -> Self {
        match self {
            Value::Null(ty) if ty.is_null() => Value::Null(declared),
            other => other,
        }
    }

    /// Scan this value into a slot of type `slot`.
    ///
    /// Nulls of a compatible kind take the slot's type and decimals are
    /// rescaled to it. Any other kind mismatch is an error.
    pub fn conform(self, slot: &DataType) -> ValueResult<Self> {
        let Some(ty) = self.data_type() else {
            return Err(type_mismatch(slot, "record"));
        };
        if !slot.compatible_kind(&ty) {
            return Err(type_mismatch(slot, ty));
        }
        match self {
            Value::Null(_) => Ok(Value::Null(*slot)),
            Value::Decimal(_) | Value::Array(_) if !slot.equals_strict(&ty) && !slot.is_null() => {
                self.cast(*slot)
            }
            other => Ok(other),
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

/// Borrowed view of a value's payload, without its type descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawValue<'a> {
    Null,
    Int(i64),
    Text(&'a str),
    Bool(bool),
    Blob(&'a [u8]),
    Uuid(uuid::Uuid),
    Decimal(Decimal),
    Array(&'a [Value]),
    Record(&'a RecordValue),
}

impl Value {
    /// The raw payload.
    pub fn raw(&self) -> RawValue<'_> {
        match self {
            Value::Null(_) => RawValue::Null,
            Value::Int(i) => RawValue::Int(*i),
            Value::Text(s) => RawValue::Text(s),
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Blob(b) => RawValue::Blob(b),
            Value::Uuid(u) => RawValue::Uuid(*u),
            Value::Decimal(d) => RawValue::Decimal(d.value()),
            Value::Array(a) => RawValue::Array(a.as_slice()),
            Value::Record(r) => RawValue::Record(r),
        }
    }

    /// Rebuild a value of type `data_type` from a raw payload.
    ///
    /// Decimals are rescaled to the declared precision and scale. A payload
    /// of the wrong kind is a type mismatch.
    pub fn from_raw(raw: RawValue<'_>, data_type: DataType) -> ValueResult<Value> {
        use lq_types::BaseType;

        let mismatch = || type_mismatch(data_type, format!("{raw:?}"));
        if data_type.is_array {
            return match raw {
                RawValue::Null => Ok(Value::Null(data_type)),
                RawValue::Array(items) => {
                    ArrayValue::from_items(data_type.element(), items.to_vec()).map(Value::Array)
                }
                _ => Err(mismatch()),
            };
        }
        match (raw, data_type.base) {
            (RawValue::Null, _) => Ok(Value::Null(data_type)),
            (RawValue::Int(i), BaseType::Int) => Ok(Value::Int(i)),
            (RawValue::Text(s), BaseType::Text) => Ok(Value::Text(s.to_string())),
            (RawValue::Bool(b), BaseType::Bool) => Ok(Value::Bool(b)),
            (RawValue::Blob(b), BaseType::Blob) => Ok(Value::Blob(b.to_vec())),
            (RawValue::Uuid(u), BaseType::Uuid) => Ok(Value::Uuid(u)),
            (RawValue::Decimal(d), BaseType::Decimal { precision, scale }) => {
                DecimalValue::with_type(d, precision, scale).map(Value::Decimal)
            }
            _ => Err(mismatch()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(value: uuid::Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<ArrayValue> for Value {
    fn from(value: ArrayValue) -> Self {
        Value::Array(value)
    }
}

impl From<RecordValue> for Value {
    fn from(value: RecordValue) -> Self {
        Value::Record(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => f.write_str("NULL"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Blob(bytes) => {
                f.write_str("\\x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Array(a) => {
                f.write_str("[")?;
                for (i, item) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(r) => {
                f.write_str("{")?;
                for (i, (name, value)) in r.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
