//! Data type descriptors.

use std::fmt;

/// Largest decimal precision the runtime can represent exactly.
///
/// Decimal payloads use a 96-bit mantissa, which holds 28 significant digits.
pub const MAX_DECIMAL_PRECISION: u16 = 28;

/// Errors raised while constructing type descriptors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("invalid decimal precision {precision}: must be between 1 and 28")]
    InvalidPrecision { precision: u16 },
    #[error("invalid decimal scale {scale}: must not exceed precision {precision}")]
    InvalidScale { precision: u16, scale: u16 },
}

/// The scalar kind underlying a [`DataType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// Type of an untyped `NULL` literal.
    Null,
    Int,
    Text,
    Bool,
    Blob,
    Uuid,
    Decimal { precision: u16, scale: u16 },
}

impl BaseType {
    /// Short name used in diagnostics (`int8`, `numeric`, ...).
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Null => "null",
            BaseType::Int => "int8",
            BaseType::Text => "text",
            BaseType::Bool => "bool",
            BaseType::Blob => "bytea",
            BaseType::Uuid => "uuid",
            BaseType::Decimal { .. } => "numeric",
        }
    }

    /// Whether both sides are the same kind, ignoring decimal precision and scale.
    #[inline]
    pub fn same_kind(self, other: BaseType) -> bool {
        std::mem::discriminant(&self) == std::mem::discriminant(&other)
    }
}

/// A runtime type: a base kind plus an array flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataType {
    pub base: BaseType,
    pub is_array: bool,
}

impl DataType {
    pub const NULL: DataType = DataType::scalar(BaseType::Null);
    pub const INT: DataType = DataType::scalar(BaseType::Int);
    pub const TEXT: DataType = DataType::scalar(BaseType::Text);
    pub const BOOL: DataType = DataType::scalar(BaseType::Bool);
    pub const BLOB: DataType = DataType::scalar(BaseType::Blob);
    pub const UUID: DataType = DataType::scalar(BaseType::Uuid);
    pub const INT_ARRAY: DataType = DataType::array(BaseType::Int);
    pub const TEXT_ARRAY: DataType = DataType::array(BaseType::Text);
    pub const BOOL_ARRAY: DataType = DataType::array(BaseType::Bool);

    /// A non-array type of the given kind.
    pub const fn scalar(base: BaseType) -> Self {
        DataType {
            base,
            is_array: false,
        }
    }

    /// An array type with elements of the given kind.
    pub const fn array(base: BaseType) -> Self {
        DataType {
            base,
            is_array: true,
        }
    }

    /// A `numeric(precision, scale)` type, validating its bounds.
    pub fn decimal(precision: u16, scale: u16) -> Result<Self, TypeError> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(TypeError::InvalidPrecision { precision });
        }
        if scale > precision {
            return Err(TypeError::InvalidScale { precision, scale });
        }
        Ok(DataType::scalar(BaseType::Decimal { precision, scale }))
    }

    /// The array form of this type.
    #[must_use]
    pub const fn as_array(self) -> Self {
        DataType::array(self.base)
    }

    /// The element type of an array type (identity for scalars).
    #[must_use]
    pub const fn element(self) -> Self {
        DataType::scalar(self.base)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.base, BaseType::Null)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        !self.is_array && matches!(self.base, BaseType::Int | BaseType::Decimal { .. })
    }

    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self.base, BaseType::Decimal { .. })
    }

    /// Strict equality: kind, array flag, precision and scale must all match.
    #[inline]
    pub fn equals_strict(&self, other: &DataType) -> bool {
        self == other
    }

    /// Whether a value of type `actual` may be bound where `self` is declared.
    ///
    /// This is strict equality, except that the untyped null is accepted
    /// everywhere.
    #[inline]
    pub fn accepts(&self, actual: &DataType) -> bool {
        actual.is_null() || self.equals_strict(actual)
    }

    /// Whether two types share a kind, so that a null of one may meet the other.
    #[inline]
    pub fn compatible_kind(&self, other: &DataType) -> bool {
        self.is_null()
            || other.is_null()
            || (self.is_array == other.is_array && self.base.same_kind(other.base))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            BaseType::Decimal { precision, scale } => write!(f, "numeric({precision},{scale})")?,
            other => f.write_str(other.name())?,
        }
        if self.is_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// A named, typed slot: a parameter, a return field, or a table column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub name: String,
    pub data_type: DataType,
}

impl NamedType {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        NamedType {
            name: name.into(),
            data_type,
        }
    }
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)
    }
}
