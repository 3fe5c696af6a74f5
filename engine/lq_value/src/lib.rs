//! LedgerQL Value - the runtime value algebra.
//!
//! A closed sum type ([`Value`]) with SQL semantics:
//!
//! - **Three-valued logic**: comparisons involving null return null, except
//!   `IS` and `IS DISTINCT FROM`, which always decide.
//! - **Null propagation**: arithmetic and unary operators on a null scalar
//!   return a null of the same type rather than failing.
//! - **No implicit coercion**: combining two different kinds is a
//!   [`ValueError::TypeMismatch`], even when a conversion exists. Conversion
//!   happens only through [`Value::cast`].
//! - **Determinism**: integer arithmetic is checked, decimals are exact
//!   fixed-point, and no operation depends on platform or locale.
//!
//! Arrays ([`ArrayValue`]) are 1-indexed and grow on out-of-range writes.
//! Records ([`RecordValue`]) are ordered rows.

mod arithmetic;
mod array;
mod cast;
mod compare;
mod decimal;
pub mod errors;
mod ops;
mod record;
mod value;

pub use array::{ArrayValue, MAX_ARRAY_LEN};
pub use decimal::DecimalValue;
pub use errors::{ValueError, ValueResult};
pub use ops::{ArithmeticOp, ComparisonOp, UnaryOp};
pub use record::RecordValue;
pub use value::{RawValue, Value};

// Re-export so downstream crates build decimals and UUIDs without naming
// the payload crates themselves.
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
