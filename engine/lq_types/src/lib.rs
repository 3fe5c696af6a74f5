//! LedgerQL Types - type descriptors for the runtime.
//!
//! Every crate in the workspace agrees on these descriptors: values report
//! their [`DataType`], actions declare [`NamedType`] parameter lists, and the
//! access layer speaks in [`Privilege`]s.
//!
//! # Equality
//!
//! Type equality is always strict. Two decimal types with different precision
//! or scale are different types, and an array type never equals its element
//! type. The only relaxation lives in [`DataType::accepts`], which lets the
//! untyped `NULL` stand in for any type at call boundaries.

mod data_type;
mod modifiers;
mod privilege;

pub use data_type::{BaseType, DataType, NamedType, TypeError, MAX_DECIMAL_PRECISION};
pub use modifiers::{AccessMode, ActionModifiers, ActionReturn};
pub use privilege::Privilege;
