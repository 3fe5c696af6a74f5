//! Explicit type conversion.
//!
//! Casting is the only way to move a value between kinds. A null of any kind
//! casts to a null of the target type without error.

use std::str::FromStr;

use lq_types::{BaseType, DataType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::array::ArrayValue;
use crate::decimal::DecimalValue;
use crate::errors::{cast_parse, invalid_cast, out_of_range, ValueResult};
use crate::value::Value;

/// Boolean spellings accepted when casting from text (case-insensitive).
fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

fn parse_int(input: &str, target: &DataType) -> ValueResult<Value> {
    input
        .trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| cast_parse(input, target))
}

fn parse_decimal(input: &str, precision: u16, scale: u16, target: &DataType) -> ValueResult<Value> {
    let parsed = Decimal::from_str_exact(input.trim()).map_err(|_| cast_parse(input, target))?;
    DecimalValue::with_type(parsed, precision, scale).map(Value::Decimal)
}

impl Value {
    /// Convert this value to `target`.
    pub fn cast(&self, target: DataType) -> ValueResult<Value> {
        if let Value::Null(_) = self {
            return Ok(Value::Null(target));
        }
        if target.is_null() {
            return Err(invalid_cast(self.type_name(), &target));
        }

        match self {
            Value::Record(_) => Err(invalid_cast("record", &target)),
            Value::Array(array) => {
                if !target.is_array {
                    return Err(invalid_cast(array.data_type(), &target));
                }
                let element = target.element();
                let items = array
                    .iter()
                    .map(|item| item.cast(element))
                    .collect::<ValueResult<Vec<_>>>()?;
                ArrayValue::from_items(element, items).map(Value::Array)
            }
            _ if target.is_array => Err(invalid_cast(self.type_name(), &target)),
            _ => self.cast_scalar(target),
        }
    }

    fn cast_scalar(&self, target: DataType) -> ValueResult<Value> {
        let cannot = || invalid_cast(self.type_name(), &target);

        match (self, target.base) {
            (Value::Int(i), BaseType::Int) => Ok(Value::Int(*i)),
            (Value::Int(i), BaseType::Text) => Ok(Value::Text(i.to_string())),
            (Value::Int(i), BaseType::Bool) => Ok(Value::Bool(*i != 0)),
            (Value::Int(i), BaseType::Decimal { precision, scale }) => {
                DecimalValue::with_type(Decimal::from(*i), precision, scale).map(Value::Decimal)
            }

            (Value::Text(s), BaseType::Text) => Ok(Value::Text(s.clone())),
            (Value::Text(s), BaseType::Int) => parse_int(s, &target),
            (Value::Text(s), BaseType::Bool) => parse_bool(s)
                .map(Value::Bool)
                .ok_or_else(|| cast_parse(s.as_str(), &target)),
            (Value::Text(s), BaseType::Decimal { precision, scale }) => {
                parse_decimal(s, precision, scale, &target)
            }
            (Value::Text(s), BaseType::Uuid) => uuid::Uuid::from_str(s.trim())
                .map(Value::Uuid)
                .map_err(|_| cast_parse(s.as_str(), &target)),
            (Value::Text(s), BaseType::Blob) => Ok(Value::Blob(s.as_bytes().to_vec())),

            (Value::Bool(b), BaseType::Bool) => Ok(Value::Bool(*b)),
            (Value::Bool(b), BaseType::Int) => Ok(Value::Int(i64::from(*b))),
            (Value::Bool(b), BaseType::Text) => Ok(Value::Text(b.to_string())),

            (Value::Decimal(d), BaseType::Decimal { precision, scale }) => {
                DecimalValue::with_type(d.value(), precision, scale).map(Value::Decimal)
            }
            (Value::Decimal(d), BaseType::Int) => d
                .value()
                .trunc()
                .to_i64()
                .map(Value::Int)
                .ok_or_else(|| out_of_range(d, "int8")),
            (Value::Decimal(d), BaseType::Text) => Ok(Value::Text(d.to_string())),

            (Value::Uuid(u), BaseType::Uuid) => Ok(Value::Uuid(*u)),
            (Value::Uuid(u), BaseType::Text) => Ok(Value::Text(u.to_string())),
            (Value::Uuid(u), BaseType::Blob) => Ok(Value::Blob(u.as_bytes().to_vec())),

            (Value::Blob(b), BaseType::Blob) => Ok(Value::Blob(b.clone())),
            (Value::Blob(b), BaseType::Text) => String::from_utf8(b.clone())
                .map(Value::Text)
                .map_err(|_| cast_parse(self.to_string(), &target)),
            (Value::Blob(b), BaseType::Int) => match std::str::from_utf8(b) {
                Ok(s) => parse_int(s, &target),
                Err(_) => Err(cast_parse(self.to_string(), &target)),
            },

            _ => Err(cannot()),
        }
    }
}
