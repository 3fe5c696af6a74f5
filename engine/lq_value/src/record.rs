//! Ordered name → value rows.

use crate::errors::{ValueError, ValueResult};
use crate::value::Value;

/// One row: fields in declaration order, addressable by name.
///
/// Field order is part of a record's identity; two records with the same
/// fields in a different order are not equal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordValue {
    fields: Vec<(String, Value)>,
}

impl RecordValue {
    pub fn new() -> Self {
        RecordValue { fields: Vec::new() }
    }

    /// Append a field. Names must be unique within the record.
    pub fn add_field(&mut self, name: impl Into<String>, value: Value) -> ValueResult<()> {
        let name = name.into();
        if self.fields.iter().any(|(existing, _)| *existing == name) {
            return Err(ValueError::DuplicateField { name });
        }
        self.fields.push((name, value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Field values in order, dropping the names.
    pub fn into_values(self) -> Vec<Value> {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }
}
