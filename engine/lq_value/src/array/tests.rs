use super::*;
use crate::decimal::DecimalValue;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn ints(values: &[i64]) -> ArrayValue {
    ArrayValue::from_items(DataType::INT, values.iter().copied().map(Value::Int).collect()).unwrap()
}

#[test]
fn test_index_is_one_based() {
    let array = ints(&[10, 20, 30]);
    assert_eq!(array.index(1).unwrap(), Value::Int(10));
    assert_eq!(array.index(3).unwrap(), Value::Int(30));
}

#[test]
fn test_index_out_of_bounds() {
    let array = ints(&[10]);
    assert_eq!(
        array.index(0),
        Err(ValueError::IndexOutOfBounds { index: 0, len: 1 })
    );
    assert_eq!(
        array.index(2),
        Err(ValueError::IndexOutOfBounds { index: 2, len: 1 })
    );
}

#[test]
fn test_set_extends_with_nulls() {
    let mut array = ints(&[1]);
    array.set(4, Value::Int(4)).unwrap();
    assert_eq!(array.len(), 4);
    assert_eq!(array.index(2).unwrap(), Value::Null(DataType::INT));
    assert_eq!(array.index(3).unwrap(), Value::Null(DataType::INT));
    assert_eq!(array.index(4).unwrap(), Value::Int(4));
}

#[test]
fn test_set_rejects_non_positive_index() {
    let mut array = ints(&[1]);
    assert_eq!(
        array.set(0, Value::Int(9)),
        Err(ValueError::InvalidIndex { index: 0 })
    );
}

#[test]
fn test_set_rejects_index_past_max_len() {
    let mut array = ints(&[1]);
    assert_eq!(
        array.set(i64::MAX, Value::Int(5)),
        Err(ValueError::ArrayTooLong {
            index: i64::MAX,
            max: MAX_ARRAY_LEN,
        })
    );
    let past = i64::try_from(MAX_ARRAY_LEN).unwrap() + 1;
    assert!(matches!(
        array.set(past, Value::Int(5)),
        Err(ValueError::ArrayTooLong { .. })
    ));
    assert_eq!(array.len(), 1);
}

#[test]
fn test_set_at_max_len() {
    let mut array = ints(&[]);
    let last = i64::try_from(MAX_ARRAY_LEN).unwrap();
    array.set(last, Value::Int(5)).unwrap();
    assert_eq!(array.len(), MAX_ARRAY_LEN);
    assert!(matches!(
        array.push(Value::Int(6)),
        Err(ValueError::ArrayTooLong { .. })
    ));
}

#[test]
fn test_set_rejects_other_kind() {
    let mut array = ints(&[1]);
    assert!(matches!(
        array.set(1, Value::text("x")),
        Err(ValueError::TypeMismatch { .. })
    ));
    assert!(matches!(
        array.set(1, Value::Null(DataType::TEXT)),
        Err(ValueError::TypeMismatch { .. })
    ));
}

#[test]
fn test_null_elements_take_element_type() {
    let mut array = ints(&[1]);
    array.set(1, Value::null()).unwrap();
    assert_eq!(array.index(1).unwrap(), Value::Null(DataType::INT));
}

#[test]
fn test_lift_uses_first_typed_item() {
    let array = ArrayValue::lift(vec![Value::null(), Value::text("a")]).unwrap();
    assert_eq!(array.element_type(), DataType::TEXT);
    assert_eq!(array.index(1).unwrap(), Value::Null(DataType::TEXT));
}

#[test]
fn test_lift_rejects_mixed_kinds() {
    let result = ArrayValue::lift(vec![Value::Int(1), Value::Bool(true)]);
    assert!(matches!(result, Err(ValueError::TypeMismatch { .. })));
}

#[test]
fn test_lift_rejects_nested_arrays() {
    let inner = Value::Array(ints(&[1]));
    assert!(matches!(
        ArrayValue::lift(vec![inner]),
        Err(ValueError::NotScalar { .. })
    ));
}

#[test]
fn test_lift_empty_fails() {
    assert_eq!(ArrayValue::lift(Vec::new()), Err(ValueError::EmptyArray));
}

#[test]
fn test_lift_widens_decimals() {
    let a = Value::Decimal(DecimalValue::with_type(Decimal::new(15, 1), 2, 1).unwrap());
    let b = Value::Decimal(DecimalValue::with_type(Decimal::new(12_345, 3), 5, 3).unwrap());
    let array = ArrayValue::lift(vec![a, b]).unwrap();
    assert_eq!(array.element_type(), DataType::decimal(5, 3).unwrap());
    assert_eq!(array.index(1).unwrap().to_string(), "1.500");
}
