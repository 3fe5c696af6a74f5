use super::*;
use crate::decimal::DecimalValue;
use crate::errors::ValueError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn cmp(a: &Value, b: &Value, op: ComparisonOp) -> Value {
    a.compare(b, op).unwrap()
}

mod three_valued {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equal_with_null_is_null() {
        let null = Value::Null(DataType::INT);
        assert_eq!(
            cmp(&Value::Int(1), &null, ComparisonOp::Equal),
            Value::Null(DataType::BOOL)
        );
        assert_eq!(
            cmp(&null, &Value::Int(1), ComparisonOp::LessThan),
            Value::Null(DataType::BOOL)
        );
    }

    #[test]
    fn null_is_null() {
        let null = Value::Null(DataType::TEXT);
        assert_eq!(cmp(&null, &null, ComparisonOp::Is), Value::Bool(true));
        assert_eq!(
            cmp(&null, &null, ComparisonOp::IsDistinctFrom),
            Value::Bool(false)
        );
    }

    #[test]
    fn null_vs_value() {
        let null = Value::null();
        let one = Value::Int(1);
        assert_eq!(cmp(&null, &one, ComparisonOp::Is), Value::Bool(false));
        assert_eq!(
            cmp(&null, &one, ComparisonOp::IsDistinctFrom),
            Value::Bool(true)
        );
        assert_eq!(
            cmp(&one, &null, ComparisonOp::IsDistinctFrom),
            Value::Bool(true)
        );
    }
}

mod kinds {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mixed_kinds_fail() {
        let result = Value::Int(1).compare(&Value::text("1"), ComparisonOp::Equal);
        assert!(matches!(result, Err(ValueError::TypeMismatch { .. })));
    }

    #[test]
    fn typed_null_of_other_kind_fails() {
        let result = Value::Int(1).compare(&Value::Null(DataType::TEXT), ComparisonOp::Equal);
        assert!(matches!(result, Err(ValueError::TypeMismatch { .. })));
    }

    #[test]
    fn int_ordering() {
        assert_eq!(
            cmp(&Value::Int(1), &Value::Int(2), ComparisonOp::LessThan),
            Value::Bool(true)
        );
        assert_eq!(
            cmp(&Value::Int(1), &Value::Int(2), ComparisonOp::GreaterThan),
            Value::Bool(false)
        );
        assert_eq!(
            cmp(&Value::Int(2), &Value::Int(2), ComparisonOp::IsDistinctFrom),
            Value::Bool(false)
        );
    }

    #[test]
    fn text_ordering_is_bytewise() {
        assert_eq!(
            cmp(&Value::text("B"), &Value::text("a"), ComparisonOp::LessThan),
            Value::Bool(true)
        );
    }

    #[test]
    fn decimals_compare_across_scales() {
        let a = Value::Decimal(DecimalValue::with_type(Decimal::new(150, 2), 3, 2).unwrap());
        let b = Value::Decimal(DecimalValue::with_type(Decimal::new(15, 1), 2, 1).unwrap());
        assert_eq!(cmp(&a, &b, ComparisonOp::Equal), Value::Bool(true));
    }

    #[test]
    fn int_is_unsupported() {
        let result = Value::Int(1).compare(&Value::Int(1), ComparisonOp::Is);
        assert!(matches!(
            result,
            Err(ValueError::UnsupportedComparison { .. })
        ));
    }

    #[test]
    fn bool_is() {
        assert_eq!(
            cmp(&Value::Bool(true), &Value::Bool(true), ComparisonOp::Is),
            Value::Bool(true)
        );
    }

    #[test]
    fn blob_has_no_ordering() {
        let result = Value::blob(vec![1]).compare(&Value::blob(vec![2]), ComparisonOp::LessThan);
        assert!(matches!(
            result,
            Err(ValueError::UnsupportedComparison { .. })
        ));
    }
}

mod arrays {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arr(items: Vec<Value>) -> Value {
        Value::Array(ArrayValue::from_items(DataType::INT, items).unwrap())
    }

    #[test]
    fn equal_arrays() {
        let a = arr(vec![Value::Int(1), Value::null()]);
        let b = arr(vec![Value::Int(1), Value::null()]);
        assert_eq!(cmp(&a, &b, ComparisonOp::Equal), Value::Bool(true));
    }

    #[test]
    fn length_mismatch() {
        let a = arr(vec![Value::Int(1)]);
        let b = arr(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(cmp(&a, &b, ComparisonOp::Equal), Value::Bool(false));
        assert_eq!(
            cmp(&a, &b, ComparisonOp::IsDistinctFrom),
            Value::Bool(true)
        );
    }

    #[test]
    fn null_pairs_with_value() {
        let a = arr(vec![Value::null()]);
        let b = arr(vec![Value::Int(1)]);
        assert_eq!(cmp(&a, &b, ComparisonOp::Equal), Value::Bool(false));
    }

    #[test]
    fn ordering_is_unsupported() {
        let a = arr(vec![Value::Int(1)]);
        assert!(a.compare(&a, ComparisonOp::LessThan).is_err());
    }
}

mod records {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(fields: &[(&str, Value)]) -> Value {
        let mut record = RecordValue::new();
        for (name, value) in fields {
            record.add_field(*name, value.clone()).unwrap();
        }
        Value::Record(record)
    }

    #[test]
    fn order_matters() {
        let a = record(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        let b = record(&[("b", Value::Int(2)), ("a", Value::Int(1))]);
        assert_eq!(cmp(&a, &a, ComparisonOp::Equal), Value::Bool(true));
        assert_eq!(cmp(&a, &b, ComparisonOp::Equal), Value::Bool(false));
    }

    #[test]
    fn mismatched_field_kinds_are_unequal() {
        let a = record(&[("a", Value::Int(1))]);
        let b = record(&[("a", Value::text("1"))]);
        assert_eq!(cmp(&a, &b, ComparisonOp::Equal), Value::Bool(false));
    }
}
