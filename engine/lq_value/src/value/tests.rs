use super::*;
use pretty_assertions::assert_eq;

mod conform {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_takes_slot_type() {
        assert_eq!(
            Value::null().conform(&DataType::TEXT).unwrap(),
            Value::Null(DataType::TEXT)
        );
    }

    #[test]
    fn decimal_rescales_to_slot() {
        let slot = DataType::decimal(6, 3).unwrap();
        let value = Value::decimal(Decimal::new(15, 1)).unwrap();
        let scanned = value.conform(&slot).unwrap();
        assert_eq!(scanned.to_string(), "1.500");
        assert_eq!(scanned.data_type(), Some(slot));
    }

    #[test]
    fn kind_mismatch_fails() {
        assert!(Value::Int(1).conform(&DataType::TEXT).is_err());
        assert!(Value::Record(RecordValue::new()).conform(&DataType::INT).is_err());
    }
}

mod raw {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn payload_views() {
        assert_eq!(Value::Int(3).raw(), RawValue::Int(3));
        assert_eq!(Value::text("x").raw(), RawValue::Text("x"));
        assert_eq!(Value::Null(DataType::INT).raw(), RawValue::Null);
    }

    #[test]
    fn rebuild_with_type() {
        let value = Value::from_raw(RawValue::Int(9), DataType::INT).unwrap();
        assert_eq!(value, Value::Int(9));
        let null = Value::from_raw(RawValue::Null, DataType::BOOL).unwrap();
        assert_eq!(null, Value::Null(DataType::BOOL));
    }

    #[test]
    fn rebuild_decimal_rescales() {
        let ty = DataType::decimal(4, 2).unwrap();
        let value = Value::from_raw(RawValue::Decimal(Decimal::new(5, 0)), ty).unwrap();
        assert_eq!(value.to_string(), "5.00");
    }

    #[test]
    fn wrong_kind_fails() {
        assert!(Value::from_raw(RawValue::Bool(true), DataType::INT).is_err());
        assert!(Value::from_raw(RawValue::Int(1), DataType::INT_ARRAY).is_err());
    }
}

mod display {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blobs_are_hex() {
        assert_eq!(Value::blob(vec![0x0a, 0xff]).to_string(), "\\x0aff");
    }

    #[test]
    fn records_list_fields() {
        let mut record = RecordValue::new();
        record.add_field("id", Value::Int(1)).unwrap();
        record.add_field("name", Value::text("a")).unwrap();
        assert_eq!(Value::Record(record).to_string(), "{id: 1, name: a}");
    }
}
