#[cfg(test)]
mod tests {
    use dbset_core::{
        ColumnType, DbError, Dialect, ErrorKind, MAX_DECIMAL_PRECISION, TypeInference, Value, row,
    };
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    #[test]
    fn infer_scalars() {
        let infer = |v: Value| TypeInference::infer_type(&v, Dialect::Generic).unwrap();
        assert_eq!(infer(Value::Null), ColumnType::Text);
        assert_eq!(infer(Value::Boolean(false)), ColumnType::Boolean);
        assert_eq!(infer(Value::Int64(-5)), ColumnType::Integer);
        assert_eq!(infer(Value::Float64(0.5)), ColumnType::Float);
        assert_eq!(infer(Value::Varchar("x".into())), ColumnType::Text);
        assert_eq!(infer(Value::Uuid(Uuid::nil())), ColumnType::Text);
        assert_eq!(infer(Value::Blob(vec![1, 2].into())), ColumnType::Text);
        assert_eq!(infer(Value::Date(date!(2000 - 01 - 01))), ColumnType::Date);
        assert_eq!(
            infer(Value::Timestamp(datetime!(2000 - 01 - 01 12:00))),
            ColumnType::Timestamp
        );
        assert_eq!(
            infer(Value::Decimal(Decimal::new(12345, 2))),
            ColumnType::Decimal(Some((5, 2)))
        );
        assert_eq!(
            infer(Value::Decimal(Decimal::new(5, 3))),
            ColumnType::Decimal(Some((3, 3)))
        );
        assert_eq!(
            infer(Value::Decimal(Decimal::ZERO)),
            ColumnType::Decimal(Some((1, 0)))
        );
        assert_eq!(
            infer(Value::Decimal(Decimal::MAX)),
            ColumnType::Decimal(Some((29, 0)))
        );
    }

    #[test]
    fn infer_structured() {
        let list = Value::from(vec![1, 2, 3]);
        assert_eq!(
            TypeInference::infer_type(&list, Dialect::Generic).unwrap(),
            ColumnType::Json
        );
        assert_eq!(
            TypeInference::infer_type(&list, Dialect::Sqlite).unwrap(),
            ColumnType::Json
        );
        assert_eq!(
            TypeInference::infer_type(&list, Dialect::Postgres).unwrap(),
            ColumnType::Jsonb
        );
        let map = Value::Map(BTreeMap::from([(
            "raw".to_string(),
            Value::Blob(vec![0].into()),
        )]));
        let error = TypeInference::infer_type(&map, Dialect::Generic).unwrap_err();
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TypeInference));
    }

    #[test]
    fn merge() {
        use ColumnType::*;
        let merge = TypeInference::merge_types;
        assert_eq!(merge(&Integer, &Integer), Integer);
        assert_eq!(merge(&Integer, &Float), Float);
        assert_eq!(merge(&Float, &Integer), Float);
        assert_eq!(merge(&Integer, &Decimal(Some((5, 2)))), Decimal(Some((5, 2))));
        assert_eq!(merge(&Decimal(Some((5, 2))), &Float), Float);
        assert_eq!(
            merge(&Decimal(Some((5, 2))), &Decimal(Some((4, 3)))),
            Decimal(Some((6, 3)))
        );
        assert_eq!(merge(&Decimal(Some((5, 2))), &Decimal(None)), Decimal(None));
        assert_eq!(merge(&String(36), &String(10)), String(36));
        assert_eq!(merge(&String(36), &Text), Text);
        assert_eq!(merge(&Date, &Timestamp), Timestamp);
        assert_eq!(merge(&Json, &Jsonb), Jsonb);
        assert_eq!(merge(&Boolean, &Integer), Text);
        assert_eq!(merge(&Integer, &Date), Text);
        assert_eq!(merge(&Json, &Text), Text);
        assert_eq!(merge(&Blob, &Text), Text);
        assert_eq!(
            merge(&Decimal(Some((MAX_DECIMAL_PRECISION, 0))), &Decimal(Some((10, 10)))),
            Decimal(Some((MAX_DECIMAL_PRECISION, 10)))
        );

        let all = [Integer, Float, Decimal(Some((3, 1))), Boolean, Date, Timestamp, Text, Json];
        for a in &all {
            for b in &all {
                assert_eq!(merge(a, b), merge(b, a), "{} {}", a, b);
                for c in &all {
                    assert_eq!(
                        merge(&merge(a, b), c),
                        merge(a, &merge(b, c)),
                        "{} {} {}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
        assert_eq!(TypeInference::merge_all([&Integer, &Float, &Integer]), Some(Float));
        assert_eq!(TypeInference::merge_all([]), None);
    }

    #[test]
    fn rows() {
        let row = row! { "name" => "Ann", "age" => 30, "score" => 1.5 };
        assert_eq!(
            TypeInference::infer_types_from_row(&row, Dialect::Sqlite).unwrap(),
            [
                ("name".to_string(), ColumnType::Text),
                ("age".to_string(), ColumnType::Integer),
                ("score".to_string(), ColumnType::Float),
            ]
        );
        let rows = [
            row! { "a" => 1, "b" => Value::Null },
            row! { "a" => 2.5, "c" => "x" },
            row! { "b" => Value::Null, "a" => 3 },
        ];
        assert_eq!(
            TypeInference::infer_types_from_rows(&rows, Dialect::Generic).unwrap(),
            [
                ("a".to_string(), Some(ColumnType::Float)),
                ("b".to_string(), None),
                ("c".to_string(), Some(ColumnType::Text)),
            ]
        );
        let rows = [row! { "when" => date!(2020 - 01 - 01) }, row! { "when" => true }];
        assert_eq!(
            TypeInference::infer_types_from_rows(&rows, Dialect::Generic).unwrap(),
            [("when".to_string(), Some(ColumnType::Text))]
        );
    }
}
