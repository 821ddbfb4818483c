#[cfg(test)]
mod tests {
    use dbset_core::{AsValue, ColumnType, Row, Value, row};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(1).as_bool(), None);
        assert_eq!(Value::from(7_u8), Value::Int64(7));
        assert_eq!(Value::from(1.5_f32), Value::Float64(1.5));
        assert_eq!(Value::from("text"), Value::Varchar("text".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int64(1), Value::Int64(2)])
        );
        assert_eq!(
            Value::from(BTreeMap::from([("a".to_string(), 1)])),
            Value::Map(BTreeMap::from([("a".to_string(), Value::Int64(1))]))
        );

        assert_eq!(i8::try_from_value(Value::Int64(127)).unwrap(), 127);
        assert!(i8::try_from_value(Value::Int64(128)).is_err());
        assert_eq!(i64::try_from_value(Value::Float64(3.0)).unwrap(), 3);
        assert!(i64::try_from_value(Value::Float64(3.5)).is_err());
        assert_eq!(bool::try_from_value(Value::Int64(1)).unwrap(), true);
        assert!(bool::try_from_value(Value::Int64(2)).is_err());
        assert_eq!(f64::try_from_value(Value::Int64(2)).unwrap(), 2.0);
        assert_eq!(
            Decimal::try_from_value(Value::Varchar("12.50".into())).unwrap(),
            Decimal::new(1250, 2)
        );
        assert_eq!(
            time::Date::try_from_value(Value::Varchar("2024-02-29".into())).unwrap(),
            date!(2024 - 02 - 29)
        );
        assert_eq!(
            time::PrimitiveDateTime::try_from_value(Value::Varchar(
                "2024-02-29T10:20:30.5".into()
            ))
            .unwrap(),
            datetime!(2024 - 02 - 29 10:20:30.5)
        );
        let uuid = Uuid::new_v4();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(uuid.to_string())).unwrap(),
            uuid
        );
        assert_eq!(Option::<i32>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Vec::<String>::try_from_value(Value::from(vec!["a", "b"])).unwrap(),
            ["a", "b"]
        );
        let error = String::try_from_value(Value::Int64(1)).unwrap_err();
        assert!(format!("{:#}", error).contains("integer"));
    }

    #[test]
    fn value_json() {
        let value = Value::Map(BTreeMap::from([
            ("list".to_string(), Value::from(vec![1, 2])),
            ("price".to_string(), Value::Decimal(Decimal::new(105, 1))),
            ("day".to_string(), Value::Date(date!(2024 - 01 - 02))),
        ]));
        assert_eq!(
            value.to_json_string().unwrap(),
            r#"{"day":"2024-01-02","list":[1,2],"price":"10.5"}"#
        );
        assert!(Value::Blob(vec![1].into()).to_json().is_err());
        assert!(
            Value::List(vec![Value::Float64(f64::NAN)])
                .to_json()
                .is_err()
        );
        assert_eq!(
            Value::from_json(serde_json::json!({ "a": [true, 1.5, null] })),
            Value::Map(BTreeMap::from([(
                "a".to_string(),
                Value::List(vec![Value::Boolean(true), Value::Float64(1.5), Value::Null])
            )]))
        );
    }

    #[test]
    fn conform() {
        assert_eq!(
            ColumnType::Boolean.conform(Value::Int64(0)),
            Value::Boolean(false)
        );
        assert_eq!(
            ColumnType::Float.conform(Value::Int64(2)),
            Value::Float64(2.0)
        );
        assert_eq!(
            ColumnType::Decimal(Some((6, 2))).conform(Value::Float64(12.5)),
            Value::Decimal(Decimal::new(1250, 2))
        );
        assert_eq!(
            ColumnType::Date.conform(Value::Varchar("2020-05-06".into())),
            Value::Date(date!(2020 - 05 - 06))
        );
        assert_eq!(
            ColumnType::Timestamp.conform(Value::Varchar("2020-05-06 07:08:09".into())),
            Value::Timestamp(datetime!(2020 - 05 - 06 07:08:09))
        );
        assert_eq!(
            ColumnType::Json.conform(Value::Varchar("[1,\"a\"]".into())),
            Value::List(vec![Value::Int64(1), Value::Varchar("a".into())])
        );
        assert_eq!(
            ColumnType::Json.conform(Value::Varchar("not json".into())),
            Value::Varchar("not json".into())
        );
        assert_eq!(ColumnType::Integer.conform(Value::Null), Value::Null);
    }

    #[test]
    fn column_types() {
        for (declared, expected) in [
            ("INTEGER", ColumnType::Integer),
            ("bigint", ColumnType::Integer),
            ("BIGSERIAL", ColumnType::Integer),
            ("REAL", ColumnType::Float),
            ("double precision", ColumnType::Float),
            ("NUMERIC(10, 2)", ColumnType::Decimal(Some((10, 2)))),
            ("DECIMAL", ColumnType::Decimal(None)),
            ("BOOLEAN", ColumnType::Boolean),
            ("VARCHAR(36)", ColumnType::String(36)),
            ("character varying", ColumnType::Text),
            ("TEXT", ColumnType::Text),
            ("TIMESTAMP WITHOUT TIME ZONE", ColumnType::Timestamp),
            ("DATE", ColumnType::Date),
            ("JSON", ColumnType::Json),
            ("jsonb", ColumnType::Jsonb),
            ("BLOB", ColumnType::Blob),
            ("BYTEA", ColumnType::Blob),
        ] {
            assert_eq!(ColumnType::from_sql_type(declared), expected, "{}", declared);
        }
        assert_eq!(ColumnType::Decimal(Some((10, 2))).to_string(), "DECIMAL(10,2)");
        assert_eq!(ColumnType::String(36).to_string(), "VARCHAR(36)");
    }

    #[test]
    fn rows() {
        let mut row = row! { "name" => "Ann", "age" => 30, "email" => None::<String> };
        assert_eq!(row.len(), 3);
        assert_eq!(row["name"], Value::Varchar("Ann".into()));
        assert_eq!(row["missing"], Value::Null);
        assert_eq!(row.get_as::<i32>("age").unwrap(), 30);
        assert_eq!(row.get_as::<Option<String>>("email").unwrap(), None);
        let error = row.get_as::<i32>("name").unwrap_err();
        assert!(format!("{:#}", error).contains("`name`"));
        assert_eq!(row.insert("age", 31), Some(Value::Int64(30)));
        assert_eq!(row.columns().collect::<Vec<_>>(), ["name", "age", "email"]);
        assert_eq!(
            row.filtered(|k| k != "email").columns().collect::<Vec<_>>(),
            ["name", "age"]
        );
        assert_eq!(row.remove("name"), Some(Value::Varchar("Ann".into())));
        assert!(!row.contains("name"));
        let collected = [("a", 1), ("b", 2)].into_iter().collect::<Row>();
        assert_eq!(collected, row! { "a" => 1, "b" => 2 });
    }
}
