#[cfg(test)]
mod tests {
    use dbset_core::{
        ColumnDescriptor, ColumnType, Context, DbError, Dialect, ErrorKind, Expression, Filter,
        FilterBuilder, FilterValue, GenericSqlWriter, Operand, Order, Ordered, SelectParts,
        SqlWriter, TableDescriptor, Value, filter, row,
    };
    use indoc::indoc;
    use std::collections::BTreeMap;

    const WRITER: GenericSqlWriter = GenericSqlWriter {
        dialect: Dialect::Generic,
    };

    fn people() -> TableDescriptor {
        let mut table = TableDescriptor::new("people");
        table.columns = vec![
            ColumnDescriptor {
                primary_key: true,
                auto_increment: true,
                nullable: false,
                ..ColumnDescriptor::new("id", ColumnType::Integer)
            },
            ColumnDescriptor::new("name", ColumnType::Text),
            ColumnDescriptor::new("age", ColumnType::Integer),
            ColumnDescriptor::new("country", ColumnType::Text),
        ];
        table
    }

    fn render(filter: &Filter) -> String {
        let compiled = FilterBuilder::build(&people(), filter).expect("Filter does not compile");
        let mut out = String::new();
        if let Some(condition) = compiled.condition() {
            condition.write_query(&WRITER, &mut Context::default(), &mut out);
        }
        out
    }

    fn error_kind(filter: &Filter) -> Option<ErrorKind> {
        let error = FilterBuilder::build(&people(), filter)
            .err()
            .expect("The filter must be rejected");
        DbError::kind_of(&error)
    }

    #[test]
    fn macro_and_builder() {
        let adults = filter! {
            "age" => { ">=" => 18, "<" => 65 },
            "country" => "NZ",
            "_order_by" => "-age",
            "_limit" => 10,
        };
        let same = Filter::new()
            .op("age", ">=", 18)
            .op("age", "<", 65)
            .eq("country", "NZ")
            .order_by("-age")
            .limit(10);
        assert_eq!(adults, same);
        assert_eq!(adults.len(), 4);
        assert!(adults.has_conditions());
        assert_eq!(
            adults.get("country"),
            Some(&FilterValue::Literal(Value::Varchar("NZ".into())))
        );

        assert!(filter! {}.is_empty());
        assert!(!filter! { "_limit" => 5, "_offset" => 2 }.has_conditions());

        let replaced = Filter::new().eq("age", 1).op("age", ">", 2).eq("age", 3);
        assert_eq!(replaced.len(), 1);
        assert_eq!(
            replaced.get("age"),
            Some(&FilterValue::Literal(Value::Int64(3)))
        );

        let mut from_row = Filter::from(row! { "name" => "Ann", "age" => 30 });
        assert_eq!(from_row, [("name", "Ann")].into_iter().collect::<Filter>().eq("age", 30));
        assert!(from_row.remove("name").is_some());
        assert_eq!(from_row.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["age"]);
    }

    #[test]
    fn literals() {
        assert_eq!(render(&Filter::new()), "");
        assert_eq!(
            render(&filter! { "age" => 30, "country" => "NZ" }),
            r#""age" = 30 AND "country" = 'NZ'"#
        );
        assert_eq!(
            render(&filter! { "country" => vec!["NZ", "AU"] }),
            r#""country" IN ('NZ', 'AU')"#
        );
        assert_eq!(
            render(&filter! { "country" => None::<String> }),
            r#""country" IS NULL"#
        );
        assert_eq!(
            render(&filter! { "name" => "O'Brien" }),
            r#""name" = 'O''Brien'"#
        );
        assert_eq!(render(&filter! { "age" => Vec::<i64>::new() }), "false");
        assert_eq!(
            render(&Filter::new().with(
                "age",
                Value::Map(BTreeMap::from([(">".to_string(), Value::Int64(3))]))
            )),
            r#""age" > 3"#
        );
        assert_eq!(
            render(&Filter::new().with(
                "age",
                BTreeMap::from([("<=".to_string(), Value::Int64(9))])
            )),
            r#""age" <= 9"#
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            render(&filter! { "age" => { ">=" => 18, "<" => 65 } }),
            r#""age" >= 18 AND "age" < 65"#
        );
        assert_eq!(
            render(&filter! { "age" => { "=" => 1, "==" => 2, "!=" => 3, ">" => 4, "<=" => 5 } }),
            r#""age" = 1 AND "age" = 2 AND "age" != 3 AND "age" > 4 AND "age" <= 5"#
        );
        assert_eq!(
            render(&filter! { "country" => { "!=" => Value::Null } }),
            r#""country" IS NOT NULL"#
        );
        assert_eq!(
            render(&filter! { "country" => { "=" => Value::Null } }),
            r#""country" IS NULL"#
        );
        assert_eq!(
            render(&filter! { "country" => { "is" => Value::Null, "is_not" => Value::Null } }),
            r#""country" IS NULL AND "country" IS NOT NULL"#
        );
        assert_eq!(
            render(&filter! { "age" => { "in" => vec![1, 2], "not_in" => vec![3] } }),
            r#""age" IN (1, 2) AND "age" NOT IN (3)"#
        );
        assert_eq!(
            render(&filter! { "age" => { "in" => Vec::<i64>::new() } }),
            "false"
        );
        assert_eq!(
            render(&filter! { "age" => { "not_in" => Vec::<i64>::new() } }),
            "true"
        );
        assert_eq!(
            render(&filter! { "age" => { "between" => vec![1, 5] } }),
            r#""age" BETWEEN 1 AND 5"#
        );
        assert_eq!(
            render(&filter! { "name" => { "like" => "A%", "ilike" => "%b", "not_like" => "_c" } }),
            r#""name" LIKE 'A%' AND "name" ILIKE '%b' AND "name" NOT LIKE '_c'"#
        );
        assert_eq!(
            render(&filter! { "name" => { "startswith" => "50%_" } }),
            r#""name" LIKE '50\%\_%' ESCAPE '\'"#
        );
        assert_eq!(
            render(&filter! { "name" => { "endswith" => "a\\b" } }),
            r#""name" LIKE '%a\\b' ESCAPE '\'"#
        );
        assert_eq!(
            render(&filter! { "name" => { "contains" => "it's" } }),
            r#""name" LIKE '%it''s%' ESCAPE '\'"#
        );
    }

    #[test]
    fn options() {
        let filter = filter! {
            "age" => { ">" => 1 },
            "_order_by" => vec!["-age", "name"],
            "_limit" => 10,
            "_offset" => 5,
        };
        let compiled = FilterBuilder::build(&people(), &filter).unwrap();
        assert_eq!(
            compiled.options.order_by,
            [
                Ordered {
                    order: Order::DESC,
                    expression: Operand::Column("age".into()),
                },
                Ordered {
                    order: Order::ASC,
                    expression: Operand::Column("name".into()),
                },
            ]
        );
        assert_eq!(compiled.options.limit, Some(10));
        assert_eq!(compiled.options.offset, Some(5));
        let mut out = String::new();
        WRITER.write_select(
            &mut out,
            "people",
            &SelectParts {
                condition: compiled.condition(),
                order_by: &compiled.options.order_by,
                limit: compiled.options.limit,
                offset: compiled.options.offset,
                ..Default::default()
            },
        );
        assert_eq!(
            out,
            indoc! {r#"
                SELECT *
                FROM "people"
                WHERE "age" > 1
                ORDER BY "age" DESC, "name" ASC
                LIMIT 10
                OFFSET 5;
            "#}
            .trim()
        );

        let options =
            FilterBuilder::extract_options(&people(), &filter! { "_limit" => Value::Null })
                .unwrap();
        assert_eq!(options, Default::default());

        let options =
            FilterBuilder::extract_options(&people(), &Filter::new().limit(u64::MAX).offset(3))
                .expect("Large limits are clamped");
        assert_eq!(options.limit, Some(i64::MAX as u64));
        assert_eq!(options.offset, Some(3));
    }

    #[test]
    fn equalities() {
        let mut out = String::new();
        let condition = FilterBuilder::equalities(&row! { "name" => "Ann", "country" => Value::Null })
            .expect("There must be a condition");
        condition.write_query(&WRITER, &mut Context::default(), &mut out);
        assert_eq!(out, r#""name" = 'Ann' AND "country" IS NULL"#);
        assert!(FilterBuilder::equalities(&row! {}).is_none());
    }

    #[test]
    fn malformed() {
        let query = Some(ErrorKind::Query);
        assert_eq!(error_kind(&filter! { "missing" => 1 }), query);
        assert_eq!(error_kind(&filter! { "age" => { "~" => 1 } }), query);
        assert_eq!(error_kind(&filter! { "age" => { ">" => vec![1] } }), query);
        assert_eq!(error_kind(&filter! { "age" => { "in" => 1 } }), query);
        assert_eq!(error_kind(&filter! { "age" => { "between" => vec![1, 2, 3] } }), query);
        assert_eq!(
            error_kind(&filter! { "age" => { "between" => vec![Value::Null, Value::Int64(1)] } }),
            query
        );
        assert_eq!(error_kind(&filter! { "name" => { "like" => 1 } }), query);
        assert_eq!(error_kind(&filter! { "name" => { "is" => "x" } }), query);
        assert_eq!(error_kind(&filter! { "_limit" => -1 }), query);
        assert_eq!(error_kind(&filter! { "_offset" => "1" }), query);
        assert_eq!(error_kind(&filter! { "_order_by" => "-missing" }), query);
        assert_eq!(error_kind(&filter! { "_order_by" => 5 }), query);
        assert_eq!(error_kind(&filter! { "_order_by" => vec![Value::Int64(1)] }), query);

        let error = FilterBuilder::build(&people(), &filter! { "age" => { "~" => 1 } })
            .err()
            .expect("Unknown operator");
        let message = error.to_string();
        assert!(message.ends_with("between, is, is_not"), "{}", message);
        assert_eq!(message.matches("is_not").count(), 1, "{}", message);
    }
}
