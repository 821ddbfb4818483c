#[cfg(test)]
mod tests {
    use dbset_core::{
        BinaryOp, BinaryOpType, ColumnDescriptor, ColumnType, Context, Dialect, Expression,
        FilterBuilder, GenericSqlWriter, IndexDescriptor, IndexOptions, Operand, SelectParts,
        SqlWriter, TableDescriptor, Value, row,
    };
    use indoc::indoc;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    const WRITER: GenericSqlWriter = GenericSqlWriter {
        dialect: Dialect::Generic,
    };

    fn equal(column: &str, value: i64) -> BinaryOp<Operand, Operand> {
        BinaryOp {
            op: BinaryOpType::Equal,
            lhs: Operand::Column(column.into()),
            rhs: Operand::Variable(Value::Int64(value)),
        }
    }

    #[test]
    fn create_table() {
        let mut query = String::new();
        WRITER.write_create_table(
            &mut query,
            "users",
            &[
                ColumnDescriptor {
                    nullable: false,
                    primary_key: true,
                    auto_increment: true,
                    ..ColumnDescriptor::new("id", ColumnType::Integer)
                },
                ColumnDescriptor {
                    nullable: false,
                    ..ColumnDescriptor::new("name", ColumnType::Text)
                },
                ColumnDescriptor::new("balance", ColumnType::Decimal(Some((10, 2)))),
                ColumnDescriptor::new("ratio", ColumnType::Float),
                ColumnDescriptor::new("code", ColumnType::String(36)),
                ColumnDescriptor::new("active", ColumnType::Boolean),
                ColumnDescriptor::new("born", ColumnType::Date),
                ColumnDescriptor::new("seen", ColumnType::Timestamp),
                ColumnDescriptor::new("tags", ColumnType::Json),
                ColumnDescriptor::new("raw", ColumnType::Blob),
            ],
            true,
        );
        assert_eq!(
            query,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "users" (
                "id" BIGSERIAL PRIMARY KEY,
                "name" TEXT NOT NULL,
                "balance" NUMERIC(10,2),
                "ratio" DOUBLE PRECISION,
                "code" VARCHAR(36),
                "active" BOOLEAN,
                "born" DATE,
                "seen" TIMESTAMP,
                "tags" JSON,
                "raw" BYTEA);
            "#}
            .trim()
        );

        let mut query = String::new();
        WRITER.write_create_table(
            &mut query,
            "keys",
            &[ColumnDescriptor {
                nullable: false,
                primary_key: true,
                ..ColumnDescriptor::new("id", ColumnType::String(36))
            }],
            false,
        );
        assert_eq!(query, "CREATE TABLE \"keys\" (\n\"id\" VARCHAR(36) PRIMARY KEY);");
    }

    #[test]
    fn alter_table() {
        let mut table = TableDescriptor::new("users");
        table.columns = vec![ColumnDescriptor::new("age", ColumnType::Integer)];
        let mut query = String::new();
        WRITER.write_add_column(
            &mut query,
            "users",
            &ColumnDescriptor::new("email", ColumnType::Text),
        );
        WRITER.write_alter_column_type(&mut query, &table, "age", &ColumnType::Float);
        WRITER.write_alter_column_type_recovery(&mut query);
        WRITER.write_drop_table(&mut query, "users", true);
        WRITER.write_drop_table(&mut query, "other", false);
        assert_eq!(
            query,
            indoc! {r#"
                ALTER TABLE "users" ADD COLUMN "email" TEXT;
                ALTER TABLE "users" ALTER COLUMN "age" TYPE DOUBLE PRECISION USING CAST("age" AS DOUBLE PRECISION);
                DROP TABLE IF EXISTS "users";
                DROP TABLE "other";
            "#}
            .trim()
        );
    }

    #[test]
    fn create_index() {
        let mut query = String::new();
        WRITER.write_create_index(
            &mut query,
            "users",
            &IndexDescriptor {
                name: "idx_users_email".into(),
                columns: vec!["email".into()],
                unique: true,
                definition: None,
            },
            &IndexOptions::new()
                .unique(true)
                .predicate("\"email\" IS NOT NULL")
                .text_prefix("email", 191),
            true,
        );
        WRITER.write_create_index(
            &mut query,
            "users",
            &IndexDescriptor {
                name: "by_name".into(),
                columns: vec!["last".into(), "first".into()],
                unique: false,
                definition: None,
            },
            &IndexOptions::new(),
            false,
        );
        assert_eq!(
            query,
            indoc! {r#"
                CREATE UNIQUE INDEX IF NOT EXISTS "idx_users_email" ON "users" ("email"(191)) WHERE "email" IS NOT NULL;
                CREATE INDEX "by_name" ON "users" ("last", "first");
            "#}
            .trim()
        );
    }

    #[test]
    fn select_and_count() {
        let mut query = String::new();
        WRITER.write_select(
            &mut query,
            "users",
            &SelectParts {
                columns: &["city".to_string(), "country".to_string()],
                distinct: true,
                ..Default::default()
            },
        );
        let condition = equal("id", 1);
        WRITER.write_count(&mut query, "users", Some(&condition));
        WRITER.write_count(&mut query, "users", None);
        WRITER.write_select(
            &mut query,
            "users",
            &SelectParts {
                offset: Some(20),
                ..Default::default()
            },
        );
        assert_eq!(
            query,
            indoc! {r#"
                SELECT DISTINCT "city", "country"
                FROM "users";
                SELECT COUNT(*) AS "count"
                FROM "users"
                WHERE "id" = 1;
                SELECT COUNT(*) AS "count"
                FROM "users";
                SELECT *
                FROM "users"
                OFFSET 20;
            "#}
            .trim()
        );
    }

    #[test]
    fn insert_update_delete() {
        let mut query = String::new();
        WRITER.write_insert(
            &mut query,
            "users",
            &["name".to_string(), "age".to_string()],
            &[
                row! { "name" => "Ann", "age" => 30 },
                row! { "name" => "Bob" },
            ],
        );
        WRITER.write_insert(&mut query, "users", &[], &[row! {}]);
        WRITER.write_insert(&mut query, "users", &["name".to_string()], &[]);
        let condition = FilterBuilder::equalities(&row! { "id" => 7 });
        WRITER.write_update(
            &mut query,
            "users",
            &row! { "age" => 31, "name" => "O'Neil" },
            condition.as_deref(),
        );
        WRITER.write_delete(&mut query, "users", condition.as_deref());
        WRITER.write_delete(&mut query, "users", None);
        assert_eq!(
            query,
            indoc! {r#"
                INSERT INTO "users" ("name", "age") VALUES
                ('Ann', 30),
                ('Bob', NULL);
                INSERT INTO "users" DEFAULT VALUES;
                UPDATE "users"
                SET "age" = 31, "name" = 'O''Neil'
                WHERE "id" = 7;
                DELETE FROM "users"
                WHERE "id" = 7;
                DELETE FROM "users";
            "#}
            .trim()
        );
    }

    #[test]
    fn transactions() {
        let mut query = String::new();
        WRITER.write_transaction_begin(&mut query);
        WRITER.write_savepoint(&mut query, "step");
        WRITER.write_rollback_to_savepoint(&mut query, "step");
        WRITER.write_release_savepoint(&mut query, "step");
        WRITER.write_transaction_commit(&mut query);
        WRITER.write_transaction_rollback(&mut query);
        assert_eq!(
            query,
            "BEGIN;SAVEPOINT \"step\";ROLLBACK TO SAVEPOINT \"step\";RELEASE SAVEPOINT \"step\";COMMIT;ROLLBACK;"
        );
    }

    #[test]
    fn values() {
        let mut out = String::new();
        let mut context = Context::default();
        for value in [
            Value::Null,
            Value::Boolean(true),
            Value::Int64(-42),
            Value::Float64(1.5),
            Value::Float64(f64::INFINITY),
            Value::Float64(f64::NEG_INFINITY),
            Value::Float64(f64::NAN),
            Value::Decimal(Decimal::new(1050, 2)),
            Value::Varchar("it's".into()),
            Value::Blob(vec![0x00, 0xab].into()),
            Value::Date(date!(2024 - 01 - 02)),
            Value::Timestamp(datetime!(2024 - 01 - 02 03:04:05.25)),
            Value::Uuid(Uuid::nil()),
            Value::from(vec![Value::Int64(1), Value::Varchar("a".into())]),
            Value::Map(BTreeMap::from([("k".to_string(), Value::Boolean(false))])),
            Value::Map(BTreeMap::from([("raw".to_string(), Value::Blob(vec![1].into()))])),
        ] {
            WRITER.write_value(&mut context, &mut out, &value);
            out.push('\n');
        }
        assert_eq!(
            out,
            indoc! {r#"
                NULL
                true
                -42
                1.5
                CAST('Infinity' AS DOUBLE PRECISION)
                CAST('-Infinity' AS DOUBLE PRECISION)
                CAST('NaN' AS DOUBLE PRECISION)
                10.50
                'it''s'
                '\x00AB'
                '2024-01-02'
                '2024-01-02T03:04:05.25'
                '00000000-0000-0000-0000-000000000000'
                '[1,"a"]'
                '{"k":false}'
                NULL
            "#}
        );

        let mut out = String::new();
        WRITER.write_identifier_quoted(&mut context, &mut out, "say \"hi\"");
        assert_eq!(out, r#""say ""hi""""#);
    }

    #[test]
    fn precedence() {
        let nested = BinaryOp {
            op: BinaryOpType::And,
            lhs: equal("a", 1),
            rhs: BinaryOp {
                op: BinaryOpType::Or,
                lhs: equal("b", 2),
                rhs: equal("c", 3),
            },
        };
        let mut out = String::new();
        nested.write_query(&WRITER, &mut Context::default(), &mut out);
        assert_eq!(out, r#""a" = 1 AND ("b" = 2 OR "c" = 3)"#);

        let flat = BinaryOp {
            op: BinaryOpType::Or,
            lhs: BinaryOp {
                op: BinaryOpType::And,
                lhs: equal("a", 1),
                rhs: equal("b", 2),
            },
            rhs: equal("c", 3),
        };
        let mut out = String::new();
        flat.write_query(&WRITER, &mut Context::default(), &mut out);
        assert_eq!(out, r#""a" = 1 AND "b" = 2 OR "c" = 3"#);
    }

    #[test]
    fn dialect() {
        assert_eq!(GenericSqlWriter::new().dialect(), Dialect::Generic);
        assert_eq!(
            GenericSqlWriter::with_dialect(Dialect::Postgres).dialect(),
            Dialect::Postgres
        );
        assert!(Dialect::Postgres.supports_jsonb());
        assert!(!Dialect::Sqlite.supports_jsonb());
        assert!(Dialect::MySql.requires_text_index_prefix());
    }
}
