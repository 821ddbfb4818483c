#[cfg(test)]
mod tests {
    use dbset_core::{
        ColumnDescriptor, ColumnType, Context, Filter, FilterBuilder, IndexDescriptor,
        SelectParts, SqlWriter, TableDescriptor, Value, filter,
    };
    use dbset_sqlite::SqliteSqlWriter;
    use indoc::indoc;
    use rust_decimal::Decimal;

    const WRITER: SqliteSqlWriter = SqliteSqlWriter {};

    fn scores() -> TableDescriptor {
        let mut table = TableDescriptor::new("scores");
        table.columns.push(ColumnDescriptor {
            name: "id".into(),
            column_type: ColumnType::Integer,
            nullable: false,
            primary_key: true,
            auto_increment: true,
        });
        table
            .columns
            .push(ColumnDescriptor::new("player", ColumnType::Text));
        table
            .columns
            .push(ColumnDescriptor::new("score", ColumnType::Integer));
        table.indexes.push(IndexDescriptor {
            name: "idx_scores_player_score".into(),
            columns: vec!["player".into(), "score".into()],
            unique: false,
            definition: None,
        });
        table
    }

    #[test]
    fn create_table() {
        let mut columns = scores().columns;
        columns.extend([
            ColumnDescriptor::new("ratio", ColumnType::Float),
            ColumnDescriptor::new("price", ColumnType::Decimal(Some((10, 2)))),
            ColumnDescriptor::new("active", ColumnType::Boolean),
            ColumnDescriptor::new("code", ColumnType::String(36)),
            ColumnDescriptor::new("at", ColumnType::Timestamp),
            ColumnDescriptor::new("day", ColumnType::Date),
            ColumnDescriptor::new("tags", ColumnType::Jsonb),
            ColumnDescriptor::new("raw", ColumnType::Blob),
        ]);
        let mut out = String::new();
        WRITER.write_create_table(&mut out, "scores", &columns, true);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "scores" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "player" TEXT,
                "score" INTEGER,
                "ratio" REAL,
                "price" DECIMAL_TEXT(10,2) COLLATE DBSET_DECIMAL,
                "active" BOOLEAN,
                "code" VARCHAR(36),
                "at" TIMESTAMP,
                "day" DATE,
                "tags" JSON,
                "raw" BLOB);
            "#}
            .trim()
        );
    }

    #[test]
    fn widen_column() {
        let mut out = String::new();
        WRITER.write_alter_column_type(&mut out, &scores(), "score", &ColumnType::Text);
        assert_eq!(
            out,
            indoc! {r#"
                SAVEPOINT "dbset_widen";
                DROP TABLE IF EXISTS "dbset_widen_scores";
                CREATE TABLE "dbset_widen_scores" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "player" TEXT,
                "score" TEXT);
                INSERT INTO "dbset_widen_scores" ("id", "player", "score")
                SELECT "id", "player", CAST("score" AS TEXT)
                FROM "scores";
                DROP TABLE "scores";
                ALTER TABLE "dbset_widen_scores" RENAME TO "scores";
                CREATE INDEX "idx_scores_player_score" ON "scores" ("player", "score");
                RELEASE SAVEPOINT "dbset_widen";
            "#}
            .trim()
        );

        let mut out = String::new();
        WRITER.write_alter_column_type_recovery(&mut out);
        assert_eq!(
            out,
            indoc! {r#"
                ROLLBACK TO SAVEPOINT "dbset_widen";
                RELEASE SAVEPOINT "dbset_widen";
            "#}
            .trim()
        );
    }

    #[test]
    fn widen_keeps_index_definitions() {
        let mut table = scores();
        table.indexes.push(IndexDescriptor {
            name: "uq_scores_player".into(),
            columns: vec!["player".into()],
            unique: true,
            definition: Some(
                r#"CREATE UNIQUE INDEX "uq_scores_player" ON "scores" ("player") WHERE "score" > 0"#
                    .into(),
            ),
        });
        let mut out = String::new();
        WRITER.write_alter_column_type(
            &mut out,
            &table,
            "score",
            &ColumnType::Decimal(Some((12, 2))),
        );
        assert!(
            out.contains(indoc! {r#"
                CREATE INDEX "idx_scores_player_score" ON "scores" ("player", "score");
                CREATE UNIQUE INDEX "uq_scores_player" ON "scores" ("player") WHERE "score" > 0;
                RELEASE SAVEPOINT "dbset_widen";"#}),
            "{}",
            out
        );
        assert!(
            out.contains(r#""score" DECIMAL_TEXT(12,2) COLLATE DBSET_DECIMAL);"#),
            "{}",
            out
        );
        assert!(out.contains(r#"CAST("score" AS TEXT)"#), "{}", out);
    }

    #[test]
    fn widen_dates_without_cast() {
        let mut table = TableDescriptor::new("events");
        table
            .columns
            .push(ColumnDescriptor::new("at", ColumnType::Date));
        let mut out = String::new();
        WRITER.write_alter_column_type(&mut out, &table, "at", &ColumnType::Timestamp);
        assert!(out.contains("SELECT \"at\"\nFROM \"events\";"), "{}", out);
        assert!(!out.contains("CAST"), "{}", out);
    }

    #[test]
    fn select() {
        let table = scores();
        let compiled = FilterBuilder::build(
            &table,
            &filter! {
                "score" => { ">" => 10 },
                "player" => { "ilike" => "A%" },
            },
        )
        .expect("Valid filter");
        let mut out = String::new();
        WRITER.write_select(
            &mut out,
            "scores",
            &SelectParts {
                condition: compiled.condition(),
                ..Default::default()
            },
        );
        assert_eq!(
            out,
            indoc! {r#"
                SELECT *
                FROM "scores"
                WHERE "score" > 10 AND "player" LIKE 'A%';
            "#}
            .trim()
        );

        let compiled = FilterBuilder::build(&table, &Filter::new().order_by("-score").offset(5))
            .expect("Valid filter");
        let mut out = String::new();
        WRITER.write_select(
            &mut out,
            "scores",
            &SelectParts {
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
                FROM "scores"
                ORDER BY "score" DESC
                LIMIT -1
                OFFSET 5;
            "#}
            .trim()
        );
    }

    #[test]
    fn literals() {
        let mut out = String::new();
        for value in [
            Value::Blob(vec![0x00, 0xAB, 0xFF].into()),
            Value::Float64(f64::INFINITY),
            Value::Float64(f64::NEG_INFINITY),
            Value::Float64(f64::NAN),
            Value::Varchar("it's".into()),
            Value::Decimal(
                "1234567890123456789.12"
                    .parse::<Decimal>()
                    .expect("Valid decimal"),
            ),
        ] {
            WRITER.write_value(&mut Context::default(), &mut out, &value);
            out.push(' ');
        }
        assert_eq!(
            out,
            "X'00ABFF' 9e999 -9e999 NULL 'it''s' '1234567890123456789.12' "
        );
    }
}
