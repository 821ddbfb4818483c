use crate::fresh;
use dbset::{
    ColumnType, Database, Driver, Filter, IndexOptions, Row, Table, Value, WriteOptions, row,
    stream::TryStreamExt,
};
use time::macros::{date, datetime};

async fn column_type<D: Driver>(table: &Table<'_, D>, column: &str) -> ColumnType {
    table
        .describe()
        .await
        .expect("Failed to describe the table")
        .expect("The table exists")
        .column(column)
        .map(|v| v.column_type.clone())
        .expect("The column exists")
}

async fn column_values<D: Driver>(table: &Table<'_, D>, column: &str) -> Vec<Value> {
    table
        .find(Filter::new().order_by("id"))
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to read the rows")
        .into_iter()
        .map(|v| v[column].clone())
        .collect()
}

pub async fn widening<D: Driver>(db: &Database<D>) {
    // Integer to text
    fresh(db, "widening_scores").await;
    let scores = db.table("widening_scores");
    scores
        .insert(row! { "player" => "ann", "score" => 30 })
        .await
        .expect("Failed to insert the first score");
    assert_eq!(column_type(&scores, "score").await, ColumnType::Integer);
    scores
        .insert(row! { "player" => "bob", "score" => "thirty-one" })
        .await
        .expect("Failed to insert a text score");
    assert_eq!(column_type(&scores, "score").await, ColumnType::Text);
    assert_eq!(
        column_values(&scores, "score").await,
        [Value::Varchar("30".into()), Value::Varchar("thirty-one".into())]
    );
    assert_eq!(
        column_values(&scores, "player").await,
        [Value::Varchar("ann".into()), Value::Varchar("bob".into())],
        "Widening keeps the other columns"
    );

    // Never narrowed back
    scores
        .insert(row! { "player" => "cid", "score" => 7 })
        .await
        .expect("Failed to insert an integer score");
    assert_eq!(column_type(&scores, "score").await, ColumnType::Text);
    assert_eq!(
        scores
            .count(Filter::new().eq("score", "7"))
            .await
            .expect("Failed to count"),
        1
    );
    let id = scores
        .insert(row! { "player" => "dan" })
        .await
        .expect("Failed to insert without a score");
    assert_eq!(id, Value::Int64(4), "The key sequence survives the rebuild");

    // Mixed numbers in one batch
    fresh(db, "widening_batch").await;
    let batch = db.table("widening_batch");
    batch
        .insert_many(vec![row! { "amount" => 1 }, row! { "amount" => 2.5 }])
        .await
        .expect("Failed to insert the batch");
    assert_eq!(column_type(&batch, "amount").await, ColumnType::Float);
    assert_eq!(
        column_values(&batch, "amount").await,
        [Value::Float64(1.0), Value::Float64(2.5)]
    );

    // Integer to float, indexes survive
    fresh(db, "widening_measures").await;
    let measures = db.table("widening_measures");
    measures
        .insert(row! { "sensor" => "a", "reading" => 1 })
        .await
        .expect("Failed to insert the first reading");
    measures
        .create_index(["sensor", "reading"], IndexOptions::new())
        .await
        .expect("Failed to create the index");
    measures
        .insert(row! { "sensor" => "a", "reading" => 1.5 })
        .await
        .expect("Failed to insert a float reading");
    assert_eq!(column_type(&measures, "reading").await, ColumnType::Float);
    assert_eq!(
        column_values(&measures, "reading").await,
        [Value::Float64(1.0), Value::Float64(1.5)]
    );
    assert!(
        measures
            .has_index(["sensor", "reading"])
            .await
            .expect("Failed has_index")
    );

    // Unrelated categories end up as text
    fresh(db, "widening_flags").await;
    let flags = db.table("widening_flags");
    flags
        .insert(row! { "flag" => true })
        .await
        .expect("Failed to insert a boolean");
    flags
        .insert(row! { "flag" => 5 })
        .await
        .expect("Failed to insert an integer");
    assert_eq!(column_type(&flags, "flag").await, ColumnType::Text);
    assert_eq!(column_values(&flags, "flag").await[1], Value::Varchar("5".into()));

    // Dates widen to timestamps
    fresh(db, "widening_events").await;
    let events = db.table("widening_events");
    events
        .insert(row! { "at" => date!(2024 - 02 - 29) })
        .await
        .expect("Failed to insert a date");
    events
        .insert(row! { "at" => datetime!(2024 - 03 - 01 12:30) })
        .await
        .expect("Failed to insert a timestamp");
    assert_eq!(column_type(&events, "at").await, ColumnType::Timestamp);
    assert_eq!(
        column_values(&events, "at").await,
        [
            Value::Timestamp(datetime!(2024 - 02 - 29 0:00)),
            Value::Timestamp(datetime!(2024 - 03 - 01 12:30)),
        ]
    );

    // Forced categories
    fresh(db, "widening_codes").await;
    let codes = db.table("widening_codes");
    codes
        .insert_with(
            row! { "code" => 12, "label" => "twelve" },
            &WriteOptions::new().column_type("code", ColumnType::Text),
        )
        .await
        .expect("Failed to insert with a forced type");
    assert_eq!(column_type(&codes, "code").await, ColumnType::Text);
    assert_eq!(column_type(&codes, "label").await, ColumnType::Text);
    codes
        .insert(row! { "code" => "A-7" })
        .await
        .expect("Failed to insert a text code");
    assert_eq!(
        column_values(&codes, "code").await,
        [Value::Varchar("12".into()), Value::Varchar("A-7".into())]
    );
    for name in [
        "widening_scores",
        "widening_batch",
        "widening_measures",
        "widening_flags",
        "widening_events",
        "widening_codes",
    ] {
        db.drop_table(name).await.expect("Failed to drop the table");
    }
}
