use crate::fresh;
use dbset::{ColumnType, Database, Driver, Filter, Row, Value, filter, row, stream::TryStreamExt};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use time::macros::{date, datetime};
use uuid::Uuid;

pub async fn values<D: Driver>(db: &Database<D>) {
    fresh(db, "values_samples").await;
    let samples = db.table("values_samples");
    let key = Uuid::new_v4();
    let tags = vec![Value::from("a"), Value::from(2), Value::from(true)];
    let attributes = BTreeMap::from([
        ("depth".to_string(), Value::Int64(3)),
        ("label".to_string(), Value::from("it's \"quoted\"")),
        (
            "nested".to_string(),
            Value::List(vec![Value::Float64(0.5), Value::Null]),
        ),
    ]);
    let id = samples
        .insert(row! {
            "flag" => true,
            "small" => -42,
            "big" => i64::MAX,
            "ratio" => 0.125,
            "huge" => f64::INFINITY,
            "price" => Decimal::new(1250, 2),
            "day" => date!(2024 - 02 - 29),
            "moment" => datetime!(2023 - 12 - 31 23:59:58),
            "tags" => Value::List(tags.clone()),
            "attributes" => Value::Map(attributes.clone()),
            "payload" => Value::Blob(vec![0, 1, 0xFE, 0xFF].into()),
            "nothing" => Value::Null,
            "key" => key,
            "quote" => "O'Reilly; DROP TABLE values_samples; --",
            "unicode" => "ñandú 🦀 日本",
        })
        .await
        .expect("Failed to insert the sample");

    let descriptor = samples
        .describe()
        .await
        .expect("Failed to describe")
        .expect("The table exists");
    let column_type = |name: &str| {
        descriptor
            .column(name)
            .map(|v| v.column_type.clone())
            .expect("Missing column")
    };
    assert_eq!(column_type("flag"), ColumnType::Boolean);
    assert_eq!(column_type("small"), ColumnType::Integer);
    assert_eq!(column_type("ratio"), ColumnType::Float);
    assert_eq!(column_type("price"), ColumnType::Decimal(Some((4, 2))));
    assert_eq!(column_type("day"), ColumnType::Date);
    assert_eq!(column_type("moment"), ColumnType::Timestamp);
    assert!(column_type("tags").is_json());
    assert!(column_type("attributes").is_json());
    assert_eq!(column_type("nothing"), ColumnType::Text);
    assert!(column_type("key").is_text());

    let row = samples
        .find_one(filter! { "id" => id })
        .await
        .expect("Failed to read the sample")
        .expect("The sample exists");
    assert_eq!(row["flag"], Value::Boolean(true));
    assert_eq!(row["small"], Value::Int64(-42));
    assert_eq!(row["big"], Value::Int64(i64::MAX));
    assert_eq!(row["ratio"], Value::Float64(0.125));
    assert_eq!(row["huge"], Value::Float64(f64::INFINITY));
    assert_eq!(row["price"], Value::Decimal(Decimal::new(1250, 2)));
    assert_eq!(row["day"], Value::Date(date!(2024 - 02 - 29)));
    assert_eq!(
        row["moment"],
        Value::Timestamp(datetime!(2023 - 12 - 31 23:59:58))
    );
    assert_eq!(row["tags"], Value::List(tags));
    assert_eq!(row["attributes"], Value::Map(attributes));
    assert_eq!(row["payload"], Value::Blob(vec![0, 1, 0xFE, 0xFF].into()));
    assert_eq!(row["nothing"], Value::Null);
    assert_eq!(row.get_as::<Uuid>("key").expect("The key is a uuid"), key);
    assert_eq!(
        row.get_as::<String>("quote").expect("The quote is text"),
        "O'Reilly; DROP TABLE values_samples; --"
    );
    assert_eq!(row["unicode"], Value::Varchar("ñandú 🦀 日本".into()));
    assert!(
        db.has_table("values_samples")
            .await
            .expect("Failed has_table"),
        "Quoted text is never executed"
    );

    // Filtering on typed values
    for filter in [
        filter! { "flag" => true },
        filter! { "day" => date!(2024 - 02 - 29) },
        filter! { "moment" => { "<" => datetime!(2024 - 01 - 01 0:00) } },
        filter! { "price" => Decimal::new(125, 1) },
        filter! { "key" => key },
        filter! { "unicode" => { "contains" => "🦀" } },
        filter! { "quote" => { "startswith" => "O'Reilly" } },
    ] {
        assert_eq!(
            samples
                .count(filter.clone())
                .await
                .expect("Failed to count"),
            1,
            "Filter {:?} should match the sample",
            filter
        );
    }

    // NaN has no portable literal and is stored as null
    let nan = samples
        .insert(row! { "ratio" => f64::NAN })
        .await
        .expect("Failed to insert NaN");
    let row = samples
        .find_one(filter! { "id" => nan })
        .await
        .expect("Failed to read the NaN row")
        .expect("The NaN row exists");
    assert!(match &row["ratio"] {
        Value::Null => true,
        Value::Float64(v) => v.is_nan(),
        _ => false,
    });
    decimals(db).await;
}

async fn decimals<D: Driver>(db: &Database<D>) {
    fresh(db, "values_decimals").await;
    let prices = db.table("values_decimals");
    let large = "1234567890123456789.12"
        .parse::<Decimal>()
        .expect("Valid decimal");
    prices
        .insert_many(vec![
            row! { "price" => large },
            row! { "price" => Decimal::new(950, 2) },
            row! { "price" => Decimal::new(10025, 2) },
        ])
        .await
        .expect("Failed to insert the prices");
    let descriptor = prices
        .describe()
        .await
        .expect("Failed to describe")
        .expect("The table exists");
    assert_eq!(
        descriptor.column("price").map(|v| v.column_type.clone()),
        Some(ColumnType::Decimal(Some((21, 2))))
    );

    // Every digit survives, comparisons and ordering are numeric
    let sorted = prices
        .find(Filter::new().order_by("price"))
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to read the prices");
    assert_eq!(
        sorted.iter().map(|v| v["price"].clone()).collect::<Vec<_>>(),
        [
            Value::Decimal(Decimal::new(950, 2)),
            Value::Decimal(Decimal::new(10025, 2)),
            Value::Decimal(large),
        ]
    );
    let count = |filter: Filter| prices.count(filter);
    assert_eq!(
        count(filter! { "price" => { ">" => 10 } })
            .await
            .expect("Failed to count"),
        2
    );
    assert_eq!(
        count(filter! { "price" => { "between" => vec![9, 101] } })
            .await
            .expect("Failed to count"),
        2
    );
    assert_eq!(
        count(filter! { "price" => large })
            .await
            .expect("Failed to count"),
        1
    );
    assert!(
        prices
            .find_one(filter! { "price" => Decimal::new(95, 1) })
            .await
            .expect("Failed to find")
            .is_some()
    );
}
