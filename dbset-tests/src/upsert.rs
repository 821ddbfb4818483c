use crate::fresh;
use dbset::{
    Database, DbError, Driver, ErrorKind, Filter, Row, Value, WriteOptions, filter, row,
    stream::TryStreamExt,
};

pub async fn upsert<D: Driver>(db: &Database<D>) {
    fresh(db, "upsert_accounts").await;
    let accounts = db.table("upsert_accounts");

    let id = accounts
        .upsert(row! { "email" => "ann@example.com", "name" => "Ann" }, "email")
        .await
        .expect("Failed to upsert a new account");
    assert_eq!(id, Value::Int64(1));
    assert!(
        accounts.has_index("email").await.expect("Failed has_index"),
        "Upsert indexes its keys"
    );
    let again = accounts
        .upsert(
            row! { "email" => "ann@example.com", "name" => "Annie", "age" => 31 },
            "email",
        )
        .await
        .expect("Failed to upsert an existing account");
    assert_eq!(again, id, "The existing row keeps its primary key");
    assert_eq!(accounts.count(Filter::new()).await.expect("Failed to count"), 1);
    let ann = accounts
        .find_one(filter! { "email" => "ann@example.com" })
        .await
        .expect("Failed to find Ann")
        .expect("Ann exists");
    assert_eq!(ann["name"], Value::Varchar("Annie".into()));
    assert_eq!(ann["age"], Value::Int64(31));

    let upserted = accounts
        .upsert_many(
            vec![
                row! { "email" => "ann@example.com", "name" => "Ann" },
                row! { "email" => "bob@example.com", "name" => "Bob" },
                row! { "email" => "cid@example.com", "name" => "Cid", "age" => 22 },
            ],
            "email",
        )
        .await
        .expect("Failed to upsert many accounts");
    assert_eq!(upserted, 3);
    let names = accounts
        .find(Filter::new().order_by("email"))
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to read the accounts")
        .into_iter()
        .map(|v| (v["name"].clone(), v["age"].clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            (Value::Varchar("Ann".into()), Value::Int64(31)),
            (Value::Varchar("Bob".into()), Value::Null),
            (Value::Varchar("Cid".into()), Value::Int64(22)),
        ]
    );
    assert_eq!(
        accounts
            .upsert_many(Vec::new(), "email")
            .await
            .expect("Failed to upsert nothing"),
        0
    );

    // Compound keys
    fresh(db, "upsert_stock").await;
    let stock = db.table("upsert_stock");
    for (shop, item, quantity) in [("a", "pen", 1), ("a", "ink", 2), ("b", "pen", 3), ("a", "pen", 4)] {
        stock
            .upsert(
                row! { "shop" => shop, "item" => item, "quantity" => quantity },
                ["shop", "item"],
            )
            .await
            .expect("Failed to upsert the stock");
    }
    assert_eq!(stock.count(Filter::new()).await.expect("Failed to count"), 3);
    assert!(stock.has_index(["shop", "item"]).await.expect("Failed has_index"));
    let pen = stock
        .find_one(filter! { "shop" => "a", "item" => "pen" })
        .await
        .expect("Failed to find the pen")
        .expect("The pen exists");
    assert_eq!(pen["quantity"], Value::Int64(4));

    // Keys that are not columns never match
    fresh(db, "upsert_ghosts").await;
    let ghosts = db.table("upsert_ghosts");
    for _ in 0..2 {
        ghosts
            .upsert(row! { "name" => "Casper" }, "ghost")
            .await
            .expect("Failed to upsert on a missing key column");
    }
    assert_eq!(ghosts.count(Filter::new()).await.expect("Failed to count"), 2);
    let error = ghosts
        .update(row! { "name" => "Slimer" }, "ghost")
        .await
        .expect_err("An update without usable keys must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Query));
    assert_eq!(
        ghosts
            .count(filter! { "name" => "Casper" })
            .await
            .expect("Failed to count"),
        2
    );

    // A compound key with one missing column inserts even when the other one matches
    let before = accounts.count(Filter::new()).await.expect("Failed to count");
    let inserted = accounts
        .upsert(
            row! { "email" => "ann@example.com", "name" => "Ann again" },
            ["email", "ghost_col"],
        )
        .await
        .expect("Failed to upsert on a partly missing key");
    assert_ne!(inserted, id);
    assert_eq!(
        accounts.count(Filter::new()).await.expect("Failed to count"),
        before + 1
    );
    assert_eq!(
        accounts
            .count(filter! { "email" => "ann@example.com" })
            .await
            .expect("Failed to count"),
        2
    );
    assert!(
        !accounts
            .columns()
            .await
            .expect("Failed to read the columns")
            .contains(&"ghost_col".to_string())
    );

    let error = ghosts
        .upsert(row! { "name" => "Casper" }, Vec::<&str>::new())
        .await
        .expect_err("Upsert without keys must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));

    fresh(db, "upsert_missing").await;
    let error = db
        .table("upsert_missing")
        .upsert_with(
            row! { "email" => "x@example.com" },
            "email",
            &WriteOptions::new().ensure(false),
        )
        .await
        .expect_err("Upsert without ensuring on a missing table must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
}
