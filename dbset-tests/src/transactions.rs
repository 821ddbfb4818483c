use crate::fresh;
use dbset::{Database, Driver, Filter, Row, Value, filter, row, stream::TryStreamExt};

pub async fn transactions<D: Driver>(db: &Database<D>) {
    fresh(db, "transactions_accounts").await;
    let accounts = db.table("transactions_accounts");
    accounts
        .insert(row! { "owner" => "ann", "balance" => 100 })
        .await
        .expect("Failed to insert Ann");

    // Commit
    let transaction = db.begin().await.expect("Could not begin a transaction");
    let inner = transaction.table("transactions_accounts");
    inner
        .insert(row! { "owner" => "bob", "balance" => 50 })
        .await
        .expect("Failed to insert Bob in the transaction");
    assert_eq!(
        inner
            .update(row! { "owner" => "ann", "balance" => 90 }, "owner")
            .await
            .expect("Failed to update Ann in the transaction"),
        1
    );
    let rows = transaction
        .query("SELECT COUNT(*) AS total FROM transactions_accounts")
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to query in the transaction");
    assert_eq!(rows[0]["total"], Value::Int64(2), "Uncommitted rows are visible inside");
    assert_eq!(
        accounts.count(Filter::new()).await.expect("Failed to count"),
        1,
        "Uncommitted rows are not visible outside"
    );
    transaction
        .commit()
        .await
        .expect("Could not commit the transaction");
    assert_eq!(accounts.count(Filter::new()).await.expect("Failed to count"), 2);
    let ann = accounts
        .find_one(filter! { "owner" => "ann" })
        .await
        .expect("Failed to find Ann")
        .expect("Ann exists");
    assert_eq!(ann["balance"], Value::Int64(90));

    // Rollback
    let transaction = db.begin().await.expect("Could not begin a transaction");
    let inner = transaction.table("transactions_accounts");
    inner
        .insert(row! { "owner" => "cid", "balance" => 10 })
        .await
        .expect("Failed to insert Cid in the transaction");
    inner
        .delete(filter! { "owner" => "ann" })
        .await
        .expect("Failed to delete Ann in the transaction");
    transaction
        .rollback()
        .await
        .expect("Could not roll back the transaction");
    assert_eq!(accounts.count(Filter::new()).await.expect("Failed to count"), 2);
    assert_eq!(
        accounts
            .count(filter! { "owner" => "ann" })
            .await
            .expect("Failed to count"),
        1
    );

    // Tables and columns created inside are undone too
    fresh(db, "transactions_scratch").await;
    let transaction = db.begin().await.expect("Could not begin a transaction");
    transaction
        .table("transactions_scratch")
        .insert(row! { "note" => "temporary" })
        .await
        .expect("Failed to create a table in the transaction");
    transaction
        .table("transactions_accounts")
        .insert(row! { "owner" => "dan", "nickname" => "dd" })
        .await
        .expect("Failed to add a column in the transaction");
    transaction
        .rollback()
        .await
        .expect("Could not roll back the transaction");
    assert!(
        !db.has_table("transactions_scratch")
            .await
            .expect("Failed has_table")
    );
    assert_eq!(
        accounts.columns().await.expect("Failed to read the columns"),
        ["id", "owner", "balance"]
    );

    // Dropped without an outcome
    crate::silent_logs! {
        let transaction = db.begin().await.expect("Could not begin a transaction");
        transaction
            .table("transactions_accounts")
            .insert(row! { "owner" => "eve", "balance" => 1 })
            .await
            .expect("Failed to insert Eve in the transaction");
        drop(transaction);
    };
    assert_eq!(
        accounts
            .count(filter! { "owner" => "eve" })
            .await
            .expect("Failed to count"),
        0,
        "A dropped transaction is rolled back"
    );
    accounts
        .insert(row! { "owner" => "fay", "balance" => 5 })
        .await
        .expect("Failed to insert after a dropped transaction");
    assert_eq!(accounts.count(Filter::new()).await.expect("Failed to count"), 3);

    accounts.drop().await.expect("Failed to drop the accounts");
}
