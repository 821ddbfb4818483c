use crate::fresh;
use dbset::{
    Database, DbError, Driver, ErrorKind, Filter, Row, Value, filter, row, stream::TryStreamExt,
};

pub async fn crud<D: Driver>(db: &Database<D>) {
    fresh(db, "crud_people").await;
    let people = db.table("crud_people");
    assert!(
        !people.exists().await.expect("Failed to check the table"),
        "The table should not exist before the first write"
    );
    assert!(people.columns().await.expect("Failed to list columns").is_empty());

    // Insert
    let id = people
        .insert(row! { "name" => "John", "age" => 30 })
        .await
        .expect("Failed to insert John");
    assert_eq!(id, Value::Int64(1));
    assert!(people.exists().await.expect("Failed to check the table"));
    assert_eq!(
        people.columns().await.expect("Failed to list columns"),
        ["id", "name", "age"]
    );
    let inserted = people
        .insert_many(vec![
            row! { "name" => "Jane", "age" => 25 },
            row! { "name" => "Bob", "age" => 40 },
            row! { "name" => "Alice", "age" => 35 },
            row! { "name" => "Eve", "age" => 28 },
        ])
        .await
        .expect("Failed to insert many people");
    assert_eq!(inserted, 4);
    assert_eq!(people.count(Filter::new()).await.expect("Failed to count"), 5);
    assert_eq!(
        people
            .insert_many(Vec::new())
            .await
            .expect("Failed to insert nothing"),
        0
    );

    // Find
    let bob = people
        .find_one(filter! { "name" => "Bob" })
        .await
        .expect("Failed to find Bob")
        .expect("Bob should exist");
    assert_eq!(bob["id"], Value::Int64(3));
    assert_eq!(bob["age"], Value::Int64(40));
    assert_eq!(bob.get_as::<String>("name").expect("name is a string"), "Bob");
    assert!(
        people
            .find_one(filter! { "name" => "Nobody" })
            .await
            .expect("Failed to look for nobody")
            .is_none()
    );
    let everyone = people
        .all()
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to read every row");
    assert_eq!(everyone.len(), 5);
    assert_eq!(
        everyone
            .iter()
            .map(|v| v["name"].as_str().unwrap_or_default().to_string())
            .collect::<Vec<_>>(),
        ["John", "Jane", "Bob", "Alice", "Eve"]
    );

    // Update
    let updated = people
        .update(row! { "name" => "Bob", "age" => 41 }, "name")
        .await
        .expect("Failed to update Bob");
    assert_eq!(updated, 1);
    let bob = people
        .find_one(filter! { "name" => "Bob" })
        .await
        .expect("Failed to find Bob")
        .expect("Bob should exist");
    assert_eq!(bob["age"], Value::Int64(41));
    let updated = people
        .update(row! { "name" => "Nobody", "age" => 1 }, "name")
        .await
        .expect("Failed to update nobody");
    assert_eq!(updated, 0);
    let updated = people
        .update_where(row! { "age" => 0 }, filter! { "age" => { "<" => 30 } })
        .await
        .expect("Failed to update the young ones");
    assert_eq!(updated, 2);
    assert_eq!(
        people
            .count(filter! { "age" => 0 })
            .await
            .expect("Failed to count"),
        2
    );
    let error = people
        .update_where(row! { "age" => 1 }, Filter::new().limit(3))
        .await
        .expect_err("An update without conditions must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Query));

    // Delete
    let deleted = people
        .delete(filter! { "name" => "Eve" })
        .await
        .expect("Failed to delete Eve");
    assert_eq!(deleted, 1);
    people
        .insert(row! { "name" => "Eve", "age" => 28 })
        .await
        .expect("Failed to insert Eve again");
    assert_eq!(people.count(Filter::new()).await.expect("Failed to count"), 5);
    let deleted = people
        .delete(Filter::new())
        .await
        .expect("Failed to delete everyone");
    assert_eq!(deleted, 5);
    assert_eq!(people.count(Filter::new()).await.expect("Failed to count"), 0);

    // Drop
    people.drop().await.expect("Failed to drop the table");
    assert!(!people.exists().await.expect("Failed to check the table"));
    assert!(
        !db.tables()
            .await
            .expect("Failed to list the tables")
            .iter()
            .any(|v| v == "crud_people")
    );
}
