use crate::fresh;
use dbset::{Database, DbError, Driver, ErrorKind, IndexManager, IndexOptions, row};

pub async fn indexes<D: Driver>(db: &Database<D>) {
    fresh(db, "indexes_users").await;
    let users = db.table("indexes_users");
    users
        .insert(row! { "email" => "a@example.com", "country" => "NZ", "city" => "Auckland" })
        .await
        .expect("Failed to insert the user");

    // Idempotent creation
    let name = users
        .create_index("email", IndexOptions::new())
        .await
        .expect("Failed to create the index on email");
    assert_eq!(name, "idx_indexes_users_email");
    assert_eq!(
        users
            .create_index("email", IndexOptions::new())
            .await
            .expect("Failed to create the index on email again"),
        name
    );
    assert!(users.has_index("email").await.expect("Failed has_index"));

    // Column order matters
    users
        .create_index(["country", "city"], IndexOptions::new())
        .await
        .expect("Failed to create the compound index");
    assert!(users.has_index(["country", "city"]).await.expect("Failed has_index"));
    assert!(!users.has_index(["city", "country"]).await.expect("Failed has_index"));
    assert!(!users.has_index("country").await.expect("Failed has_index"));

    // Unique
    let unique = users
        .create_index(
            "city",
            IndexOptions::new().name("indexes_users_unique_city").unique(true),
        )
        .await
        .expect("Failed to create the unique index");
    assert_eq!(unique, "indexes_users_unique_city");
    let descriptor = users
        .describe()
        .await
        .expect("Failed to describe")
        .expect("The table exists");
    assert!(
        descriptor
            .index("indexes_users_unique_city")
            .is_some_and(|v| v.unique && v.columns == ["city"])
    );
    let error = crate::silent_logs! {
        users
            .insert(row! { "email" => "b@example.com", "country" => "NZ", "city" => "Auckland" })
            .await
            .expect_err("The unique index must refuse a duplicate city")
    };
    // Engine errors keep their own type
    assert_eq!(DbError::kind_of(&error), None);

    // Same name on other columns
    let error = users
        .create_index(
            "country",
            IndexOptions::new().name("indexes_users_unique_city"),
        )
        .await
        .expect_err("An index name can not be reused for other columns");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Schema));

    let error = users
        .create_index(["email", "ghost"], IndexOptions::new())
        .await
        .expect_err("Indexing a missing column must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::ColumnNotFound));

    let error = users
        .create_index(Vec::<String>::new(), IndexOptions::new())
        .await
        .expect_err("An index without columns must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));

    fresh(db, "indexes_missing").await;
    let error = db
        .table("indexes_missing")
        .create_index("email", IndexOptions::new())
        .await
        .expect_err("Indexing a missing table must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
    assert!(
        !db.has_table("indexes_missing")
            .await
            .expect("Failed has_table"),
        "Creating an index never creates the table"
    );

    // Long generated names are shortened
    let long_table = "indexes_with_a_rather_long_table_name_for_testing";
    fresh(db, long_table).await;
    let long = db.table(long_table);
    long.insert(row! {
        "first_descriptive_column" => 1,
        "second_descriptive_column" => 2,
    })
    .await
    .expect("Failed to insert in the long table");
    let name = long
        .create_index(
            ["first_descriptive_column", "second_descriptive_column"],
            IndexOptions::new(),
        )
        .await
        .expect("Failed to create the long index");
    assert!(name.len() <= 63, "Index name `{}` is too long", name);
    assert_eq!(
        name,
        IndexManager::index_name(
            long_table,
            &["first_descriptive_column", "second_descriptive_column"]
        )
    );
    assert!(
        long.has_index(["first_descriptive_column", "second_descriptive_column"])
            .await
            .expect("Failed has_index")
    );
    long.drop().await.expect("Failed to drop the long table");
}
