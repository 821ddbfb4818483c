use crate::fresh;
use dbset::{
    Database, DbError, Driver, ErrorKind, Filter, Row, Value, WriteOptions, row,
    stream::TryStreamExt,
};
use std::collections::BTreeMap;

pub async fn errors<D: Driver>(db: &Database<D>) {
    fresh(db, "errors_missing").await;
    let missing = db.table("errors_missing");
    let error = missing
        .insert_with(row! { "name" => "x" }, &WriteOptions::new().ensure(false))
        .await
        .expect_err("Writing a missing table without ensuring must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
    assert!(matches!(
        error.downcast_ref::<DbError>(),
        Some(DbError::TableNotFound { table }) if table == "errors_missing"
    ));
    let error = missing
        .delete(Filter::new())
        .await
        .expect_err("Deleting from a missing table must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
    let error = missing
        .drop()
        .await
        .expect_err("Dropping a missing table must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
    let error = db
        .drop_table("errors_missing")
        .await
        .expect_err("Dropping a missing table must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
    assert!(missing.columns().await.expect("Failed to read the columns").is_empty());
    assert!(!missing.exists().await.expect("Failed exists"));

    // Reads create the table
    fresh(db, "errors_lazy").await;
    let lazy = db.table("errors_lazy");
    assert_eq!(lazy.count(Filter::new()).await.expect("Failed to count"), 0);
    assert!(db.has_table("errors_lazy").await.expect("Failed has_table"));
    assert_eq!(
        lazy.columns().await.expect("Failed to read the columns"),
        ["id"]
    );

    // Validation
    let error = lazy
        .insert(row! { "" => 1 })
        .await
        .expect_err("An empty column name must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));
    let error = lazy
        .insert(row! { "_order_by" => "name" })
        .await
        .expect_err("A reserved column name must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));
    let error = lazy
        .insert_many(vec![row! { "name" => "fine" }, row! { "_limit" => 1 }])
        .await
        .expect_err("A reserved column name in any row must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));
    assert_eq!(
        lazy.columns().await.expect("Failed to read the columns"),
        ["id"],
        "A refused batch leaves the schema untouched"
    );
    let error = db
        .table("")
        .insert(row! { "name" => "nameless" })
        .await
        .expect_err("An empty table name must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));
    let error = db
        .table("  ")
        .count(Filter::new())
        .await
        .expect_err("A blank table name must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));

    // Unknown columns
    lazy.insert(row! { "name" => "Ada" })
        .await
        .expect("Failed to insert Ada");
    let error = lazy
        .insert_with(
            row! { "name" => "Grace", "surname" => "Hopper" },
            &WriteOptions::new().ensure(false),
        )
        .await
        .expect_err("A missing column without ensuring must fail");
    assert!(matches!(
        error.downcast_ref::<DbError>(),
        Some(DbError::ColumnNotFound { column, .. }) if column == "surname"
    ));
    let error = lazy
        .update(row! { "name" => "Ada", "surname" => "Lovelace" }, "name")
        .await
        .expect_err("Updating a missing column must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::ColumnNotFound));
    let error = lazy
        .distinct("surname", Filter::new())
        .try_collect::<Vec<Row>>()
        .await
        .expect_err("Distinct on a missing column must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::ColumnNotFound));
    let error = lazy
        .count(Filter::new().eq("surname", "Lovelace"))
        .await
        .expect_err("Filtering on a missing column must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Query));

    // Values without a JSON form
    let error = lazy
        .insert(row! {
            "document" => Value::Map(BTreeMap::from([(
                "raw".to_string(),
                Value::Blob(vec![1, 2, 3].into()),
            )])),
        })
        .await
        .expect_err("Binary data nested in a document must be refused");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TypeInference));
    assert!(
        !lazy
            .columns()
            .await
            .expect("Failed to read the columns")
            .contains(&"document".to_string())
    );

    // Engine failures are not wrapped
    let error = crate::silent_logs! {
        db.query("SELEKT nonsense")
            .try_collect::<Vec<Row>>()
            .await
            .expect_err("Malformed SQL must fail")
    };
    assert_eq!(DbError::kind_of(&error), None);

    lazy.drop().await.expect("Failed to drop the lazy table");
}
