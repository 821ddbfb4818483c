use crate::fresh;
use dbset::{
    Config, Database, DbError, Driver, ErrorKind, Filter, IndexOptions, Row, Value, async_connect,
    filter, row, stream::TryStreamExt,
};

pub async fn read_only<D: Driver>(db: &Database<D>, driver: D, url: &str) {
    fresh(db, "read_only_books").await;
    fresh(db, "read_only_missing").await;
    db.table("read_only_books")
        .insert_many(vec![
            row! { "title" => "Dune", "year" => 1965 },
            row! { "title" => "Neuromancer", "year" => 1984 },
        ])
        .await
        .expect("Failed to insert the books");

    let reader = async_connect(driver, url, Config::new().read_only(true))
        .await
        .expect("Could not connect in read-only mode");
    assert!(reader.is_read_only());
    let books = reader.table("read_only_books");

    // Reads
    assert_eq!(books.count(Filter::new()).await.expect("Failed to count"), 2);
    let dune = books
        .find_one(filter! { "title" => "Dune" })
        .await
        .expect("Failed to find Dune")
        .expect("Dune exists");
    assert_eq!(dune["year"], Value::Int64(1965));
    assert_eq!(
        books
            .find(filter! { "year" => { ">" => 1970 } })
            .try_collect::<Vec<Row>>()
            .await
            .expect("Failed to find the recent books")
            .len(),
        1
    );
    assert_eq!(
        books.columns().await.expect("Failed to read the columns"),
        ["id", "title", "year"]
    );
    assert!(
        reader
            .tables()
            .await
            .expect("Failed to list the tables")
            .contains(&"read_only_books".to_string())
    );
    let rows = reader
        .query("SELECT title FROM read_only_books WHERE year < 1970")
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to run a read query");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], Value::Varchar("Dune".into()));

    // Writes
    let errors = [
        books
            .insert(row! { "title" => "Foundation" })
            .await
            .expect_err("Insert must be refused"),
        books
            .insert_many(vec![row! { "title" => "Foundation" }])
            .await
            .expect_err("Insert many must be refused"),
        books
            .update(row! { "title" => "Dune", "year" => 1966 }, "title")
            .await
            .expect_err("Update must be refused"),
        books
            .update_where(row! { "year" => 1 }, filter! { "title" => "Dune" })
            .await
            .expect_err("Update where must be refused"),
        books
            .upsert(row! { "title" => "Dune", "year" => 1966 }, "title")
            .await
            .expect_err("Upsert must be refused"),
        books
            .upsert_many(vec![row! { "title" => "Dune" }], "title")
            .await
            .expect_err("Upsert many must be refused"),
        books
            .delete(Filter::new())
            .await
            .expect_err("Delete must be refused"),
        books
            .create_index("title", IndexOptions::new())
            .await
            .expect_err("Index creation must be refused"),
        books.drop().await.expect_err("Drop must be refused"),
        reader
            .drop_table("read_only_books")
            .await
            .expect_err("Drop table must be refused"),
        reader
            .begin()
            .await
            .err()
            .expect("Transactions must be refused"),
        reader
            .query("DELETE FROM read_only_books")
            .try_collect::<Vec<Row>>()
            .await
            .expect_err("A raw delete must be refused"),
        reader
            .query("SELECT 1; DROP TABLE read_only_books")
            .try_collect::<Vec<Row>>()
            .await
            .expect_err("A smuggled drop must be refused"),
    ];
    for error in errors {
        assert_eq!(
            DbError::kind_of(&error),
            Some(ErrorKind::ReadOnly),
            "Unexpected error: {:#}",
            error
        );
    }
    assert_eq!(
        db.table("read_only_books")
            .count(Filter::new())
            .await
            .expect("Failed to count"),
        2,
        "Nothing was written"
    );

    // Missing tables are never created
    let error = reader
        .table("read_only_missing")
        .count(Filter::new())
        .await
        .expect_err("Reading a missing table must fail");
    assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
    assert!(
        !db.has_table("read_only_missing")
            .await
            .expect("Failed has_table")
    );

    reader.close().await;
    db.drop_table("read_only_books")
        .await
        .expect("Failed to drop the books");
}
