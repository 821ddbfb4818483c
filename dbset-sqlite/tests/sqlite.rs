#[cfg(test)]
mod tests {
    use dbset_core::{Config, Filter, Value, async_connect, row, stream::StreamExt};
    use dbset_sqlite::SqliteDriver;
    use dbset_tests::{execute_tests, init_logs};
    use std::pin::pin;

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let path = directory.path().join("tests.sqlite");
        assert!(
            !path.exists(),
            "Database file should not exist before test"
        );
        execute_tests(
            SqliteDriver::new(),
            &format!("sqlite://{}?mode=rwc", path.display()),
        )
        .await;
        assert!(path.exists(), "Database file should be created by the tests");
    }

    #[tokio::test]
    async fn memory() {
        init_logs();
        let db = async_connect(SqliteDriver::new(), "sqlite://:memory:", Config::default())
            .await
            .expect("Could not open the in-memory database");
        assert!(db.pool().size() > 1);
        let notes = db.table("notes");
        notes
            .insert_many(vec![row! { "text" => "one" }, row! { "text" => "two" }])
            .await
            .expect("Failed to insert the notes");

        // Every pooled connection sees the same database
        {
            let mut stream = pin!(notes.find(Filter::new().order_by("text")));
            let first = stream
                .next()
                .await
                .expect("The first note")
                .expect("Failed to read the first note");
            assert_eq!(first["text"], Value::from("one"));
            assert_eq!(notes.count(Filter::new()).await.expect("Failed to count"), 2);
            assert!(stream.next().await.is_some());
        }

        let writes = (0..4).map(|i| {
            let notes = &notes;
            async move { notes.insert(row! { "text" => format!("task {}", i) }).await }
        });
        for result in dbset_core::future::join_all(writes).await {
            result.expect("Concurrent insert failed");
        }
        let transaction = db.begin().await.expect("Could not begin");
        transaction
            .table("notes")
            .insert(row! { "text" => "committed" })
            .await
            .expect("Failed to insert in the transaction");
        transaction.commit().await.expect("Could not commit");
        assert_eq!(notes.count(Filter::new()).await.expect("Failed to count"), 7);
        assert_eq!(db.tables().await.expect("Failed to list the tables"), ["notes"]);
        let pool = db.pool().clone();
        assert!(!pool.is_closed());
        db.close().await;
        assert!(pool.is_closed());
        assert!(pool.acquire().await.is_err());

        // Separate databases do not share anything
        let other = async_connect(SqliteDriver::new(), "sqlite://:memory:", Config::default())
            .await
            .expect("Could not open the second in-memory database");
        assert!(other.tables().await.expect("Failed to list the tables").is_empty());
        other.close().await;
    }

    #[tokio::test]
    async fn concurrent_writers() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let path = directory.path().join("concurrent.sqlite");
        let db = async_connect(
            SqliteDriver::new(),
            &format!("sqlite://{}", path.display()),
            Config::new().pool_size(4),
        )
        .await
        .expect("Could not open the database");
        let table = db.table("events");
        let writes = (0..8).map(|i| {
            let table = &table;
            async move {
                table
                    .insert(row! { "worker" => i, "payload" => format!("event {}", i) })
                    .await
            }
        });
        for result in dbset_core::future::join_all(writes).await {
            result.expect("Concurrent insert failed");
        }
        assert_eq!(table.count(Filter::new()).await.expect("Failed to count"), 8);
        assert_eq!(
            table.columns().await.expect("Failed to read the columns"),
            ["id", "worker", "payload"]
        );
        db.close().await;
    }
}
