#[cfg(test)]
mod tests {
    use dbset_core::{Connection, DbError, ErrorKind, Executor, stream::StreamExt};
    use dbset_sqlite::{DEFAULT_BUSY_TIMEOUT, SqliteConnection, SqliteDriver, SqliteUrl};
    use dbset_tests::{init_logs, silent_logs};
    use rusqlite::OpenFlags;
    use std::time::Duration;

    #[tokio::test]
    async fn create_database() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let path = directory.path().join("creation.sqlite");
        SqliteConnection::connect(
            SqliteDriver::new(),
            &format!("sqlite://{}?mode=rwc", path.display()),
        )
        .await
        .expect("Could not open the database");
        assert!(
            path.exists(),
            "Database file should be created after connection"
        );
        SqliteConnection::connect(
            SqliteDriver::new(),
            &format!("sqlite://{}?mode=ro", path.display()),
        )
        .await
        .expect("Could not open the database in read only mode");
        std::fs::remove_file(&path).expect("Failed to remove the database file");
        let error = SqliteConnection::connect(
            SqliteDriver::new(),
            &format!("sqlite://{}?mode=ro", path.display()),
        )
        .await
        .err()
        .expect("Should not be able to open in read only unexisting database");
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Connection));
    }

    #[tokio::test]
    async fn wrong_url() {
        let error = silent_logs! {
            SqliteConnection::connect(SqliteDriver::new(), "duckdb://some_value")
                .await
                .err()
                .expect("A foreign scheme must be refused")
        };
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Connection));
    }

    #[test]
    fn parse_url() {
        let url = SqliteUrl::parse("sqlite://data/my%20db.sqlite?mode=ro&busy_timeout=250")
            .expect("Valid url");
        assert_eq!(url.path, "data/my db.sqlite");
        assert!(url.flags.contains(OpenFlags::SQLITE_OPEN_READ_ONLY));
        assert!(!url.flags.contains(OpenFlags::SQLITE_OPEN_CREATE));
        assert_eq!(url.busy_timeout, Duration::from_millis(250));
        assert!(!url.is_memory());

        let url = SqliteUrl::parse("sqlite://app.db").expect("Valid url");
        assert!(url.flags.contains(OpenFlags::SQLITE_OPEN_CREATE));
        assert_eq!(url.busy_timeout, DEFAULT_BUSY_TIMEOUT);

        assert!(SqliteUrl::parse("sqlite://:memory:").expect("Valid url").is_memory());
        assert!(SqliteUrl::parse("sqlite://").expect("Valid url").is_memory());
        assert!(
            SqliteUrl::parse("sqlite://shared?mode=memory")
                .expect("Valid url")
                .is_memory()
        );

        for url in [
            "postgres://localhost/db",
            "sqlite://app.db?mode=readwrite",
            "sqlite://app.db?busy_timeout=soon",
        ] {
            let error = SqliteUrl::parse(url).expect_err("Invalid url");
            assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Connection));
        }
    }

    #[tokio::test]
    async fn reset_rolls_back() {
        init_logs();
        let mut connection = SqliteConnection::connect(SqliteDriver::new(), "sqlite://:memory:")
            .await
            .expect("Could not open the database");
        connection
            .execute("CREATE TABLE t (v INTEGER); BEGIN; INSERT INTO t VALUES (1);".into())
            .await
            .expect("Failed to prepare the open transaction");
        silent_logs! {
            connection.reset().await.expect("Failed to reset the connection");
        };
        let rows = connection
            .fetch("SELECT COUNT(*) AS n FROM t;".into())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(rows.len(), 1);
        let row = rows
            .into_iter()
            .next()
            .expect("One row")
            .expect("Failed to count");
        assert_eq!(row.get_column("n").and_then(|v| v.as_i64()), Some(0));
    }

    #[tokio::test]
    async fn shared_memory() {
        init_logs();
        let url = SqliteConnection::pool_url("sqlite://:memory:?busy_timeout=100")
            .expect("Valid url");
        let other = SqliteConnection::pool_url("sqlite://:memory:").expect("Valid url");
        assert_ne!(url, other, "Every pool gets its own database");
        let parsed = SqliteUrl::parse(&url).expect("Valid url");
        assert!(parsed.is_memory());
        assert!(!parsed.is_private_memory());
        assert_eq!(parsed.busy_timeout, Duration::from_millis(100));
        assert_eq!(
            SqliteConnection::pool_url("sqlite://app.db?mode=rwc").expect("Valid url"),
            "sqlite://app.db?mode=rwc"
        );

        let mut writer = SqliteConnection::connect(SqliteDriver::new(), &url)
            .await
            .expect("Could not open the database");
        let mut reader = SqliteConnection::connect(SqliteDriver::new(), &url)
            .await
            .expect("Could not open the database again");
        writer
            .execute("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (1), (2);".into())
            .await
            .expect("Failed to fill the table");
        let row = reader
            .fetch("SELECT COUNT(*) AS n FROM t;".into())
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .next()
            .expect("One row")
            .expect("Failed to count");
        assert_eq!(row.get_column("n").and_then(|v| v.as_i64()), Some(2));

        let mut separate = SqliteConnection::connect(SqliteDriver::new(), &other)
            .await
            .expect("Could not open the other database");
        assert!(
            separate
                .describe_table("t")
                .await
                .expect("Failed to describe")
                .is_none()
        );
    }
}
