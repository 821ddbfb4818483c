#[cfg(test)]
mod tests {
    use dbset_core::{
        Config, DbError, ErrorKind, Filter, IndexOptions, Result, Row, Value, blocking, filter,
        row,
    };
    use dbset_sqlite::SqliteDriver;
    use dbset_tests::init_logs;

    #[test]
    fn blocking_crud() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let path = directory.path().join("blocking.sqlite");
        let db = blocking::connect(
            SqliteDriver::new(),
            &format!("sqlite://{}", path.display()),
            Config::default(),
        )
        .expect("Could not connect");
        let users = db.table("users");
        let id = users
            .insert(row! { "name" => "John", "age" => 30 })
            .expect("Failed to insert John");
        assert_eq!(id, Value::Int64(1));
        assert_eq!(
            users
                .insert_many(vec![
                    row! { "name" => "Jane", "age" => 25 },
                    row! { "name" => "Bob", "age" => 40 },
                ])
                .expect("Failed to insert many"),
            2
        );
        let adults = users
            .find(filter! { "age" => { ">=" => 30 }, "_order_by" => "-age" })
            .collect::<Result<Vec<Row>>>()
            .expect("Failed to find the adults");
        assert_eq!(
            adults.iter().map(|v| v["name"].clone()).collect::<Vec<_>>(),
            [Value::Varchar("Bob".into()), Value::Varchar("John".into())]
        );
        assert_eq!(
            users
                .update(row! { "name" => "John", "age" => 31 }, "name")
                .expect("Failed to update John"),
            1
        );
        users
            .upsert(row! { "name" => "Jane", "age" => 26 }, "name")
            .expect("Failed to upsert Jane");
        assert!(users.has_index("name").expect("Failed has_index"));
        users
            .create_index("age", IndexOptions::new())
            .expect("Failed to create the index");
        assert_eq!(users.count(Filter::new()).expect("Failed to count"), 3);
        assert_eq!(
            users
                .find_one(filter! { "name" => "Jane" })
                .expect("Failed to find Jane")
                .expect("Jane exists")["age"],
            Value::Int64(26)
        );
        assert_eq!(
            users
                .distinct("name", Filter::new().order_by("name"))
                .count(),
            3
        );
        assert_eq!(users.all().count(), 3);

        // Transactions
        let transaction = db.begin().expect("Could not begin");
        transaction
            .table("users")
            .insert(row! { "name" => "Temp" })
            .expect("Failed to insert in the transaction");
        let rows = transaction
            .query("SELECT COUNT(*) AS total FROM users")
            .collect::<Result<Vec<Row>>>()
            .expect("Failed to query in the transaction");
        assert_eq!(rows[0]["total"], Value::Int64(4));
        transaction.rollback().expect("Could not roll back");
        assert_eq!(users.count(Filter::new()).expect("Failed to count"), 3);

        let rows = db
            .query("SELECT name FROM users WHERE age > 30")
            .collect::<Result<Vec<Row>>>()
            .expect("Failed to run the query");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            users.delete(filter! { "name" => "Bob" }).expect("Failed to delete Bob"),
            1
        );
        assert_eq!(db.tables().expect("Failed to list the tables"), ["users"]);
        users.drop().expect("Failed to drop the users");
        assert!(!db.has_table("users").expect("Failed has_table"));
        let error = db
            .drop_table("users")
            .expect_err("Dropping twice must fail");
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));
        db.close();
    }

    #[test]
    fn blocking_read_only() {
        init_logs();
        let directory = tempfile::tempdir().expect("Could not create a temporary directory");
        let url = format!("sqlite://{}", directory.path().join("ro.sqlite").display());
        let db = blocking::connect(SqliteDriver::new(), &url, Config::default())
            .expect("Could not connect");
        db.table("books")
            .insert(row! { "title" => "Dune" })
            .expect("Failed to insert the book");
        db.close();

        let db = blocking::connect(SqliteDriver::new(), &url, Config::new().read_only(true))
            .expect("Could not connect in read-only mode");
        assert!(db.config().read_only);
        assert!(db.as_async().is_read_only());
        let books = db.table("books");
        assert_eq!(books.count(Filter::new()).expect("Failed to count"), 1);
        let error = books
            .insert(row! { "title" => "Emma" })
            .expect_err("Writes must be refused");
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::ReadOnly));
        assert!(db.begin().is_err());
        db.close();
    }

    #[test]
    fn blocking_borrowed_arguments() {
        init_logs();
        let db = blocking::connect(SqliteDriver::new(), "sqlite://:memory:", Config::default())
            .expect("Could not connect");
        let cities = db.table("cities");
        cities
            .insert_many(vec![
                row! { "name" => "Turin", "country" => "IT" },
                row! { "name" => "Lyon", "country" => "FR" },
                row! { "name" => "Milan", "country" => "IT" },
            ])
            .expect("Failed to insert the cities");

        let country = String::from("IT");
        let sql = format!("SELECT name FROM cities WHERE country = '{}' ORDER BY name", country);
        let names = db
            .query(sql.as_str())
            .map(|v| v.map(|row| row["name"].clone()))
            .collect::<Result<Vec<_>>>()
            .expect("Failed to run the query");
        assert_eq!(names, [Value::from("Milan"), Value::from("Turin")]);

        let columns = vec!["country".to_string()];
        let countries = cities
            .distinct(columns.as_slice(), Filter::new().order_by("country"))
            .collect::<Result<Vec<Row>>>()
            .expect("Failed to read the countries");
        assert_eq!(
            countries.iter().map(|v| v["country"].clone()).collect::<Vec<_>>(),
            [Value::from("FR"), Value::from("IT")]
        );

        let transaction = db.begin().expect("Could not begin");
        let rows = transaction
            .query(sql.as_str())
            .collect::<Result<Vec<Row>>>()
            .expect("Failed to query in the transaction");
        assert_eq!(rows.len(), 2);
        transaction.commit().expect("Could not commit");
        db.close();
    }
}
