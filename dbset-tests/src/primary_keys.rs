use crate::fresh;
use dbset::{
    ColumnType, Config, DbError, Driver, ErrorKind, PrimaryKeyConfig, PrimaryKeyType, Value,
    async_connect, filter, row,
};
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};
use uuid::Uuid;

pub async fn primary_keys<D: Driver>(driver: D, url: &str) {
    // Uuid keys
    let db = async_connect(
        driver.clone(),
        url,
        Config::new().primary_key_type(PrimaryKeyType::Uuid),
    )
    .await
    .expect("Could not connect with uuid keys");
    fresh(&db, "primary_keys_uuid").await;
    let items = db.table("primary_keys_uuid");
    let id = items
        .insert(row! { "name" => "first" })
        .await
        .expect("Failed to insert with a uuid key");
    let parsed = Uuid::parse_str(id.as_str().expect("The key is a string"))
        .expect("The key is a valid uuid");
    assert_eq!(parsed.get_version_num(), 4);
    let explicit = Uuid::new_v4().to_string();
    let kept = items
        .insert(row! { "id" => explicit.clone(), "name" => "second" })
        .await
        .expect("Failed to insert with an explicit key");
    assert_eq!(kept, Value::Varchar(explicit.clone()));
    let descriptor = items
        .describe()
        .await
        .expect("Failed to describe")
        .expect("The table exists");
    let key = descriptor.primary_key().expect("There is a primary key");
    assert_eq!(key.name, "id");
    assert_eq!(key.column_type, ColumnType::String(36));
    assert!(!key.auto_increment);
    let found = items
        .find_one(filter! { "id" => id.clone() })
        .await
        .expect("Failed to find by key")
        .expect("The row exists");
    assert_eq!(found["name"], Value::Varchar("first".into()));
    items.drop().await.expect("Failed to drop the uuid table");
    db.close().await;

    // Caller generated keys
    let next = Arc::new(AtomicI64::new(1000));
    let generator = {
        let next = next.clone();
        move || Value::Int64(next.fetch_add(1, Ordering::Relaxed))
    };
    let db = async_connect(
        driver.clone(),
        url,
        Config::new().pk_config(
            PrimaryKeyConfig::custom(ColumnType::Integer, generator).column_name("code"),
        ),
    )
    .await
    .expect("Could not connect with custom keys");
    fresh(&db, "primary_keys_custom").await;
    let items = db.table("primary_keys_custom");
    assert_eq!(
        items
            .insert(row! { "name" => "a" })
            .await
            .expect("Failed to insert with a custom key"),
        Value::Int64(1000)
    );
    assert_eq!(
        items
            .insert_many(vec![row! { "name" => "b" }, row! { "name" => "c" }])
            .await
            .expect("Failed to insert many with custom keys"),
        2
    );
    assert_eq!(next.load(Ordering::Relaxed), 1003);
    assert_eq!(
        items.columns().await.expect("Failed to read the columns"),
        ["code", "name"]
    );
    let c = items
        .find_one(filter! { "name" => "c" })
        .await
        .expect("Failed to find c")
        .expect("c exists");
    assert_eq!(c["code"], Value::Int64(1002));
    items.drop().await.expect("Failed to drop the custom table");
    db.close().await;

    // Custom key column name
    let db = async_connect(
        driver.clone(),
        url,
        Config::new().primary_key_column("item_id"),
    )
    .await
    .expect("Could not connect with a named key");
    fresh(&db, "primary_keys_named").await;
    let items = db.table("primary_keys_named");
    let id = items
        .insert(row! { "name" => "only" })
        .await
        .expect("Failed to insert with a named key");
    assert_eq!(id, Value::Int64(1));
    assert_eq!(
        items.columns().await.expect("Failed to read the columns"),
        ["item_id", "name"]
    );
    items.drop().await.expect("Failed to drop the named table");
    db.close().await;

    // Invalid settings are refused before connecting
    for config in [
        Config::new().primary_key_type(PrimaryKeyType::Custom),
        Config::new().pk_config(PrimaryKeyConfig {
            kind: PrimaryKeyType::Custom,
            generator: None,
            ..PrimaryKeyConfig::integer()
        }),
        Config::new().pool_size(0),
        Config::new().chunk_size(0),
    ] {
        let error = async_connect(driver.clone(), url, config)
            .await
            .err()
            .expect("The configuration must be refused");
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));
    }
}
