use crate::fresh;
use dbset::{
    Database, DbError, Driver, ErrorKind, Filter, Row, Table, Value, filter, row,
    stream::TryStreamExt,
};

async fn names<D: Driver>(table: &Table<'_, D>, filter: Filter) -> Vec<String> {
    table
        .find(filter)
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to find the products")
        .into_iter()
        .map(|v| v["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

pub async fn filters<D: Driver>(db: &Database<D>) {
    fresh(db, "filters_products").await;
    let products = db.table("filters_products");
    products
        .insert_many(vec![
            row! { "name" => "apple", "price" => 1.5, "stock" => 10, "category" => "fruit" },
            row! { "name" => "banana", "price" => 0.5, "stock" => 0, "category" => "fruit" },
            row! { "name" => "carrot", "price" => 0.8, "stock" => 25, "category" => "vegetable" },
            row! { "name" => "date", "price" => 3.0, "stock" => 5, "category" => Value::Null },
            row! { "name" => "eggplant", "price" => 2.2, "stock" => 12, "category" => "vegetable" },
        ])
        .await
        .expect("Failed to insert the products");

    // Equality and membership
    assert_eq!(
        names(&products, filter! { "category" => "fruit" }).await,
        ["apple", "banana"]
    );
    assert_eq!(
        names(&products, filter! { "category" => vec!["fruit", "vegetable"] }).await,
        ["apple", "banana", "carrot", "eggplant"]
    );
    assert_eq!(
        names(&products, filter! { "category" => Value::Null }).await,
        ["date"]
    );
    assert_eq!(
        names(&products, filter! { "category" => { "!=" => Value::Null } }).await,
        ["apple", "banana", "carrot", "eggplant"]
    );
    assert!(
        names(&products, filter! { "category" => { "in" => Vec::<&str>::new() } })
            .await
            .is_empty(),
        "An empty IN matches nothing"
    );
    assert_eq!(
        names(&products, filter! { "category" => Vec::<&str>::new() }).await,
        Vec::<String>::new()
    );
    assert_eq!(
        names(&products, filter! { "category" => { "not_in" => vec!["fruit"] } }).await,
        ["carrot", "eggplant"]
    );
    assert_eq!(
        names(
            &products,
            filter! { "category" => { "not_in" => Vec::<&str>::new() } }
        )
        .await
        .len(),
        5
    );

    // Comparisons
    assert_eq!(
        names(&products, filter! { "stock" => { ">" => 5, "<=" => 12 } }).await,
        ["apple", "eggplant"]
    );
    assert_eq!(
        names(&products, filter! { "price" => { "between" => vec![0.5, 1.5] } }).await,
        ["apple", "banana", "carrot"]
    );
    assert_eq!(
        names(
            &products,
            filter! { "category" => "fruit", "stock" => { ">=" => 1 } }
        )
        .await,
        ["apple"]
    );
    assert_eq!(
        names(&products, Filter::new().op("price", ">=", 2).op("price", "<", 3)).await,
        ["eggplant"]
    );

    // Patterns
    assert_eq!(
        names(&products, filter! { "name" => { "startswith" => "ca" } }).await,
        ["carrot"]
    );
    assert_eq!(
        names(&products, filter! { "name" => { "endswith" => "ana" } }).await,
        ["banana"]
    );
    assert_eq!(
        names(&products, filter! { "name" => { "contains" => "pp" } }).await,
        ["apple", "eggplant"]
    );
    assert_eq!(
        names(&products, filter! { "name" => { "like" => "%an%" } }).await,
        ["banana", "eggplant"]
    );
    assert_eq!(
        names(&products, filter! { "name" => { "not_like" => "%a%" } }).await,
        Vec::<String>::new()
    );
    assert!(
        names(&products, filter! { "name" => { "contains" => "%" } })
            .await
            .is_empty(),
        "Wildcards are matched literally by contains"
    );

    // Ordering and paging
    assert_eq!(
        names(&products, Filter::new().order_by("-price").limit(2)).await,
        ["date", "eggplant"]
    );
    assert_eq!(
        names(&products, Filter::new().order_by("price").limit(2).offset(1)).await,
        ["carrot", "apple"]
    );
    assert_eq!(
        names(&products, Filter::new().order_by("name").offset(3)).await,
        ["date", "eggplant"]
    );
    assert_eq!(
        names(&products, Filter::new().order_by(vec!["category", "-stock"])).await,
        ["date", "apple", "banana", "carrot", "eggplant"]
    );
    let top = products
        .find_one(Filter::new().order_by("-stock"))
        .await
        .expect("Failed to find the top stock")
        .expect("There are products");
    assert_eq!(top["name"], Value::Varchar("carrot".into()));

    // Count and distinct
    assert_eq!(
        products
            .count(filter! { "category" => "vegetable" })
            .await
            .expect("Failed to count"),
        2
    );
    assert_eq!(
        products
            .count(filter! { "stock" => { ">" => 100 } })
            .await
            .expect("Failed to count"),
        0
    );
    let categories = products
        .distinct("category", Filter::new().order_by("category"))
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to read the distinct categories");
    assert_eq!(
        categories.iter().map(|v| v["category"].clone()).collect::<Vec<_>>(),
        [
            Value::Null,
            Value::Varchar("fruit".into()),
            Value::Varchar("vegetable".into())
        ]
    );
    assert_eq!(categories[0].len(), 1);
    let pairs = products
        .distinct(["category", "stock"], filter! { "category" => "fruit" })
        .try_collect::<Vec<Row>>()
        .await
        .expect("Failed to read the distinct pairs");
    assert_eq!(pairs.len(), 2);

    // Malformed filters
    for filter in [
        filter! { "ghost" => 1 },
        filter! { "name" => { "regex" => "a.*" } },
        filter! { "price" => { "between" => vec![1.0] } },
        filter! { "stock" => { "in" => 3 } },
        filter! { "stock" => { ">" => vec![1, 2] } },
        Filter::new().order_by("ghost"),
        Filter::new().with("_limit", -1),
    ] {
        let error = products
            .find(filter.clone())
            .try_collect::<Vec<Row>>()
            .await
            .expect_err(&format!("The filter {:?} should be refused", filter));
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Query));
    }
}
