#[cfg(test)]
mod tests {
    use dbset_core::{
        AsColumns, IndexDescriptor, IndexManager, IndexOptions, MAX_INDEX_NAME_LENGTH,
        TableDescriptor,
    };

    #[test]
    fn index_name() {
        assert_eq!(IndexManager::index_name("users", &["email"]), "idx_users_email");
        assert_eq!(
            IndexManager::index_name("users", &["last", "first"]),
            "idx_users_last_first"
        );

        let table = "a_table_with_a_name_long_enough_to_overflow_the_limit";
        let name = IndexManager::index_name(table, &["first_column", "second_column"]);
        assert_eq!(name.len(), MAX_INDEX_NAME_LENGTH);
        assert!(name.starts_with("idx_a_table_with_a_name_long_enough"));
        let (_, suffix) = name.rsplit_once('_').unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            name,
            IndexManager::index_name(table, &["first_column", "second_column"])
        );
        assert_ne!(
            name,
            IndexManager::index_name(table, &["first_column", "third_column"])
        );

        let wide = "ü".repeat(40);
        let name = IndexManager::index_name(&wide, &["x"]);
        assert!(name.len() <= MAX_INDEX_NAME_LENGTH);
        assert!(name.starts_with("idx_üü"));
    }

    #[test]
    fn options() {
        let options = IndexOptions::new()
            .name("by_email")
            .unique(true)
            .text_prefix("email", 100);
        assert_eq!(options.name.as_deref(), Some("by_email"));
        assert!(options.unique);
        assert_eq!(options.prefix_length("email"), Some(100));
        assert_eq!(options.prefix_length("name"), None);
        assert_eq!(options.predicate, None);
    }

    #[test]
    fn columns() {
        assert_eq!("a".as_columns(), ["a"]);
        assert_eq!(String::from("a").as_columns(), ["a"]);
        assert_eq!(["a", "b"].as_columns(), ["a", "b"]);
        assert_eq!(vec!["a", "b"].as_columns(), ["a", "b"]);
        assert_eq!((&["b", "a"][..]).as_columns(), ["b", "a"]);
    }

    #[test]
    fn find_index() {
        let mut table = TableDescriptor::new("users");
        table.indexes = vec![
            IndexDescriptor {
                name: "idx_users_last_first".into(),
                columns: vec!["last".into(), "first".into()],
                unique: false,
                definition: None,
            },
            IndexDescriptor {
                name: "idx_users_email".into(),
                columns: vec!["email".into()],
                unique: true,
                definition: None,
            },
        ];
        assert!(table.find_index(&["last", "first"], None).is_some());
        assert!(table.find_index(&["first", "last"], None).is_none());
        assert!(table.find_index(&["last"], None).is_none());
        assert!(table.find_index(&["email"], Some(true)).is_some());
        assert!(table.find_index(&["email"], Some(false)).is_none());
        assert_eq!(
            table.index("idx_users_email").map(|v| v.unique),
            Some(true)
        );
        assert!(table.index("missing").is_none());
    }
}
