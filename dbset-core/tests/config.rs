#[cfg(test)]
mod tests {
    use dbset_core::{
        ColumnType, Config, DbError, ErrorKind, PrimaryKeyConfig, PrimaryKeyType, Value,
    };
    use std::str::FromStr;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.read_only);
        assert!(config.ensure_schema);
        assert_eq!(config.primary_key_type, PrimaryKeyType::Integer);
        assert_eq!(config.primary_key_column, "id");
        assert_eq!(config.text_index_prefix, 255);
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.chunk_size, 1000);
        let key = config.resolve_primary_key().unwrap();
        assert_eq!(key.column_type, ColumnType::Integer);
        assert!(key.auto_increment());
        assert_eq!(key.generate(), None);
    }

    #[test]
    fn primary_keys() {
        let key = Config::new()
            .primary_key_type(PrimaryKeyType::Uuid)
            .primary_key_column("uid")
            .resolve_primary_key()
            .unwrap();
        assert_eq!(key.column_name, "uid");
        assert_eq!(key.column_type, ColumnType::String(36));
        assert!(!key.auto_increment());
        let Some(Value::Varchar(generated)) = key.generate() else {
            panic!("A uuid key must generate a string");
        };
        assert_eq!(generated.len(), 36);
        assert_ne!(key.generate(), key.generate());

        let key = Config::new()
            .primary_key_column("ignored")
            .pk_config(
                PrimaryKeyConfig::custom(ColumnType::Integer, || Value::Int64(7)).column_name("code"),
            )
            .resolve_primary_key()
            .unwrap();
        assert_eq!(key.kind, PrimaryKeyType::Custom);
        assert_eq!(key.column_name, "code");
        assert_eq!(key.generate(), Some(Value::Int64(7)));
        assert!(format!("{:?}", key).contains("generator: Some(\"..\")"));

        let error = Config::new()
            .primary_key_type(PrimaryKeyType::Custom)
            .resolve_primary_key()
            .unwrap_err();
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));
        let mut broken = PrimaryKeyConfig::custom(ColumnType::Text, || Value::Null);
        broken.generator = None;
        let error = Config::new().pk_config(broken).resolve_primary_key().unwrap_err();
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::Validation));

        assert_eq!(PrimaryKeyType::from_str("UUID").unwrap(), PrimaryKeyType::Uuid);
        assert_eq!("int".parse::<PrimaryKeyType>().unwrap(), PrimaryKeyType::Integer);
        assert!("serial".parse::<PrimaryKeyType>().is_err());
    }

    #[test]
    fn errors() {
        let error: anyhow::Error = DbError::TableNotFound {
            table: "users".into(),
        }
        .into();
        assert_eq!(format!("{}", error), "Table `users` does not exist");
        assert_eq!(DbError::kind_of(&error), Some(ErrorKind::TableNotFound));

        let wrapped = error.context("While counting");
        assert_eq!(DbError::kind_of(&wrapped), Some(ErrorKind::TableNotFound));
        assert_eq!(DbError::kind_of(&anyhow::anyhow!("engine failure")), None);

        let schema = DbError::Schema {
            table: "users".into(),
            column: Some("age".into()),
            column_type: Some(ColumnType::Float),
            message: "failed".into(),
        };
        assert_eq!(schema.kind(), ErrorKind::Schema);
        assert_eq!(
            schema.to_string(),
            "Schema error on table `users` (column `age` FLOAT): failed"
        );
        assert_eq!(
            DbError::ColumnNotFound {
                table: "users".into(),
                column: "age".into()
            }
            .to_string(),
            "Column `age` does not exist in table `users`"
        );
        assert_eq!(
            DbError::ReadOnly("no".into()).to_string(),
            "Read-only mode: no"
        );
    }
}
