use crate::{ColumnType, DbError, Result, Value};
use std::{
    fmt::{self, Debug, Formatter},
    str::FromStr,
    sync::Arc,
};
use uuid::Uuid;

/// Produces a fresh primary key value for a row that does not carry one.
pub type KeyGenerator = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Auto-increment integer assigned by the engine.
    #[default]
    Integer,
    /// Random version 4 uuid stored as a 36 characters string.
    Uuid,
    /// Caller supplied generator, see [`PrimaryKeyConfig::custom`].
    Custom,
}

impl FromStr for PrimaryKeyType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(PrimaryKeyType::Integer),
            "uuid" => Ok(PrimaryKeyType::Uuid),
            "custom" => Ok(PrimaryKeyType::Custom),
            _ => Err(DbError::Validation(format!(
                "Unknown primary key type `{}`, expected one of: integer, uuid, custom",
                s
            ))
            .into()),
        }
    }
}

/// How the primary key column of created tables looks and gets its values.
#[derive(Clone)]
pub struct PrimaryKeyConfig {
    pub kind: PrimaryKeyType,
    pub column_name: String,
    pub column_type: ColumnType,
    pub generator: Option<KeyGenerator>,
}

impl PrimaryKeyConfig {
    pub fn integer() -> Self {
        Self {
            kind: PrimaryKeyType::Integer,
            column_name: "id".into(),
            column_type: ColumnType::Integer,
            generator: None,
        }
    }

    pub fn uuid() -> Self {
        Self {
            kind: PrimaryKeyType::Uuid,
            column_name: "id".into(),
            column_type: ColumnType::String(36),
            generator: Some(Arc::new(|| Value::Varchar(Uuid::new_v4().to_string()))),
        }
    }

    pub fn custom(
        column_type: ColumnType,
        generator: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: PrimaryKeyType::Custom,
            column_name: "id".into(),
            column_type,
            generator: Some(Arc::new(generator)),
        }
    }

    pub fn column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = name.into();
        self
    }

    /// Whether the engine assigns the key.
    pub fn auto_increment(&self) -> bool {
        self.kind == PrimaryKeyType::Integer
    }

    pub fn generate(&self) -> Option<Value> {
        self.generator.as_ref().map(|v| v())
    }
}

impl Default for PrimaryKeyConfig {
    fn default() -> Self {
        Self::integer()
    }
}

impl Debug for PrimaryKeyConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryKeyConfig")
            .field("kind", &self.kind)
            .field("column_name", &self.column_name)
            .field("column_type", &self.column_type)
            .field("generator", &self.generator.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Options of a [`crate::Database`].
#[derive(Debug, Clone)]
pub struct Config {
    pub read_only: bool,
    /// Library wide default of `ensure` for write operations.
    pub ensure_schema: bool,
    pub primary_key_type: PrimaryKeyType,
    pub primary_key_column: String,
    /// Takes precedence over `primary_key_type` and `primary_key_column`.
    pub pk_config: Option<PrimaryKeyConfig>,
    /// Index prefix length for text columns on engines that require one.
    pub text_index_prefix: u32,
    pub pool_size: usize,
    /// Default rows per statement of batch writes.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_only: false,
            ensure_schema: true,
            primary_key_type: PrimaryKeyType::Integer,
            primary_key_column: "id".into(),
            pk_config: None,
            text_index_prefix: 255,
            pool_size: 5,
            chunk_size: 1000,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn ensure_schema(mut self, ensure_schema: bool) -> Self {
        self.ensure_schema = ensure_schema;
        self
    }

    pub fn primary_key_type(mut self, kind: PrimaryKeyType) -> Self {
        self.primary_key_type = kind;
        self
    }

    pub fn primary_key_column(mut self, name: impl Into<String>) -> Self {
        self.primary_key_column = name.into();
        self
    }

    pub fn pk_config(mut self, config: PrimaryKeyConfig) -> Self {
        self.pk_config = Some(config);
        self
    }

    pub fn text_index_prefix(mut self, length: u32) -> Self {
        self.text_index_prefix = length;
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Primary key settings in effect.
    pub fn resolve_primary_key(&self) -> Result<PrimaryKeyConfig> {
        if let Some(config) = &self.pk_config {
            if config.kind == PrimaryKeyType::Custom && config.generator.is_none() {
                return Err(DbError::Validation(
                    "A custom primary key requires a generator".into(),
                )
                .into());
            }
            return Ok(config.clone());
        }
        let config = match self.primary_key_type {
            PrimaryKeyType::Integer => PrimaryKeyConfig::integer(),
            PrimaryKeyType::Uuid => PrimaryKeyConfig::uuid(),
            PrimaryKeyType::Custom => {
                return Err(DbError::Validation(
                    "primary_key_type custom requires a pk_config carrying the generator".into(),
                )
                .into());
            }
        };
        Ok(config.column_name(self.primary_key_column.clone()))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(DbError::Validation("pool_size must be at least 1".into()).into());
        }
        if self.chunk_size == 0 {
            return Err(DbError::Validation("chunk_size must be at least 1".into()).into());
        }
        self.resolve_primary_key().map(|_| ())
    }
}
