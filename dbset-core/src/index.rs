use crate::{
    DbError, Executor, IndexDescriptor, Result, SchemaManager, TableDescriptor,
    truncate_at_char_boundary,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Longest index name accepted by every supported engine.
pub const MAX_INDEX_NAME_LENGTH: usize = 63;

/// Options of [`IndexManager::create_index`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// Generated from the table and the columns when missing.
    pub name: Option<String>,
    pub unique: bool,
    /// Partial index condition, raw SQL passed through as is.
    pub predicate: Option<String>,
    /// Indexed prefix length of text columns, on engines that need one.
    pub prefix_lengths: Vec<(String, u32)>,
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn text_prefix(mut self, column: impl Into<String>, length: u32) -> Self {
        self.prefix_lengths.push((column.into(), length));
        self
    }

    pub fn prefix_length(&self, column: &str) -> Option<u32> {
        self.prefix_lengths
            .iter()
            .find_map(|(k, v)| if k == column { Some(*v) } else { None })
    }
}

/// Column list accepted where an index is named: a single column or a sequence.
pub trait AsColumns {
    fn as_columns(&self) -> Vec<String>;
}

impl AsColumns for &str {
    fn as_columns(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl AsColumns for String {
    fn as_columns(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl AsColumns for &[&str] {
    fn as_columns(&self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl AsColumns for &[String] {
    fn as_columns(&self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> AsColumns for [&str; N] {
    fn as_columns(&self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl AsColumns for Vec<&str> {
    fn as_columns(&self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl AsColumns for Vec<String> {
    fn as_columns(&self) -> Vec<String> {
        self.clone()
    }
}

/// Idempotent index creation on top of a [`SchemaManager`].
pub struct IndexManager<'s> {
    schema: &'s SchemaManager,
    text_index_prefix: u32,
}

impl<'s> IndexManager<'s> {
    pub fn new(schema: &'s SchemaManager, text_index_prefix: u32) -> Self {
        Self {
            schema,
            text_index_prefix,
        }
    }

    /// `idx_{table}_{col1}_{col2}..`, shortened with a hash suffix past [`MAX_INDEX_NAME_LENGTH`].
    pub fn index_name<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
        let name = format!(
            "idx_{}_{}",
            table,
            columns
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join("_")
        );
        if name.len() <= MAX_INDEX_NAME_LENGTH {
            return name;
        }
        let digest = hex::encode(Sha256::digest(name.as_bytes()));
        let suffix = &digest[..8];
        let prefix = truncate_at_char_boundary(&name, MAX_INDEX_NAME_LENGTH - suffix.len() - 1);
        format!("{}_{}", prefix, suffix)
    }

    /// Ensure an index on `columns` exists and return its name.
    ///
    /// An index with the same columns and uniqueness is reused whatever its name.
    pub async fn create_index<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
        columns: &[String],
        options: &IndexOptions,
    ) -> Result<String> {
        if columns.is_empty() {
            return Err(DbError::Validation("An index needs at least one column".into()).into());
        }
        let mut descriptor = self.describe(executor, table).await?;
        if let Some(missing) = columns.iter().find(|v| !descriptor.has_column(v)) {
            // The cache might predate a column added by another handle
            descriptor = self
                .schema
                .reflect(executor, table)
                .await?
                .ok_or_else(|| DbError::TableNotFound {
                    table: table.into(),
                })?;
            if !descriptor.has_column(missing) {
                return Err(DbError::ColumnNotFound {
                    table: table.into(),
                    column: missing.clone(),
                }
                .into());
            }
        }
        if let Some(existing) = descriptor.find_index(columns, Some(options.unique)) {
            return Ok(existing.name.clone());
        }
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| Self::index_name(table, columns));
        if let Some(clash) = descriptor.index(&name) {
            return Err(DbError::schema(
                table,
                format!(
                    "index `{}` already exists on ({}) unique={}, requested ({}) unique={}",
                    name,
                    clash.columns.join(", "),
                    clash.unique,
                    columns.join(", "),
                    options.unique
                ),
            )
            .into());
        }
        let options = self.with_default_prefixes(&descriptor, columns, options);
        let index = IndexDescriptor {
            name: name.clone(),
            columns: columns.to_vec(),
            unique: options.unique,
            definition: None,
        };
        let mut sql = String::new();
        self.schema
            .writer()
            .write_create_index(&mut sql, table, &index, &options, true);
        let created = executor.execute(sql.into()).await;
        let live = self.schema.reflect(executor, table).await?;
        let found = live
            .as_ref()
            .and_then(|v| v.find_index(columns, Some(options.unique)))
            .map(|v| v.name.clone());
        match (created, found) {
            (Ok(..), Some(found)) => {
                log::info!(
                    "Created {}index `{}` on `{}` ({})",
                    if options.unique { "unique " } else { "" },
                    found,
                    table,
                    columns.join(", ")
                );
                Ok(found)
            }
            (Err(e), Some(found)) => {
                log::debug!("Index `{}` was created concurrently: {:#}", found, e);
                Ok(found)
            }
            (Err(e), None) => Err(DbError::schema(
                table,
                format!("failed to create index `{}`: {:#}", name, e),
            )
            .into()),
            (Ok(..), None) => Ok(name),
        }
    }

    /// Whether an index with exactly these columns, in this order, exists.
    pub async fn has_index<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
        columns: &[String],
    ) -> Result<bool> {
        Ok(self
            .schema
            .reflect(executor, table)
            .await?
            .is_some_and(|v| v.find_index(columns, None).is_some()))
    }

    async fn describe<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
    ) -> Result<Arc<TableDescriptor>> {
        self.schema
            .get_table(executor, table)
            .await?
            .ok_or_else(|| {
                DbError::TableNotFound {
                    table: table.into(),
                }
                .into()
            })
    }

    fn with_default_prefixes(
        &self,
        table: &TableDescriptor,
        columns: &[String],
        options: &IndexOptions,
    ) -> IndexOptions {
        let mut options = options.clone();
        if !self.schema.writer().dialect().requires_text_index_prefix() {
            return options;
        }
        for column in columns {
            let is_text = table
                .column(column)
                .is_some_and(|v| v.column_type == crate::ColumnType::Text);
            if is_text && options.prefix_length(column).is_none() {
                options
                    .prefix_lengths
                    .push((column.clone(), self.text_index_prefix));
            }
        }
        options
    }
}
