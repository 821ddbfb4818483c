use crate::{
    ColumnDescriptor, ColumnType, DbError, Executor, PrimaryKeyConfig, Result, SqlWriter,
    TableDescriptor, TypeInference,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Creates tables and columns on demand and caches the reflected schema.
///
/// The cache holds one [`TableDescriptor`] per table, filled on first access
/// and refreshed after every DDL statement issued through this manager.
pub struct SchemaManager {
    writer: Box<dyn SqlWriter>,
    cache: RwLock<HashMap<String, Arc<TableDescriptor>>>,
}

impl SchemaManager {
    pub fn new(writer: Box<dyn SqlWriter>) -> Self {
        Self {
            writer,
            cache: Default::default(),
        }
    }

    pub fn writer(&self) -> &dyn SqlWriter {
        self.writer.as_ref()
    }

    /// Cached descriptor, without touching the engine.
    pub async fn cached(&self, table: &str) -> Option<Arc<TableDescriptor>> {
        self.cache.read().await.get(table).cloned()
    }

    /// Descriptor of `table`, from the cache or reflected. `None` when the table does not exist.
    pub async fn get_table<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
    ) -> Result<Option<Arc<TableDescriptor>>> {
        if let Some(descriptor) = self.cached(table).await {
            return Ok(Some(descriptor));
        }
        self.reflect(executor, table).await
    }

    /// Read the live schema of `table` and store it in the cache.
    pub async fn reflect<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
    ) -> Result<Option<Arc<TableDescriptor>>> {
        let descriptor = executor.describe_table(table).await?.map(Arc::new);
        let mut cache = self.cache.write().await;
        match &descriptor {
            Some(descriptor) => {
                cache.insert(table.to_string(), descriptor.clone());
            }
            None => {
                cache.remove(table);
            }
        }
        Ok(descriptor)
    }

    /// Create `table` unless it exists, with the primary key and `columns`.
    ///
    /// A concurrent creation by another caller is not an error.
    pub async fn ensure_table<E: Executor>(
        &self,
        executor: &mut E,
        table: &str,
        columns: &[(String, ColumnType)],
        primary_key: &PrimaryKeyConfig,
    ) -> Result<Arc<TableDescriptor>> {
        if let Some(descriptor) = self.get_table(executor, table).await? {
            return Ok(descriptor);
        }
        let mut definition = Vec::with_capacity(columns.len() + 1);
        definition.push(ColumnDescriptor {
            name: primary_key.column_name.clone(),
            column_type: primary_key.column_type.clone(),
            nullable: false,
            primary_key: true,
            auto_increment: primary_key.auto_increment(),
        });
        definition.extend(
            columns
                .iter()
                .filter(|(name, _)| *name != primary_key.column_name)
                .map(|(name, column_type)| ColumnDescriptor::new(name, column_type.clone())),
        );
        let mut sql = String::new();
        self.writer
            .write_create_table(&mut sql, table, &definition, true);
        let created = executor.execute(sql.into()).await;
        let descriptor = self.reflect(executor, table).await?;
        match (created, descriptor) {
            (Ok(..), Some(descriptor)) => {
                log::info!(
                    "Created table `{}` ({})",
                    table,
                    definition
                        .iter()
                        .map(|v| format!("{} {}", v.name, v.column_type))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                Ok(descriptor)
            }
            (Err(e), Some(descriptor)) => {
                log::debug!("Table `{}` was created concurrently: {:#}", table, e);
                Ok(descriptor)
            }
            (Err(e), None) => Err(DbError::schema(
                table,
                format!("failed to create the table: {:#}", e),
            )
            .into()),
            (Ok(..), None) => {
                Err(DbError::schema(table, "the table is missing after its creation").into())
            }
        }
    }

    /// Add the missing `columns` and widen the existing ones whose category can not hold the requested one.
    ///
    /// Columns are never narrowed nor dropped, the primary key is never altered.
    pub async fn ensure_columns<E: Executor>(
        &self,
        executor: &mut E,
        table: &TableDescriptor,
        columns: &[(String, ColumnType)],
    ) -> Result<Arc<TableDescriptor>> {
        let mut current = table.clone();
        let mut changed = false;
        for (name, requested) in columns {
            let Some(existing) = current.column(name) else {
                let column = ColumnDescriptor::new(name, requested.clone());
                let mut sql = String::new();
                self.writer.write_add_column(&mut sql, &current.name, &column);
                if let Err(e) = executor.execute(sql.into()).await {
                    // Another caller may have added it in the meantime
                    match self.reflect(executor, &current.name).await? {
                        Some(live) if live.has_column(name) => {
                            current = live.as_ref().clone();
                            continue;
                        }
                        _ => {
                            return Err(DbError::schema_column(
                                &current.name,
                                name,
                                requested,
                                format!("failed to add the column: {:#}", e),
                            )
                            .into());
                        }
                    }
                }
                log::info!(
                    "Added column `{}` {} to table `{}`",
                    name,
                    requested,
                    current.name
                );
                current.columns.push(column);
                changed = true;
                continue;
            };
            if existing.primary_key {
                continue;
            }
            let widened = TypeInference::merge_types(&existing.column_type, requested);
            if widened == existing.column_type {
                continue;
            }
            let previous = existing.column_type.clone();
            let mut sql = String::new();
            self.writer
                .write_alter_column_type(&mut sql, &current, name, &widened);
            if let Err(e) = executor.execute(sql.into()).await {
                let mut recovery = String::new();
                self.writer.write_alter_column_type_recovery(&mut recovery);
                if !recovery.is_empty() {
                    if let Err(e) = executor.execute(recovery.into()).await {
                        log::error!("{:#}", e);
                    }
                }
                self.invalidate(&current.name).await;
                return Err(DbError::schema_column(
                    &current.name,
                    name,
                    &widened,
                    format!("failed to widen the column from {}: {:#}", previous, e),
                )
                .into());
            }
            log::info!(
                "Widened column `{}` of table `{}` from {} to {}",
                name,
                current.name,
                previous,
                widened
            );
            changed = true;
            if let Some(column) = current.columns.iter_mut().find(|v| v.name == *name) {
                column.column_type = widened;
            }
        }
        if !changed {
            return Ok(Arc::new(current));
        }
        self.reflect(executor, &current.name).await?.ok_or_else(|| {
            DbError::TableNotFound {
                table: current.name.clone(),
            }
            .into()
        })
    }

    /// Drop `table`, `TableNotFound` when it does not exist.
    pub async fn drop_table<E: Executor>(&self, executor: &mut E, table: &str) -> Result<()> {
        if executor.describe_table(table).await?.is_none() {
            self.invalidate(table).await;
            return Err(DbError::TableNotFound {
                table: table.into(),
            }
            .into());
        }
        let mut sql = String::new();
        self.writer.write_drop_table(&mut sql, table, true);
        let result = executor.execute(sql.into()).await;
        self.invalidate(table).await;
        result.map_err(|e| DbError::schema(table, format!("failed to drop the table: {:#}", e)))?;
        log::info!("Dropped table `{}`", table);
        Ok(())
    }

    pub async fn table_names<E: Executor>(&self, executor: &mut E) -> Result<Vec<String>> {
        executor.table_names().await
    }

    pub async fn invalidate(&self, table: &str) {
        self.cache.write().await.remove(table);
    }

    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }

    /// Clear the cache unless it is in use, for contexts that can not wait.
    pub fn try_invalidate_all(&self) -> bool {
        match self.cache.try_write() {
            Ok(mut cache) => {
                cache.clear();
                true
            }
            Err(..) => false,
        }
    }
}
