use crate::{
    AsColumns, CONTROL_KEYS, ColumnType, Database, DbError, Driver, Executor, Filter,
    FilterBuilder, IndexManager, IndexOptions, Result, Row, SelectParts, SqlWriter,
    ReadOnlyValidator, TableDescriptor, TypeInference, Value,
    session::{Session, SessionConnection},
    stream::{Stream, StreamExt},
};
use async_stream::try_stream;
use std::{pin::pin, slice, sync::Arc};

/// Per call options of the write operations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WriteOptions {
    /// Create the table and the missing columns, defaults to [`crate::Config::ensure_schema`].
    pub ensure: Option<bool>,
    /// Categories forced instead of the inferred ones.
    pub types: Vec<(String, ColumnType)>,
    /// Rows per statement of batch writes, defaults to [`crate::Config::chunk_size`].
    pub chunk_size: Option<usize>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(mut self, ensure: bool) -> Self {
        self.ensure = Some(ensure);
        self
    }

    pub fn column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        let column = column.into();
        self.types.retain(|(k, _)| *k != column);
        self.types.push((column, column_type));
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }
}

/// Handle to a table of a [`Database`], or of a [`crate::Transaction`] when obtained from one.
///
/// Rows are plain [`Row`] values, the table and its columns are created on
/// first write when schema ensuring is enabled.
pub struct Table<'a, D: Driver> {
    db: &'a Database<D>,
    session: Session<'a, D::Connection>,
    name: String,
}

impl<'a, D: Driver> Table<'a, D> {
    pub(crate) fn new(
        db: &'a Database<D>,
        session: Session<'a, D::Connection>,
        name: String,
    ) -> Self {
        Self { db, session, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn writer(&self) -> &dyn SqlWriter {
        self.db.schema().writer()
    }

    async fn connection(&self) -> Result<SessionConnection<'a, D::Connection>> {
        if self.name.trim().is_empty() {
            return Err(DbError::Validation("The table name can not be empty".into()).into());
        }
        self.session.acquire().await
    }

    fn check_writable(&self, operation: &str) -> Result<()> {
        if self.db.config().read_only {
            ReadOnlyValidator::validate_operation(operation)?;
        }
        Ok(())
    }

    fn ensure_enabled(&self, options: &WriteOptions) -> bool {
        options.ensure.unwrap_or(self.db.config().ensure_schema)
    }

    fn validate_row(row: &Row) -> Result<()> {
        for column in row.columns() {
            if column.trim().is_empty() {
                return Err(DbError::Validation("Column names can not be empty".into()).into());
            }
            if CONTROL_KEYS.contains(&column) {
                return Err(DbError::Validation(format!(
                    "`{}` is reserved for filters and can not be a column name",
                    column
                ))
                .into());
            }
        }
        Ok(())
    }

    fn check_columns<'c>(
        &self,
        descriptor: &TableDescriptor,
        columns: impl IntoIterator<Item = &'c str>,
    ) -> Result<()> {
        for column in columns {
            if !descriptor.has_column(column) {
                return Err(DbError::ColumnNotFound {
                    table: self.name.clone(),
                    column: column.into(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Descriptor of an existing table.
    async fn existing<E: Executor>(&self, executor: &mut E) -> Result<Arc<TableDescriptor>> {
        self.db
            .schema()
            .get_table(executor, &self.name)
            .await?
            .ok_or_else(|| {
                DbError::TableNotFound {
                    table: self.name.clone(),
                }
                .into()
            })
    }

    /// Descriptor for a read, the table is created when ensuring is on and writes are allowed.
    async fn readable<E: Executor>(&self, executor: &mut E) -> Result<Arc<TableDescriptor>> {
        let config = self.db.config();
        if let Some(descriptor) = self.db.schema().get_table(executor, &self.name).await? {
            return Ok(descriptor);
        }
        if !config.ensure_schema || config.read_only {
            return Err(DbError::TableNotFound {
                table: self.name.clone(),
            }
            .into());
        }
        self.db
            .schema()
            .ensure_table(executor, &self.name, &[], self.db.primary_key())
            .await
    }

    /// Create the table and the columns `rows` need, types merged across all the rows.
    async fn ensure_schema<E: Executor>(
        &self,
        executor: &mut E,
        rows: &[Row],
        options: &WriteOptions,
    ) -> Result<Arc<TableDescriptor>> {
        let schema = self.db.schema();
        let inferred = TypeInference::infer_types_from_rows(rows, self.db.dialect())?;
        let existing = schema.get_table(executor, &self.name).await?;
        let mut columns = Vec::with_capacity(inferred.len() + options.types.len());
        for (name, column_type) in inferred {
            let forced = options.types.iter().find(|(k, _)| *k == name);
            let column_type = match (forced, column_type) {
                (Some((_, forced)), ..) => forced.clone(),
                (None, Some(column_type)) => column_type,
                // Only nulls seen, an existing column stays as it is
                (None, None) if existing.as_ref().is_some_and(|v| v.has_column(&name)) => {
                    continue;
                }
                (None, None) => ColumnType::Text,
            };
            columns.push((name, column_type));
        }
        for (name, column_type) in &options.types {
            if !columns.iter().any(|(k, _)| k == name) {
                columns.push((name.clone(), column_type.clone()));
            }
        }
        let descriptor = match existing {
            Some(descriptor) => descriptor,
            None => {
                schema
                    .ensure_table(executor, &self.name, &columns, self.db.primary_key())
                    .await?
            }
        };
        schema
            .ensure_columns(executor, &descriptor, &columns)
            .await
    }

    /// Name of the primary key and the value to store for it when `row` has none.
    fn primary_key(&self, descriptor: &TableDescriptor, row: &Row) -> (String, Option<Value>) {
        let config = self.db.primary_key();
        let name = descriptor
            .primary_key()
            .map(|v| v.name.clone())
            .unwrap_or_else(|| config.column_name.clone());
        let missing = row.get(&name).is_none_or(Value::is_null);
        let generated = if missing && name == config.column_name {
            config.generate()
        } else {
            None
        };
        (name, generated)
    }

    async fn insert_on<E: Executor>(
        &self,
        executor: &mut E,
        descriptor: &TableDescriptor,
        mut row: Row,
    ) -> Result<Value> {
        let (primary_key, generated) = self.primary_key(descriptor, &row);
        if let Some(value) = generated {
            row.insert(primary_key.clone(), value);
        }
        self.check_columns(descriptor, row.columns())?;
        let columns = row.columns().map(str::to_string).collect::<Vec<_>>();
        let mut sql = String::new();
        self.writer()
            .write_insert(&mut sql, &self.name, &columns, slice::from_ref(&row));
        let affected = executor.execute(sql.into()).await?;
        Ok(match row.remove(&primary_key) {
            Some(value) if !value.is_null() => value,
            _ => affected
                .last_affected_id
                .map(Value::Int64)
                .unwrap_or(Value::Null),
        })
    }

    async fn find_one_on<E: Executor>(
        &self,
        executor: &mut E,
        descriptor: &TableDescriptor,
        filter: &Filter,
    ) -> Result<Option<Row>> {
        let compiled = FilterBuilder::build(descriptor, filter)?;
        let mut sql = String::new();
        self.writer().write_select(
            &mut sql,
            &self.name,
            &SelectParts {
                condition: compiled.condition(),
                order_by: &compiled.options.order_by,
                limit: Some(1),
                offset: compiled.options.offset,
                ..Default::default()
            },
        );
        let mut stream = pin!(executor.fetch(sql.into()));
        match stream.next().await {
            Some(row) => Ok(Some(descriptor.decode_row(row?))),
            None => Ok(None),
        }
    }

    async fn update_on<E: Executor>(
        &self,
        executor: &mut E,
        descriptor: &TableDescriptor,
        data: &Row,
        keys: &[String],
    ) -> Result<u64> {
        let matching = data.filtered(|k| keys.iter().any(|v| v == k) && descriptor.has_column(k));
        if matching.is_empty() {
            return Err(DbError::Query(format!(
                "None of the key columns ({}) exists in table `{}` with a value in the data, refusing to update every row",
                keys.join(", "),
                self.name
            ))
            .into());
        }
        let values = data.filtered(|k| !keys.iter().any(|v| v == k));
        if values.is_empty() {
            return Ok(0);
        }
        self.check_columns(descriptor, values.columns())?;
        let condition = FilterBuilder::equalities(&matching);
        let mut sql = String::new();
        self.writer()
            .write_update(&mut sql, &self.name, &values, condition.as_deref());
        Ok(executor.execute(sql.into()).await?.rows_affected)
    }

    async fn upsert_on<E: Executor>(
        &self,
        executor: &mut E,
        descriptor: &TableDescriptor,
        row: Row,
        keys: &[String],
    ) -> Result<Value> {
        if keys.iter().any(|k| !descriptor.has_column(k)) {
            // A key that is not a column never matches an existing row
            return self.insert_on(executor, descriptor, row).await;
        }
        let lookup = keys
            .iter()
            .map(|k| (k.clone(), row.get(k).cloned().unwrap_or_default()))
            .collect::<Filter>();
        let Some(existing) = self.find_one_on(executor, descriptor, &lookup).await? else {
            return self.insert_on(executor, descriptor, row).await;
        };
        let (primary_key, ..) = self.primary_key(descriptor, &row);
        match existing.get(&primary_key) {
            Some(id) if !id.is_null() => {
                let values = row.filtered(|k| k != primary_key);
                if !values.is_empty() {
                    self.check_columns(descriptor, values.columns())?;
                    let condition = FilterBuilder::equalities(&Row::new().with(&primary_key, id.clone()));
                    let mut sql = String::new();
                    self.writer()
                        .write_update(&mut sql, &self.name, &values, condition.as_deref());
                    executor.execute(sql.into()).await?;
                }
                Ok(id.clone())
            }
            _ => {
                self.update_on(executor, descriptor, &row, keys).await?;
                Ok(Value::Null)
            }
        }
    }

    /// Insert `row`, returning its primary key.
    pub async fn insert(&self, row: Row) -> Result<Value> {
        self.insert_with(row, &WriteOptions::default()).await
    }

    pub async fn insert_with(&self, row: Row, options: &WriteOptions) -> Result<Value> {
        self.check_writable("INSERT")?;
        Self::validate_row(&row)?;
        let mut connection = self.connection().await?;
        let descriptor = if self.ensure_enabled(options) {
            self.ensure_schema(&mut *connection, slice::from_ref(&row), options)
                .await?
        } else {
            self.existing(&mut *connection).await?
        };
        self.insert_on(&mut *connection, &descriptor, row).await
    }

    /// Insert `rows` in statements of at most `chunk_size` rows, returning the number of rows inserted.
    ///
    /// Chunks are independent statements, a failure leaves the previous ones in place.
    pub async fn insert_many(&self, rows: Vec<Row>) -> Result<u64> {
        self.insert_many_with(rows, &WriteOptions::default()).await
    }

    pub async fn insert_many_with(&self, rows: Vec<Row>, options: &WriteOptions) -> Result<u64> {
        self.check_writable("INSERT")?;
        if rows.is_empty() {
            return Ok(0);
        }
        for row in &rows {
            Self::validate_row(row)?;
        }
        let chunk_size = options.chunk_size.unwrap_or(self.db.config().chunk_size).max(1);
        let mut connection = self.connection().await?;
        let descriptor = if self.ensure_enabled(options) {
            self.ensure_schema(&mut *connection, &rows, options).await?
        } else {
            self.existing(&mut *connection).await?
        };
        let mut total = 0;
        for chunk in rows.chunks(chunk_size) {
            let mut columns = Vec::<String>::new();
            let chunk = chunk
                .iter()
                .map(|row| {
                    let mut row = row.clone();
                    let (primary_key, generated) = self.primary_key(&descriptor, &row);
                    if let Some(value) = generated {
                        row.insert(primary_key, value);
                    }
                    for column in row.columns() {
                        if !columns.iter().any(|v| v == column) {
                            columns.push(column.to_string());
                        }
                    }
                    row
                })
                .collect::<Vec<_>>();
            self.check_columns(&descriptor, columns.iter().map(String::as_str))?;
            if columns.is_empty() {
                // Nothing but defaults, one statement per row
                for _ in &chunk {
                    let mut sql = String::new();
                    self.writer().write_insert(&mut sql, &self.name, &[], &[Row::new()]);
                    total += connection.execute(sql.into()).await?.rows_affected;
                }
                continue;
            }
            let mut sql = String::new();
            self.writer()
                .write_insert(&mut sql, &self.name, &columns, &chunk);
            total += connection.execute(sql.into()).await?.rows_affected;
        }
        Ok(total)
    }

    /// Rows matching `filter`, in the order given by `_order_by`.
    ///
    /// The stream keeps a connection busy until it is exhausted or dropped.
    pub fn find(&self, filter: Filter) -> impl Stream<Item = Result<Row>> + Send {
        try_stream! {
            let mut connection = self.connection().await?;
            let descriptor = self.readable(&mut *connection).await?;
            let compiled = FilterBuilder::build(&descriptor, &filter)?;
            let mut sql = String::new();
            self.writer().write_select(
                &mut sql,
                &self.name,
                &SelectParts {
                    condition: compiled.condition(),
                    order_by: &compiled.options.order_by,
                    limit: compiled.options.limit,
                    offset: compiled.options.offset,
                    ..Default::default()
                },
            );
            let mut stream = pin!(connection.fetch(sql.into()));
            while let Some(row) = stream.next().await {
                yield descriptor.decode_row(row?);
            }
        }
    }

    /// First row matching `filter`, `None` when nothing matches.
    pub async fn find_one(&self, filter: Filter) -> Result<Option<Row>> {
        let mut connection = self.connection().await?;
        let descriptor = self.readable(&mut *connection).await?;
        self.find_one_on(&mut *connection, &descriptor, &filter)
            .await
    }

    pub fn all(&self) -> impl Stream<Item = Result<Row>> + Send {
        self.find(Filter::new())
    }

    pub async fn count(&self, filter: Filter) -> Result<u64> {
        let mut connection = self.connection().await?;
        let descriptor = self.readable(&mut *connection).await?;
        let compiled = FilterBuilder::build(&descriptor, &filter)?;
        let mut sql = String::new();
        self.writer()
            .write_count(&mut sql, &self.name, compiled.condition());
        let mut stream = pin!(connection.fetch(sql.into()));
        let count = match stream.next().await {
            Some(row) => row?.get_column("count").and_then(Value::as_i64),
            None => None,
        };
        count.map(|v| v as u64).ok_or_else(|| {
            DbError::Query(format!("COUNT on table `{}` returned no value", self.name)).into()
        })
    }

    /// One row per distinct combination of `columns` among the rows matching `filter`.
    pub fn distinct(
        &self,
        columns: impl AsColumns,
        filter: Filter,
    ) -> impl Stream<Item = Result<Row>> + Send {
        let columns = columns.as_columns();
        try_stream! {
            if columns.is_empty() {
                Err::<(), _>(DbError::Query("DISTINCT requires at least one column".into()))?;
            }
            let mut connection = self.connection().await?;
            let descriptor = self.readable(&mut *connection).await?;
            self.check_columns(&descriptor, columns.iter().map(String::as_str))?;
            let compiled = FilterBuilder::build(&descriptor, &filter)?;
            let mut sql = String::new();
            self.writer().write_select(
                &mut sql,
                &self.name,
                &SelectParts {
                    columns: &columns,
                    distinct: true,
                    condition: compiled.condition(),
                    order_by: &compiled.options.order_by,
                    limit: compiled.options.limit,
                    offset: compiled.options.offset,
                },
            );
            let mut stream = pin!(connection.fetch(sql.into()));
            while let Some(row) = stream.next().await {
                yield descriptor.decode_row(row?);
            }
        }
    }

    /// Update the rows whose `keys` columns equal the values in `data`, returning the matched count.
    ///
    /// Keys that are not columns are ignored, when none is left this fails
    /// with a `Query` error rather than updating the whole table.
    pub async fn update(&self, data: Row, keys: impl AsColumns) -> Result<u64> {
        self.check_writable("UPDATE")?;
        Self::validate_row(&data)?;
        let keys = keys.as_columns();
        let mut connection = self.connection().await?;
        let descriptor = self.existing(&mut *connection).await?;
        self.update_on(&mut *connection, &descriptor, &data, &keys)
            .await
    }

    /// Set `data` on every row matching `filter`, an empty filter is refused.
    pub async fn update_where(&self, data: Row, filter: Filter) -> Result<u64> {
        self.check_writable("UPDATE")?;
        Self::validate_row(&data)?;
        if !filter.has_conditions() {
            return Err(DbError::Query(format!(
                "UPDATE on table `{}` requires a filter",
                self.name
            ))
            .into());
        }
        if data.is_empty() {
            return Ok(0);
        }
        let mut connection = self.connection().await?;
        let descriptor = self.existing(&mut *connection).await?;
        self.check_columns(&descriptor, data.columns())?;
        let compiled = FilterBuilder::build(&descriptor, &filter)?;
        let mut sql = String::new();
        self.writer()
            .write_update(&mut sql, &self.name, &data, compiled.condition());
        Ok(connection.execute(sql.into()).await?.rows_affected)
    }

    /// Update the row whose `keys` match `row`, or insert `row`. Returns the primary key.
    ///
    /// When a key is not a column of the table no row can match and `row` is inserted.
    pub async fn upsert(&self, row: Row, keys: impl AsColumns) -> Result<Value> {
        self.upsert_with(row, keys, &WriteOptions::default()).await
    }

    pub async fn upsert_with(
        &self,
        row: Row,
        keys: impl AsColumns,
        options: &WriteOptions,
    ) -> Result<Value> {
        self.check_writable("UPSERT")?;
        Self::validate_row(&row)?;
        let keys = Self::upsert_keys(keys)?;
        let mut connection = self.connection().await?;
        let descriptor = if self.ensure_enabled(options) {
            self.ensure_upsert(&mut *connection, slice::from_ref(&row), &keys, options)
                .await?
        } else {
            self.existing(&mut *connection).await?
        };
        self.upsert_on(&mut *connection, &descriptor, row, &keys)
            .await
    }

    /// Upsert every row, the schema and the index are ensured once for the whole batch.
    pub async fn upsert_many(&self, rows: Vec<Row>, keys: impl AsColumns) -> Result<u64> {
        self.upsert_many_with(rows, keys, &WriteOptions::default())
            .await
    }

    pub async fn upsert_many_with(
        &self,
        rows: Vec<Row>,
        keys: impl AsColumns,
        options: &WriteOptions,
    ) -> Result<u64> {
        self.check_writable("UPSERT")?;
        let keys = Self::upsert_keys(keys)?;
        if rows.is_empty() {
            return Ok(0);
        }
        for row in &rows {
            Self::validate_row(row)?;
        }
        let chunk_size = options.chunk_size.unwrap_or(self.db.config().chunk_size).max(1);
        let mut descriptor = {
            let mut connection = self.connection().await?;
            if self.ensure_enabled(options) {
                self.ensure_upsert(&mut *connection, &rows, &keys, options)
                    .await?
            } else {
                self.existing(&mut *connection).await?
            }
        };
        let mut total = 0;
        let mut rows = rows.into_iter().peekable();
        while rows.peek().is_some() {
            // The connection goes back between chunks
            let mut connection = self.connection().await?;
            descriptor = self
                .db
                .schema()
                .get_table(&mut *connection, &self.name)
                .await?
                .unwrap_or(descriptor);
            for row in rows.by_ref().take(chunk_size) {
                self.upsert_on(&mut *connection, &descriptor, row, &keys)
                    .await?;
                total += 1;
            }
        }
        Ok(total)
    }

    fn upsert_keys(keys: impl AsColumns) -> Result<Vec<String>> {
        let keys = keys.as_columns();
        if keys.is_empty() {
            return Err(DbError::Validation("Upsert requires at least one key column".into()).into());
        }
        if keys.iter().any(|k| k.trim().is_empty()) {
            return Err(DbError::Validation("Key column names can not be empty".into()).into());
        }
        Ok(keys)
    }

    async fn ensure_upsert<E: Executor>(
        &self,
        executor: &mut E,
        rows: &[Row],
        keys: &[String],
        options: &WriteOptions,
    ) -> Result<Arc<TableDescriptor>> {
        let descriptor = self.ensure_schema(executor, rows, options).await?;
        let index_keys = keys
            .iter()
            .filter(|k| descriptor.has_column(k))
            .cloned()
            .collect::<Vec<_>>();
        if index_keys.is_empty() {
            return Ok(descriptor);
        }
        IndexManager::new(self.db.schema(), self.db.config().text_index_prefix)
            .create_index(executor, &self.name, &index_keys, &IndexOptions::default())
            .await?;
        self.existing(executor).await
    }

    /// Delete the rows matching `filter`, all of them when the filter is empty. Returns the deleted count.
    pub async fn delete(&self, filter: Filter) -> Result<u64> {
        self.check_writable("DELETE")?;
        let mut connection = self.connection().await?;
        let descriptor = self.existing(&mut *connection).await?;
        let compiled = FilterBuilder::build(&descriptor, &filter)?;
        let mut sql = String::new();
        self.writer()
            .write_delete(&mut sql, &self.name, compiled.condition());
        Ok(connection.execute(sql.into()).await?.rows_affected)
    }

    /// Ensure an index on `columns`, returning its name.
    pub async fn create_index(
        &self,
        columns: impl AsColumns,
        options: IndexOptions,
    ) -> Result<String> {
        self.check_writable("CREATE")?;
        let columns = columns.as_columns();
        let mut connection = self.connection().await?;
        IndexManager::new(self.db.schema(), self.db.config().text_index_prefix)
            .create_index(&mut *connection, &self.name, &columns, &options)
            .await
    }

    /// Whether an index with exactly these columns, in this order, exists.
    pub async fn has_index(&self, columns: impl AsColumns) -> Result<bool> {
        let columns = columns.as_columns();
        let mut connection = self.connection().await?;
        IndexManager::new(self.db.schema(), self.db.config().text_index_prefix)
            .has_index(&mut *connection, &self.name, &columns)
            .await
    }

    /// Column names in table order, empty when the table does not exist.
    pub async fn columns(&self) -> Result<Vec<String>> {
        let mut connection = self.connection().await?;
        Ok(self
            .db
            .schema()
            .get_table(&mut *connection, &self.name)
            .await?
            .map(|v| v.column_names().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Live schema of the table, `None` when it does not exist.
    pub async fn describe(&self) -> Result<Option<Arc<TableDescriptor>>> {
        let mut connection = self.connection().await?;
        self.db
            .schema()
            .reflect(&mut *connection, &self.name)
            .await
    }

    pub async fn exists(&self) -> Result<bool> {
        let mut connection = self.connection().await?;
        Ok(self
            .db
            .schema()
            .reflect(&mut *connection, &self.name)
            .await?
            .is_some())
    }

    pub async fn drop(&self) -> Result<()> {
        self.check_writable("DROP")?;
        let mut connection = self.connection().await?;
        self.db
            .schema()
            .drop_table(&mut *connection, &self.name)
            .await
    }
}
