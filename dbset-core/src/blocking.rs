//! Synchronous façade, every call blocks the current thread until the engine answers.
//!
//! Each [`Database`] drives the async core on its own current-thread runtime,
//! so none of these functions may be called from inside an async context.
//!
//! ```no_run
//! # fn run<D: dbset_core::Driver + Default>() -> dbset_core::Result<()> {
//! use dbset_core::{Config, blocking, filter, row};
//! let db = blocking::connect(D::default(), "sqlite://data.db", Config::default())?;
//! let users = db.table("users");
//! users.insert(row! { "name" => "John", "age" => 30 })?;
//! for user in users.find(filter! { "age" => { ">=" => 18 } }) {
//!     println!("{:?}", user?);
//! }
//! # Ok(())
//! # }
//! ```
use crate::{
    AsColumns, Config, DbError, Driver, Filter, IndexOptions, Result, Row, TableDescriptor, Value,
    WriteOptions,
    stream::{Stream, StreamExt},
};
use std::{pin::Pin, sync::Arc};
use tokio::runtime::Runtime;

/// Open a blocking [`Database`] on `url`.
pub fn connect<D: Driver>(driver: D, url: &str, config: Config) -> Result<Database<D>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DbError::Connection(format!("could not start the runtime: {}", e)))?;
    let inner = runtime.block_on(crate::Database::connect(driver, url, config))?;
    Ok(Database { inner, runtime })
}

pub struct Database<D: Driver> {
    inner: crate::Database<D>,
    runtime: Runtime,
}

impl<D: Driver> Database<D> {
    /// The async handle sharing the pool and the schema cache.
    pub fn as_async(&self) -> &crate::Database<D> {
        &self.inner
    }

    pub fn config(&self) -> &Config {
        self.inner.config()
    }

    pub fn table(&self, name: impl Into<String>) -> Table<'_, D> {
        Table {
            runtime: &self.runtime,
            inner: self.inner.table(name),
        }
    }

    pub fn query(&self, sql: impl Into<String>) -> RowIter<'_> {
        let sql: String = sql.into();
        RowIter::new(&self.runtime, self.inner.query(sql))
    }

    pub fn tables(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.tables())
    }

    pub fn has_table(&self, name: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.has_table(name))
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.drop_table(name))
    }

    pub fn begin(&self) -> Result<Transaction<'_, D>> {
        Ok(Transaction {
            runtime: &self.runtime,
            inner: self.runtime.block_on(self.inner.begin())?,
        })
    }

    pub fn close(self) {
        let Database { inner, runtime } = self;
        runtime.block_on(inner.close());
    }
}

/// Blocking counterpart of [`crate::Table`].
pub struct Table<'a, D: Driver> {
    runtime: &'a Runtime,
    inner: crate::Table<'a, D>,
}

impl<'a, D: Driver> Table<'a, D> {
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn insert(&self, row: Row) -> Result<Value> {
        self.runtime.block_on(self.inner.insert(row))
    }

    pub fn insert_with(&self, row: Row, options: &WriteOptions) -> Result<Value> {
        self.runtime.block_on(self.inner.insert_with(row, options))
    }

    pub fn insert_many(&self, rows: Vec<Row>) -> Result<u64> {
        self.runtime.block_on(self.inner.insert_many(rows))
    }

    pub fn insert_many_with(&self, rows: Vec<Row>, options: &WriteOptions) -> Result<u64> {
        self.runtime
            .block_on(self.inner.insert_many_with(rows, options))
    }

    /// Lazy iterator over the matching rows, holding a connection until exhausted or dropped.
    pub fn find(&self, filter: Filter) -> RowIter<'_> {
        RowIter::new(self.runtime, self.inner.find(filter))
    }

    pub fn find_one(&self, filter: Filter) -> Result<Option<Row>> {
        self.runtime.block_on(self.inner.find_one(filter))
    }

    pub fn all(&self) -> RowIter<'_> {
        RowIter::new(self.runtime, self.inner.all())
    }

    pub fn count(&self, filter: Filter) -> Result<u64> {
        self.runtime.block_on(self.inner.count(filter))
    }

    pub fn distinct(&self, columns: impl AsColumns, filter: Filter) -> RowIter<'_> {
        // The stream must not capture the caller's argument type
        let columns = columns.as_columns();
        RowIter::new(self.runtime, self.inner.distinct(columns, filter))
    }

    pub fn update(&self, data: Row, keys: impl AsColumns) -> Result<u64> {
        self.runtime.block_on(self.inner.update(data, keys))
    }

    pub fn update_where(&self, data: Row, filter: Filter) -> Result<u64> {
        self.runtime.block_on(self.inner.update_where(data, filter))
    }

    pub fn upsert(&self, row: Row, keys: impl AsColumns) -> Result<Value> {
        self.runtime.block_on(self.inner.upsert(row, keys))
    }

    pub fn upsert_with(
        &self,
        row: Row,
        keys: impl AsColumns,
        options: &WriteOptions,
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.upsert_with(row, keys, options))
    }

    pub fn upsert_many(&self, rows: Vec<Row>, keys: impl AsColumns) -> Result<u64> {
        self.runtime.block_on(self.inner.upsert_many(rows, keys))
    }

    pub fn upsert_many_with(
        &self,
        rows: Vec<Row>,
        keys: impl AsColumns,
        options: &WriteOptions,
    ) -> Result<u64> {
        self.runtime
            .block_on(self.inner.upsert_many_with(rows, keys, options))
    }

    pub fn delete(&self, filter: Filter) -> Result<u64> {
        self.runtime.block_on(self.inner.delete(filter))
    }

    pub fn create_index(&self, columns: impl AsColumns, options: IndexOptions) -> Result<String> {
        self.runtime
            .block_on(self.inner.create_index(columns, options))
    }

    pub fn has_index(&self, columns: impl AsColumns) -> Result<bool> {
        self.runtime.block_on(self.inner.has_index(columns))
    }

    pub fn columns(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.columns())
    }

    pub fn describe(&self) -> Result<Option<Arc<TableDescriptor>>> {
        self.runtime.block_on(self.inner.describe())
    }

    pub fn exists(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.exists())
    }

    pub fn drop(&self) -> Result<()> {
        self.runtime.block_on(self.inner.drop())
    }
}

/// Blocking counterpart of [`crate::Transaction`].
pub struct Transaction<'db, D: Driver> {
    runtime: &'db Runtime,
    inner: crate::Transaction<'db, D>,
}

impl<'db, D: Driver> Transaction<'db, D> {
    pub fn table(&self, name: impl Into<String>) -> Table<'_, D> {
        Table {
            runtime: self.runtime,
            inner: self.inner.table(name),
        }
    }

    pub fn query(&self, sql: impl Into<String>) -> RowIter<'_> {
        let sql: String = sql.into();
        RowIter::new(self.runtime, self.inner.query(sql))
    }

    pub fn commit(self) -> Result<()> {
        self.runtime.block_on(self.inner.commit())
    }

    pub fn rollback(self) -> Result<()> {
        self.runtime.block_on(self.inner.rollback())
    }
}

/// Rows pulled one by one from an async stream.
pub struct RowIter<'a> {
    runtime: &'a Runtime,
    stream: Pin<Box<dyn Stream<Item = Result<Row>> + Send + 'a>>,
}

impl<'a> RowIter<'a> {
    fn new(runtime: &'a Runtime, stream: impl Stream<Item = Result<Row>> + Send + 'a) -> Self {
        Self {
            runtime,
            stream: Box::pin(stream),
        }
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
