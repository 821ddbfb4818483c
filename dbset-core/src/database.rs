use crate::{
    Config, DbError, Dialect, Driver, Executor, Pool, PrimaryKeyConfig, ReadOnlyValidator,
    Result, Row, SchemaManager, Table, Transaction,
    session::Session,
    stream::{Stream, StreamExt},
};
use async_stream::try_stream;
use std::pin::pin;

/// Open a [`Database`] on `url` using `driver`.
///
/// ```no_run
/// # async fn run<D: dbset_core::Driver + Default>() -> dbset_core::Result<()> {
/// use dbset_core::{Config, async_connect, row};
/// let db = async_connect(D::default(), "sqlite://data.db", Config::default()).await?;
/// let id = db.table("users").insert(row! { "name" => "John", "age" => 30 }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn async_connect<D: Driver>(driver: D, url: &str, config: Config) -> Result<Database<D>> {
    Database::connect(driver, url, config).await
}

/// A connection pool plus the schema cache of the tables reached through it.
pub struct Database<D: Driver> {
    driver: D,
    pool: Pool<D::Connection>,
    schema: SchemaManager,
    config: Config,
    primary_key: PrimaryKeyConfig,
}

impl<D: Driver> Database<D> {
    pub async fn connect(driver: D, url: &str, config: Config) -> Result<Self> {
        config.validate()?;
        let primary_key = config.resolve_primary_key()?;
        let pool = Pool::connect(driver.clone(), url, config.pool_size).await?;
        log::debug!(
            "Opened {} database (read_only: {}, ensure_schema: {}, pool_size: {})",
            D::NAME,
            config.read_only,
            config.ensure_schema,
            config.pool_size
        );
        Ok(Self {
            schema: SchemaManager::new(Box::new(driver.sql_writer())),
            driver,
            pool,
            config,
            primary_key,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn primary_key(&self) -> &PrimaryKeyConfig {
        &self.primary_key
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    pub fn schema(&self) -> &SchemaManager {
        &self.schema
    }

    pub fn pool(&self) -> &Pool<D::Connection> {
        &self.pool
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn table(&self, name: impl Into<String>) -> Table<'_, D> {
        Table::new(self, Session::Pool(&self.pool), name.into())
    }

    pub(crate) fn check_query(&self, sql: &str) -> Result<()> {
        if self.config.read_only {
            ReadOnlyValidator::validate_sql(sql)?;
        }
        Ok(())
    }

    /// Run raw SQL, yielding the rows it returns. Only reads are accepted in read-only mode.
    pub fn query(&self, sql: impl Into<String>) -> impl Stream<Item = Result<Row>> + Send {
        let sql = sql.into();
        try_stream! {
            self.check_query(&sql)?;
            let mut connection = self.pool.acquire().await?;
            let mut stream = pin!(connection.fetch(sql.into()));
            while let Some(row) = stream.next().await {
                yield Row::from(row?);
            }
        }
    }

    /// Names of the user tables, sorted.
    pub async fn tables(&self) -> Result<Vec<String>> {
        let mut connection = self.pool.acquire().await?;
        self.schema.table_names(&mut *connection).await
    }

    pub async fn has_table(&self, name: &str) -> Result<bool> {
        let mut connection = self.pool.acquire().await?;
        Ok(self.schema.reflect(&mut *connection, name).await?.is_some())
    }

    pub async fn drop_table(&self, name: &str) -> Result<()> {
        if self.config.read_only {
            return Err(DbError::ReadOnly(format!(
                "DROP TABLE `{}` not allowed in read-only mode",
                name
            ))
            .into());
        }
        let mut connection = self.pool.acquire().await?;
        self.schema.drop_table(&mut *connection, name).await
    }

    /// Start a transaction, refused in read-only mode.
    pub async fn begin(&self) -> Result<Transaction<'_, D>> {
        if self.config.read_only {
            return Err(
                DbError::ReadOnly("Transactions not allowed in read-only mode".into()).into(),
            );
        }
        Transaction::begin(self).await
    }

    /// Release the connections and forget the cached schema.
    pub async fn close(self) {
        self.pool.close();
        self.schema.invalidate_all().await;
        log::debug!("Closed {} database", D::NAME);
    }
}
