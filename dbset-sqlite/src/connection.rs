use crate::{
    SqliteDriver,
    DECIMAL_COLLATION,
    extract::{compare_decimals, describe_table, extract_value, table_names},
};
use async_stream::try_stream;
use dbset_core::{
    Connection, DbError, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected, TableDescriptor, stream::Stream,
};
use rusqlite::OpenFlags;
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{sync::mpsc, task::spawn_blocking};

/// Busy timeout applied when the url does not set one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Rows buffered between the engine thread and the consumer.
const CHANNEL_CAPACITY: usize = 64;

/// Suffix of the names given to the in-memory databases of the pools.
static MEMORY_DATABASES: AtomicUsize = AtomicUsize::new(0);

/// Parsed `sqlite://` connection url.
///
/// `sqlite://path/to/file.db?mode=rwc&busy_timeout=5000`, an empty path or
/// `:memory:` opens a private in-memory database. `sqlite://name?mode=memory`
/// opens the in-memory database `name`, shared by every connection of the
/// process that opens the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteUrl {
    pub path: String,
    pub flags: OpenFlags,
    pub busy_timeout: Duration,
}

impl SqliteUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(rest) = url.strip_prefix(&prefix) else {
            return Err(DbError::Connection(format!(
                "Expected sqlite connection url to start with `{}`, got `{}`",
                prefix, url
            ))
            .into());
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path = urlencoding::decode(path)
            .map_err(|e| {
                DbError::Connection(format!("Error while decoding connection URL `{}`: {}", url, e))
            })?
            .into_owned();
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let mut busy_timeout = DEFAULT_BUSY_TIMEOUT;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "mode" => {
                    flags = match value.as_ref() {
                        "ro" => OpenFlags::SQLITE_OPEN_READ_ONLY,
                        "rw" => OpenFlags::SQLITE_OPEN_READ_WRITE,
                        "rwc" => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                        "memory" => {
                            OpenFlags::SQLITE_OPEN_READ_WRITE
                                | OpenFlags::SQLITE_OPEN_CREATE
                                | OpenFlags::SQLITE_OPEN_MEMORY
                        }
                        other => {
                            return Err(DbError::Connection(format!(
                                "Unknown sqlite mode `{}`, expected one of ro, rw, rwc, memory",
                                other
                            ))
                            .into());
                        }
                    }
                }
                "busy_timeout" => {
                    let millis = value.parse::<u64>().map_err(|e| {
                        DbError::Connection(format!("Invalid busy_timeout `{}`: {}", value, e))
                    })?;
                    busy_timeout = Duration::from_millis(millis);
                }
                other => log::warn!("Ignoring unknown sqlite url parameter `{}`", other),
            }
        }
        Ok(Self {
            path,
            flags: flags | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            busy_timeout,
        })
    }

    pub fn is_memory(&self) -> bool {
        self.is_private_memory() || self.flags.contains(OpenFlags::SQLITE_OPEN_MEMORY)
    }

    /// In-memory database visible to this connection only.
    pub fn is_private_memory(&self) -> bool {
        self.path.is_empty() || self.path == ":memory:"
    }

    /// The url of a named in-memory database with the same settings.
    pub fn named_memory(&self, name: &str) -> String {
        format!(
            "{}://{}?mode=memory&busy_timeout={}",
            SqliteDriver::NAME,
            urlencoding::encode(name),
            self.busy_timeout.as_millis()
        )
    }

    fn open(&self) -> Result<rusqlite::Connection> {
        let connection = if self.is_private_memory() {
            rusqlite::Connection::open_in_memory_with_flags(self.flags)
        } else if self.is_memory() {
            // memdb shares the database among the connections opening a name starting with `/`
            rusqlite::Connection::open_with_flags(
                format!("file:/{}?vfs=memdb", urlencoding::encode(&self.path)),
                self.flags.difference(OpenFlags::SQLITE_OPEN_MEMORY),
            )
        } else {
            rusqlite::Connection::open_with_flags(&self.path, self.flags)
        }
        .map_err(|e| DbError::Connection(format!("Could not open `{}`: {}", self.path, e)))?;
        connection
            .busy_timeout(self.busy_timeout)
            .map_err(|e| DbError::Connection(format!("Could not set the busy timeout: {}", e)))?;
        connection
            .create_collation(DECIMAL_COLLATION, compare_decimals)
            .map_err(|e| {
                DbError::Connection(format!("Could not register the decimal collation: {}", e))
            })?;
        Ok(connection)
    }
}

/// A SQLite database handle, statements run on the blocking thread pool.
pub struct SqliteConnection {
    driver: SqliteDriver,
    connection: Arc<Mutex<rusqlite::Connection>>,
}

fn lock(connection: &Mutex<rusqlite::Connection>) -> MutexGuard<'_, rusqlite::Connection> {
    connection.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SqliteConnection {
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let connection = self.connection.clone();
        spawn_blocking(move || f(&lock(&connection))).await?
    }

    /// Run every statement of `sql`, sending rows and affected counts in order.
    ///
    /// Returns early without error when the receiving side is gone.
    fn run_batch(
        connection: &rusqlite::Connection,
        sql: &str,
        sender: &mpsc::Sender<QueryResult>,
    ) -> Result<()> {
        let mut batch = rusqlite::Batch::new(connection, sql);
        while let Some(mut statement) = batch.next()? {
            if statement.column_count() > 0 {
                let labels: RowNames = statement
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>()
                    .into();
                let count = labels.len();
                let mut rows = statement.raw_query();
                while let Some(row) = rows.next()? {
                    let values = (0..count)
                        .map(|i| row.get_ref(i).map(extract_value))
                        .collect::<rusqlite::Result<Box<[_]>>>()?;
                    let row = RowLabeled::new(labels.clone(), values);
                    if sender.blocking_send(QueryResult::Row(row)).is_err() {
                        return Ok(());
                    }
                }
            } else {
                let before = connection.last_insert_rowid();
                let rows_affected = statement.raw_execute()? as u64;
                let last = connection.last_insert_rowid();
                let affected = RowsAffected {
                    rows_affected,
                    last_affected_id: (rows_affected > 0 && last != before).then_some(last),
                };
                if sender.blocking_send(QueryResult::Affected(affected)).is_err() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = self.connection.clone();
        try_stream! {
            log::debug!("{}", query);
            let sql = query.into_sql();
            let (sender, mut receiver) = mpsc::channel(CHANNEL_CAPACITY);
            let task = spawn_blocking(move || {
                let result = Self::run_batch(&lock(&connection), &sql, &sender);
                if let Err(e) = &result {
                    log::error!("{:#}\nWhile running:\n{}", e, dbset_core::truncate_long!(sql));
                }
                result
            });
            while let Some(result) = receiver.recv().await {
                yield result;
            }
            task.await.map_err(Error::new)??;
        }
    }

    async fn describe_table(&mut self, table: &str) -> Result<Option<TableDescriptor>> {
        let table = table.to_string();
        self.blocking(move |connection| describe_table(connection, &table))
            .await
    }

    async fn table_names(&mut self) -> Result<Vec<String>> {
        self.blocking(table_names).await
    }
}

impl Connection for SqliteConnection {
    fn pool_url(url: &str) -> Result<String> {
        let parsed = SqliteUrl::parse(url)?;
        if !parsed.is_private_memory() {
            return Ok(url.into());
        }
        let name = format!(
            "dbset-{}-{}",
            std::process::id(),
            MEMORY_DATABASES.fetch_add(1, Ordering::Relaxed)
        );
        Ok(parsed.named_memory(&name))
    }

    async fn connect(driver: SqliteDriver, url: &str) -> Result<SqliteConnection> {
        let url = SqliteUrl::parse(url)?;
        let connection = spawn_blocking(move || url.open()).await??;
        Ok(Self {
            driver,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    async fn reset(&mut self) -> Result<()> {
        self.blocking(|connection| {
            if !connection.is_autocommit() {
                log::warn!("Rolling back a transaction left open on a pooled connection");
                connection.execute_batch("ROLLBACK;")?;
            }
            Ok(())
        })
        .await
    }
}
