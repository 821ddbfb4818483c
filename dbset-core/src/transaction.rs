use crate::{
    Database, DbError, Driver, Executor, PooledConnection, Result, Row, Table,
    session::Session,
    stream::{Stream, StreamExt},
};
use async_stream::try_stream;
use std::{pin::pin, sync::atomic::{AtomicBool, Ordering}};
use tokio::sync::Mutex;

/// Explicit transaction scope, every [`Table`] obtained from it runs on its single connection.
///
/// Neither committed nor rolled back when dropped: the connection goes back to the
/// pool and is rolled back before being handed out again.
pub struct Transaction<'db, D: Driver> {
    db: &'db Database<D>,
    connection: Mutex<PooledConnection<D::Connection>>,
    finished: AtomicBool,
}

impl<'db, D: Driver> Transaction<'db, D> {
    pub(crate) async fn begin(db: &'db Database<D>) -> Result<Self> {
        let mut connection = db.pool().acquire().await?;
        let mut sql = String::new();
        db.schema().writer().write_transaction_begin(&mut sql);
        connection
            .execute(sql.into())
            .await
            .map_err(|e| DbError::Transaction(format!("failed to begin: {:#}", e)))?;
        Ok(Self {
            db,
            connection: Mutex::new(connection),
            finished: AtomicBool::new(false),
        })
    }

    pub fn table(&self, name: impl Into<String>) -> Table<'_, D> {
        Table::new(self.db, Session::Transaction(&self.connection), name.into())
    }

    /// Run raw SQL inside the transaction, yielding the rows it returns.
    pub fn query(&self, sql: impl Into<String>) -> impl Stream<Item = Result<Row>> + Send {
        let sql = sql.into();
        try_stream! {
            self.db.check_query(&sql)?;
            let mut connection = self.connection.lock().await;
            let mut stream = pin!(connection.fetch(sql.into()));
            while let Some(row) = stream.next().await {
                yield Row::from(row?);
            }
        }
    }

    pub async fn commit(self) -> Result<()> {
        self.finish(true).await
    }

    /// Undo every change, the schema cache is cleared since created tables and columns are gone too.
    pub async fn rollback(self) -> Result<()> {
        self.finish(false).await
    }

    async fn finish(&self, commit: bool) -> Result<()> {
        self.finished.store(true, Ordering::Release);
        let mut sql = String::new();
        let writer = self.db.schema().writer();
        if commit {
            writer.write_transaction_commit(&mut sql);
        } else {
            writer.write_transaction_rollback(&mut sql);
        }
        let result = self.connection.lock().await.execute(sql.into()).await;
        if !commit || result.is_err() {
            self.db.schema().invalidate_all().await;
        }
        result.map(|_| ()).map_err(|e| {
            let e = DbError::Transaction(format!(
                "failed to {}: {:#}",
                if commit { "commit" } else { "roll back" },
                e
            ));
            log::error!("{}", e);
            e.into()
        })
    }
}

impl<D: Driver> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if !self.finished.load(Ordering::Acquire) {
            log::warn!("Transaction dropped without commit or rollback, it will be rolled back");
            self.db.schema().try_invalidate_all();
        }
    }
}
