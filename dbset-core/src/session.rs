use crate::{Connection, Pool, PooledConnection, Result};
use std::ops::{Deref, DerefMut};
use tokio::sync::{Mutex, MutexGuard};

/// Where the statements of a [`crate::Table`] go: any pooled connection, or the one of a transaction.
pub(crate) enum Session<'a, C: Connection> {
    Pool(&'a Pool<C>),
    Transaction(&'a Mutex<PooledConnection<C>>),
}

impl<C: Connection> Clone for Session<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Connection> Copy for Session<'_, C> {}

impl<'a, C: Connection> Session<'a, C> {
    /// Exclusive access to a connection until the returned guard drops.
    pub(crate) async fn acquire(&self) -> Result<SessionConnection<'a, C>> {
        Ok(match *self {
            Session::Pool(pool) => SessionConnection::Pooled(pool.acquire().await?),
            Session::Transaction(connection) => {
                SessionConnection::Transaction(connection.lock().await)
            }
        })
    }
}

pub(crate) enum SessionConnection<'a, C: Connection> {
    Pooled(PooledConnection<C>),
    Transaction(MutexGuard<'a, PooledConnection<C>>),
}

impl<C: Connection> Deref for SessionConnection<'_, C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        match self {
            SessionConnection::Pooled(v) => v,
            SessionConnection::Transaction(v) => v,
        }
    }
}

impl<C: Connection> DerefMut for SessionConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            SessionConnection::Pooled(v) => v,
            SessionConnection::Transaction(v) => v,
        }
    }
}
