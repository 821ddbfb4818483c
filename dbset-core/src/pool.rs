use crate::{Connection, DbError, Result};
use parking_lot::Mutex;
use std::{
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed size pool of connections to the same url.
pub struct Pool<C: Connection> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C: Connection> {
    driver: C::Driver,
    url: String,
    size: usize,
    idle: Mutex<Vec<C>>,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
}

impl<C: Connection> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Connection> Pool<C> {
    /// Create the pool, one connection is opened right away to surface url problems early.
    pub async fn connect(driver: C::Driver, url: &str, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(DbError::Validation("pool_size must be at least 1".into()).into());
        }
        let url = C::pool_url(url)?;
        let first = C::connect(driver.clone(), &url).await?;
        log::debug!("Connected to {}", url);
        Ok(Self {
            inner: Arc::new(PoolInner {
                driver,
                url,
                size,
                idle: Mutex::new(vec![first]),
                permits: Arc::new(Semaphore::new(size)),
                closed: AtomicBool::new(false),
            }),
        })
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Connections currently waiting to be reused.
    pub fn idle(&self) -> usize {
        self.inner.idle.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Wait for a free slot and hand out a clean connection.
    pub async fn acquire(&self) -> Result<PooledConnection<C>> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DbError::Connection("The connection pool is closed".into()))?;
        let idle = self.inner.idle.lock().pop();
        let connection = match idle {
            Some(mut connection) => match connection.reset().await {
                Ok(()) => connection,
                Err(e) => {
                    log::warn!("Discarding a connection that could not be reset: {:#}", e);
                    C::connect(self.inner.driver.clone(), &self.inner.url).await?
                }
            },
            None => C::connect(self.inner.driver.clone(), &self.inner.url).await?,
        };
        Ok(PooledConnection {
            connection: ManuallyDrop::new(connection),
            pool: self.inner.clone(),
            _permit: permit,
        })
    }

    /// Refuse further acquisitions and release the idle connections.
    ///
    /// Connections still checked out are released when their guard drops.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.permits.close();
        self.inner.idle.lock().clear();
    }
}

/// Connection checked out from a [`Pool`], it goes back to the pool on drop.
pub struct PooledConnection<C: Connection> {
    connection: ManuallyDrop<C>,
    pool: Arc<PoolInner<C>>,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connection> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl<C: Connection> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}

impl<C: Connection> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        // SAFETY: the connection is never touched again after this point
        let connection = unsafe { ManuallyDrop::take(&mut self.connection) };
        if !self.pool.closed.load(Ordering::Acquire) {
            self.pool.idle.lock().push(connection);
        }
    }
}
