use crate::{Executor, Result};
use std::future::Future;

pub trait Connection: Executor + 'static {
    /// Open a new connection to the given URL.
    fn connect(driver: Self::Driver, url: &str) -> impl Future<Output = Result<Self>> + Send;

    /// Url opened by every connection of a pool, resolved once when the pool is created.
    ///
    /// Engines whose url names a private database per connection map it to a shared one here.
    fn pool_url(url: &str) -> Result<String> {
        Ok(url.into())
    }

    /// Bring the connection back to a clean state before it is handed out again.
    ///
    /// A transaction left open by a previous user must be rolled back here.
    fn reset(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
