//! Shared `bb8` pool of async Postgres connections for the city store.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection, RunError};

/// How long a caller waits for a free connection before the store is
/// reported unreachable.
pub const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool construction and checkout failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("could not build city store pool: {0}")]
    Build(String),
    #[error("no city store connection became free within the checkout timeout")]
    Exhausted,
    #[error("could not open city store connection: {0}")]
    Connect(String),
}

impl From<RunError> for PoolError {
    fn from(error: RunError) -> Self {
        match error {
            RunError::TimedOut => Self::Exhausted,
            RunError::User(inner) => Self::Connect(inner.to_string()),
        }
    }
}

/// Cloneable handle; clones share the same connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Connect with at most `max_size` connections, keeping one idle.
    ///
    /// ```ignore
    /// let pool = DbPool::connect("postgres://cities@localhost/cities", 10).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when the idle connection cannot be opened.
    pub async fn connect(database_url: &str, max_size: u32) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        Pool::builder()
            .max_size(max_size.max(1))
            .min_idle(Some(1))
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .await
            .map(|inner| Self { inner })
            .map_err(|err| PoolError::Build(err.to_string()))
    }

    /// Check out a connection for one repository call.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] after [`CHECKOUT_TIMEOUT`], or
    /// [`PoolError::Connect`] when a fresh connection fails to open.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(PoolError::from)
    }
}
