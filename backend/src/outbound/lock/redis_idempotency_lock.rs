//! `IdempotencyLock` over Redis `SET NX PX` and `DEL`.
//!
//! The set-if-absent with a millisecond expiry is a single atomic command, so
//! two listeners racing on the same key cannot both observe success.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{IdempotencyLock, IdempotencyLockError};

/// Errors raised while building the Redis pool.
#[derive(Debug, thiserror::Error)]
pub enum RedisLockSetupError {
    #[error("invalid redis url: {0}")]
    Url(#[source] RedisError),
    #[error("failed to build redis pool: {0}")]
    Pool(#[source] RedisError),
}

/// Redis lock adapter sharing a `bb8` connection pool.
#[derive(Clone)]
pub struct RedisIdempotencyLock {
    pool: Pool<RedisConnectionManager>,
}

impl RedisIdempotencyLock {
    /// Connect a pool to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RedisLockSetupError`] when the URL is malformed or the
    /// initial connections cannot be opened.
    pub async fn connect(redis_url: &str, max_size: u32) -> Result<Self, RedisLockSetupError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(RedisLockSetupError::Url)?;
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .await
            .map_err(RedisLockSetupError::Pool)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: RunError<RedisError>) -> IdempotencyLockError {
    match error {
        RunError::User(err) => IdempotencyLockError::connection(err.to_string()),
        RunError::TimedOut => IdempotencyLockError::connection("timed out waiting for redis"),
    }
}

fn map_command_error(error: RedisError) -> IdempotencyLockError {
    if error.is_connection_dropped() || error.is_connection_refusal() || error.is_timeout() {
        IdempotencyLockError::connection(error.to_string())
    } else {
        IdempotencyLockError::command(error.to_string())
    }
}

/// Millisecond TTL for `PX`; Redis rejects zero so the floor is one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// `SET key <marker> NX PX ttl` with a fresh opaque marker per acquisition.
fn acquire_command(key: &str, ttl: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key)
        .arg(Uuid::new_v4().to_string())
        .arg("NX")
        .arg("PX")
        .arg(ttl_millis(ttl));
    cmd
}

#[async_trait]
impl IdempotencyLock for RedisIdempotencyLock {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, IdempotencyLockError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let reply: Option<String> = acquire_command(key, ttl)
            .query_async(&mut *conn)
            .await
            .map_err(map_command_error)?;
        let acquired = reply.is_some();
        debug!(key, acquired, "redis lock acquire");
        Ok(acquired)
    }

    async fn release(&self, key: &str) -> Result<(), IdempotencyLockError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(map_command_error)?;
        debug!(key, removed, "redis lock release");
        Ok(())
    }
}
