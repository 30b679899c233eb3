//! Driven port for short-lived mutual-exclusion keys.
//!
//! Used to deduplicate event-driven side effects under at-least-once
//! delivery. A key expires on its own after the TTL, which bounds how long a
//! crashed holder can block reprocessing.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by lock store adapters.
    pub enum IdempotencyLockError {
        /// Lock store connection could not be established.
        Connection { message: String } => "lock store connection failed: {message}",
        /// The lock command failed.
        Command { message: String } => "lock store command failed: {message}",
    }
}

/// Port for TTL-bounded mutual exclusion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyLock: Send + Sync {
    /// Atomically create `key` if absent. Returns `false` when already held.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, IdempotencyLockError>;

    /// Delete `key`.
    async fn release(&self, key: &str) -> Result<(), IdempotencyLockError>;
}
