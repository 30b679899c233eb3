//! Redis-backed idempotency lock adapter.

mod redis_idempotency_lock;

pub use redis_idempotency_lock::{RedisIdempotencyLock, RedisLockSetupError};
