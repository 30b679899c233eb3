//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and `schema.rs` stay
//!   private to this module.
//! - **Async pooling**: `bb8` pools through `diesel-async`.
//! - **Embedded migrations**: applied once at startup on a blocking
//!   connection.
//!
//! # Example
//!
//! ```ignore
//! use city_service::outbound::persistence::{DbPool, DieselCityRepository};
//!
//! let pool = DbPool::connect("postgres://localhost/cities", 10).await?;
//! let repo = DieselCityRepository::new(pool);
//! ```

mod diesel_city_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_city_repository::DieselCityRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{CHECKOUT_TIMEOUT, DbPool, PoolError};
