//! Driven port for the relational city store.
//!
//! The store is the only cross-process guard for city creation: adapters must
//! enforce uniqueness of the normalized `(name, country_code)` pair and report
//! a violation as [`CityRepositoryError::DuplicateKey`] so the resolver can
//! reconcile instead of failing.

use async_trait::async_trait;

use crate::domain::{City, CityId, CityKey, GeoPoint};

use super::define_port_error;

define_port_error! {
    /// Errors raised by city store adapters.
    pub enum CityRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } => "city store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "city store query failed: {message}",
        /// The natural key already exists (concurrent insert race).
        DuplicateKey { message: String } => "city natural key already exists: {message}",
    }
}

/// Insert payload for a new city row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCity {
    pub key: CityKey,
    pub location: Option<GeoPoint>,
}

/// Port for city persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CityRepository: Send + Sync {
    /// Look up a city by its normalized natural key.
    async fn find_by_key(&self, key: &CityKey) -> Result<Option<City>, CityRepositoryError>;

    /// Look up a city by identifier.
    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError>;

    /// Insert a new row, failing with `DuplicateKey` on a natural-key clash.
    async fn insert(&self, city: &NewCity) -> Result<City, CityRepositoryError>;

    /// List cities ordered by identifier.
    async fn list_page(&self, limit: usize, offset: usize)
    -> Result<Vec<City>, CityRepositoryError>;

    /// Store an image URL for the city.
    async fn set_image_url(&self, id: &CityId, image_url: &str)
    -> Result<(), CityRepositoryError>;

    /// Store a recomputed trending score for the city.
    async fn set_trending_score(&self, id: &CityId, score: f64)
    -> Result<(), CityRepositoryError>;

    /// Add `delta` to the plan counter, clamping at zero.
    ///
    /// Returns `None` when the city does not exist.
    async fn adjust_plan_count(
        &self,
        id: &CityId,
        delta: i64,
    ) -> Result<Option<City>, CityRepositoryError>;
}
