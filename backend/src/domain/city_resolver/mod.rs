//! Race-safe get-or-create for cities keyed by `(name, country_code)`.
//!
//! Many processes may resolve the same city at once. The resolver never
//! takes a lock: it looks the key up, tries to insert on a miss, and treats
//! a unique-constraint violation as "someone else won" by re-reading the row.
//! Only the insert that actually succeeded publishes `cityCreated`, on a
//! detached task so a slow event sink never holds up the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::ports::{CityEventPublisher, CityRepository, CityRepositoryError, NewCity};
use crate::domain::{
    City, CityCreatedEvent, CityId, CityKey, CityValidationError, GeoPoint, TraceId,
};

/// Failures surfaced by [`CityResolver`].
#[derive(Debug, Error)]
pub enum CityResolutionError {
    /// Name or country code was blank after normalization.
    #[error("invalid city key: {0}")]
    Validation(#[from] CityValidationError),
    /// Insert lost a uniqueness race but the winning row could not be read.
    #[error("city {key} reported as duplicate but was not found on re-read")]
    Integrity { key: String },
    /// The store failed for a reason other than a key clash.
    #[error("city store failure: {0}")]
    Storage(#[source] CityRepositoryError),
    /// No city exists with the requested identifier.
    #[error("city {0} not found")]
    NotFound(CityId),
}

impl From<CityRepositoryError> for CityResolutionError {
    fn from(error: CityRepositoryError) -> Self {
        Self::Storage(error)
    }
}

/// Domain service owning city creation.
#[derive(Clone)]
pub struct CityResolver {
    repository: Arc<dyn CityRepository>,
    publisher: Arc<dyn CityEventPublisher>,
}

impl CityResolver {
    /// Build a resolver over the given store and event sink.
    pub fn new(repository: Arc<dyn CityRepository>, publisher: Arc<dyn CityEventPublisher>) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Return the city for `(name, country_code)`, creating it when absent.
    ///
    /// `location` is only stored when this call performs the insert.
    pub async fn resolve_or_create(
        &self,
        name: &str,
        country_code: &str,
        location: Option<GeoPoint>,
    ) -> Result<City, CityResolutionError> {
        let key = CityKey::new(name, country_code)?;

        if let Some(existing) = self.repository.find_by_key(&key).await? {
            debug!(city_id = %existing.id, key = %key, "city already exists");
            return Ok(existing);
        }

        let new_city = NewCity {
            key: key.clone(),
            location,
        };
        match self.repository.insert(&new_city).await {
            Ok(created) => {
                info!(city_id = %created.id, key = %key, "created city");
                self.publish_created(&created);
                Ok(created)
            }
            Err(CityRepositoryError::DuplicateKey { .. }) => self.reconcile_duplicate(&key).await,
            Err(error) => Err(CityResolutionError::Storage(error)),
        }
    }

    /// Fetch one city by identifier.
    pub async fn get(&self, id: &CityId) -> Result<City, CityResolutionError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CityResolutionError::NotFound(*id))
    }

    /// Apply `delta` to the city's plan counter (never below zero).
    pub async fn adjust_plan_count(
        &self,
        id: &CityId,
        delta: i64,
    ) -> Result<City, CityResolutionError> {
        let updated = self
            .repository
            .adjust_plan_count(id, delta)
            .await?
            .ok_or(CityResolutionError::NotFound(*id))?;
        debug!(city_id = %id, delta, plan_count = updated.plan_count, "adjusted plan count");
        Ok(updated)
    }

    async fn reconcile_duplicate(&self, key: &CityKey) -> Result<City, CityResolutionError> {
        match self.repository.find_by_key(key).await? {
            Some(winner) => {
                debug!(city_id = %winner.id, key = %key, "lost creation race; using existing city");
                Ok(winner)
            }
            None => Err(CityResolutionError::Integrity {
                key: key.to_string(),
            }),
        }
    }

    /// Fire `cityCreated` without awaiting the sink. Failures are logged and
    /// never retried. The caller's trace id follows the task.
    fn publish_created(&self, city: &City) {
        let event = CityCreatedEvent::for_city(city);
        let publisher = Arc::clone(&self.publisher);
        let publish = async move {
            if let Err(error) = publisher.publish_city_created(&event).await {
                warn!(
                    city_id = %event.city_id,
                    event_id = %event.event_id,
                    error = %error,
                    error_kind = error.kind(),
                    "failed to publish cityCreated event"
                );
            }
        };
        match TraceId::current() {
            Some(trace_id) => {
                tokio::spawn(TraceId::scope(trace_id, publish));
            }
            None => {
                tokio::spawn(publish);
            }
        }
    }
}
