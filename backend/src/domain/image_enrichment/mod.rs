//! Idempotent consumer of `cityCreated` events that attaches a city photo.
//!
//! Events arrive at least once. Each delivery first claims a TTL-bounded lock
//! keyed by the event id; a delivery that finds the key taken stops without
//! side effects. The lock is released after processing whatever the result,
//! and a city that already carries an image is left alone, so a redelivery
//! after the lock is gone is still a no-op.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::CityCreatedEvent;
use crate::domain::ports::{
    CityRepository, CityRepositoryError, Geocoder, GeocoderError, IdempotencyLock,
};

/// Namespace for lock keys.
pub const LOCK_KEY_PREFIX: &str = "city-image-enrichment:lock:";
/// Default lifetime of a lock key.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);
/// Default `maxwidth` requested for city photos.
pub const DEFAULT_PHOTO_MAX_WIDTH: u32 = 800;

/// Lock key for one event delivery.
///
/// # Examples
/// ```
/// use city_service::domain::image_enrichment::lock_key;
/// use uuid::Uuid;
///
/// assert_eq!(
///     lock_key(&Uuid::nil()),
///     "city-image-enrichment:lock:00000000-0000-0000-0000-000000000000"
/// );
/// ```
pub fn lock_key(event_id: &Uuid) -> String {
    format!("{LOCK_KEY_PREFIX}{event_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageEnrichmentConfig {
    pub lock_ttl: Duration,
    pub photo_max_width: u32,
}

impl Default for ImageEnrichmentConfig {
    fn default() -> Self {
        Self {
            lock_ttl: DEFAULT_LOCK_TTL,
            photo_max_width: DEFAULT_PHOTO_MAX_WIDTH,
        }
    }
}

/// How a delivery ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Another delivery of the same event holds the lock.
    Duplicate,
    /// The lock store could not be reached; treated as not acquired.
    LockUnavailable,
    CityNotFound,
    AlreadyEnriched,
    /// Forward geocoding found no place for the city.
    NoPlace,
    /// The place has no photos.
    NoPhotos,
    Enriched { image_url: String },
}

impl EnrichmentOutcome {
    /// Short label for logs and HTTP replies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::LockUnavailable => "lock_unavailable",
            Self::CityNotFound => "city_not_found",
            Self::AlreadyEnriched => "already_enriched",
            Self::NoPlace => "no_place",
            Self::NoPhotos => "no_photos",
            Self::Enriched { .. } => "enriched",
        }
    }
}

/// Downstream failures after the lock was acquired.
#[derive(Debug, Error)]
pub enum ImageEnrichmentError {
    #[error("city store failure: {0}")]
    Storage(#[from] CityRepositoryError),
    #[error("geocoder failure: {0}")]
    Geocoder(#[from] GeocoderError),
}

/// Listener for `cityCreated` events.
#[derive(Clone)]
pub struct CityImageEnricher {
    repository: Arc<dyn CityRepository>,
    geocoder: Arc<dyn Geocoder>,
    lock: Arc<dyn IdempotencyLock>,
    config: ImageEnrichmentConfig,
}

impl CityImageEnricher {
    pub fn new(
        repository: Arc<dyn CityRepository>,
        geocoder: Arc<dyn Geocoder>,
        lock: Arc<dyn IdempotencyLock>,
        config: ImageEnrichmentConfig,
    ) -> Self {
        Self {
            repository,
            geocoder,
            lock,
            config,
        }
    }

    /// Process one delivery of a `cityCreated` event.
    pub async fn handle_city_created(
        &self,
        event: &CityCreatedEvent,
    ) -> Result<EnrichmentOutcome, ImageEnrichmentError> {
        let key = lock_key(&event.event_id);
        match self.lock.try_acquire(&key, self.config.lock_ttl).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(event_id = %event.event_id, "duplicate cityCreated delivery; skipping");
                return Ok(EnrichmentOutcome::Duplicate);
            }
            Err(err) => {
                warn!(event_id = %event.event_id, error = %err, "could not acquire enrichment lock");
                return Ok(EnrichmentOutcome::LockUnavailable);
            }
        }

        let result = self.enrich(event).await;

        if let Err(err) = self.lock.release(&key).await {
            warn!(event_id = %event.event_id, error = %err, "failed to release enrichment lock");
        }
        result
    }

    async fn enrich(
        &self,
        event: &CityCreatedEvent,
    ) -> Result<EnrichmentOutcome, ImageEnrichmentError> {
        let Some(city) = self.repository.find_by_id(&event.city_id).await? else {
            warn!(city_id = %event.city_id, event_id = %event.event_id, "city from event not found");
            return Ok(EnrichmentOutcome::CityNotFound);
        };
        if city.has_image() {
            debug!(city_id = %city.id, "city already has an image");
            return Ok(EnrichmentOutcome::AlreadyEnriched);
        }

        let query = format!("{}, {}", city.name, city.country_code);
        let Some(place) = self.geocoder.geocode(&query).await? else {
            info!(city_id = %city.id, %query, "no place found for city");
            return Ok(EnrichmentOutcome::NoPlace);
        };

        let photo = self
            .geocoder
            .place_details(&place.place_id)
            .await?
            .and_then(|details| details.photos.into_iter().next());
        let Some(photo) = photo else {
            info!(city_id = %city.id, place_id = %place.place_id, "place has no photos");
            return Ok(EnrichmentOutcome::NoPhotos);
        };

        let image_url = self
            .geocoder
            .photo_url(&photo.reference, self.config.photo_max_width);
        self.repository.set_image_url(&city.id, &image_url).await?;
        info!(city_id = %city.id, "stored city image");
        Ok(EnrichmentOutcome::Enriched { image_url })
    }
}
