//! In-memory city store, event sink, and lock store doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Barrier;

use crate::domain::ports::{
    CityEventPublishError, CityEventPublisher, CityRepository, CityRepositoryError,
    IdempotencyLock, IdempotencyLockError, NewCity,
};
use crate::domain::{City, CityCreatedEvent, CityId, CityKey, GeoPoint};

fn lock<'a, T>(mutex: &'a Mutex<T>, label: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{label} mutex poisoned"),
    }
}

/// Build a stored city the way the database would.
pub fn stored_city(name: &str, country_code: &str, location: Option<GeoPoint>) -> City {
    let now = Utc::now();
    City {
        id: CityId::random(),
        name: name.trim().to_lowercase(),
        country_code: country_code.trim().to_lowercase(),
        location,
        image_url: None,
        plan_count: 0,
        trending_score: 0.0,
        created_at: now,
        updated_at: now,
    }
}

/// City store enforcing natural-key uniqueness like the `cities` table.
///
/// An optional lookup barrier parks every key-lookup miss until the given
/// number of callers have missed, which forces concurrent resolvers into the
/// insert race.
#[derive(Default)]
pub struct InMemoryCityRepository {
    cities: Mutex<Vec<City>>,
    lookup_barrier: Option<Barrier>,
    insert_calls: AtomicUsize,
    failing_score_writes: Mutex<Vec<CityId>>,
}

impl InMemoryCityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cities(cities: Vec<City>) -> Self {
        Self {
            cities: Mutex::new(cities),
            ..Self::default()
        }
    }

    /// Hold the first `parties` lookup misses until all of them have arrived.
    pub fn with_lookup_barrier(parties: usize) -> Self {
        Self {
            lookup_barrier: Some(Barrier::new(parties)),
            ..Self::default()
        }
    }

    /// Make `set_trending_score` fail for `id`.
    pub fn fail_score_writes_for(&self, id: CityId) {
        lock(&self.failing_score_writes, "score failures").push(id);
    }

    pub fn snapshot(&self) -> Vec<City> {
        lock(&self.cities, "cities").clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    fn find_key(&self, key: &CityKey) -> Option<City> {
        lock(&self.cities, "cities")
            .iter()
            .find(|c| c.name == key.name() && c.country_code == key.country_code())
            .cloned()
    }

    fn update<F>(&self, id: &CityId, apply: F) -> Option<City>
    where
        F: FnOnce(&mut City),
    {
        let mut cities = lock(&self.cities, "cities");
        let city = cities.iter_mut().find(|c| &c.id == id)?;
        apply(city);
        city.updated_at = Utc::now();
        Some(city.clone())
    }
}

#[async_trait]
impl CityRepository for InMemoryCityRepository {
    async fn find_by_key(&self, key: &CityKey) -> Result<Option<City>, CityRepositoryError> {
        let found = self.find_key(key);
        if found.is_none() {
            if let Some(barrier) = &self.lookup_barrier {
                barrier.wait().await;
            }
        }
        Ok(found)
    }

    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError> {
        Ok(lock(&self.cities, "cities")
            .iter()
            .find(|c| &c.id == id)
            .cloned())
    }

    async fn insert(&self, city: &NewCity) -> Result<City, CityRepositoryError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut cities = lock(&self.cities, "cities");
        let clash = cities
            .iter()
            .any(|c| c.name == city.key.name() && c.country_code == city.key.country_code());
        if clash {
            return Err(CityRepositoryError::duplicate_key(format!(
                "cities_name_country_code_key ({})",
                city.key
            )));
        }
        let created = stored_city(city.key.name(), city.key.country_code(), city.location);
        cities.push(created.clone());
        Ok(created)
    }

    async fn list_page(&self, limit: usize, offset: usize) -> Result<Vec<City>, CityRepositoryError> {
        let mut cities = self.snapshot();
        cities.sort_by_key(|c| *c.id.as_uuid());
        Ok(cities.into_iter().skip(offset).take(limit).collect())
    }

    async fn set_image_url(&self, id: &CityId, image_url: &str) -> Result<(), CityRepositoryError> {
        self.update(id, |c| c.image_url = Some(image_url.to_owned()))
            .map(|_| ())
            .ok_or_else(|| CityRepositoryError::query(format!("city {id} not found")))
    }

    async fn set_trending_score(&self, id: &CityId, score: f64) -> Result<(), CityRepositoryError> {
        if lock(&self.failing_score_writes, "score failures").contains(id) {
            return Err(CityRepositoryError::query("scripted score write failure"));
        }
        self.update(id, |c| c.trending_score = score)
            .map(|_| ())
            .ok_or_else(|| CityRepositoryError::query(format!("city {id} not found")))
    }

    async fn adjust_plan_count(
        &self,
        id: &CityId,
        delta: i64,
    ) -> Result<Option<City>, CityRepositoryError> {
        Ok(self.update(id, |c| c.plan_count = c.plan_count.saturating_add(delta).max(0)))
    }
}

/// How long [`RecordingCityEventPublisher::wait_for_events`] waits.
const EVENT_WAIT: Duration = Duration::from_secs(2);

/// Event sink that records every published event.
#[derive(Default)]
pub struct RecordingCityEventPublisher {
    events: Mutex<Vec<CityCreatedEvent>>,
    fail: bool,
    hang: bool,
}

impl RecordingCityEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that records the attempt and then reports a transport failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Sink that records the attempt and then never completes.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<CityCreatedEvent> {
        lock(&self.events, "events").clone()
    }

    /// Events seen once at least `count` have arrived, or after a bounded
    /// wait. Publishing runs on a detached task, so callers poll here.
    pub async fn wait_for_events(&self, count: usize) -> Vec<CityCreatedEvent> {
        let deadline = tokio::time::Instant::now() + EVENT_WAIT;
        loop {
            let events = self.events();
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl CityEventPublisher for RecordingCityEventPublisher {
    async fn publish_city_created(
        &self,
        event: &CityCreatedEvent,
    ) -> Result<(), CityEventPublishError> {
        lock(&self.events, "events").push(event.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(CityEventPublishError::transport("event sink unreachable"));
        }
        Ok(())
    }
}

/// Lock store keeping keys in a map. TTLs are recorded but never expire.
#[derive(Default)]
pub struct InMemoryIdempotencyLock {
    held: Mutex<HashMap<String, Duration>>,
    acquire_calls: AtomicUsize,
    releases: Mutex<Vec<String>>,
    fail_acquire: bool,
    fail_release: bool,
}

impl InMemoryIdempotencyLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock store whose acquire command always errors.
    pub fn failing_acquire() -> Self {
        Self {
            fail_acquire: true,
            ..Self::default()
        }
    }

    /// Lock store whose release command always errors.
    pub fn failing_release() -> Self {
        Self {
            fail_release: true,
            ..Self::default()
        }
    }

    /// Pretend another consumer already holds `key`.
    pub fn hold(&self, key: impl Into<String>, ttl: Duration) {
        lock(&self.held, "held keys").insert(key.into(), ttl);
    }

    pub fn is_held(&self, key: &str) -> bool {
        lock(&self.held, "held keys").contains_key(key)
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        lock(&self.held, "held keys").get(key).copied()
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> Vec<String> {
        lock(&self.releases, "releases").clone()
    }
}

#[async_trait]
impl IdempotencyLock for InMemoryIdempotencyLock {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, IdempotencyLockError> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_acquire {
            return Err(IdempotencyLockError::connection("lock store unreachable"));
        }
        let mut held = lock(&self.held, "held keys");
        if held.contains_key(key) {
            return Ok(false);
        }
        held.insert(key.to_owned(), ttl);
        Ok(true)
    }

    async fn release(&self, key: &str) -> Result<(), IdempotencyLockError> {
        lock(&self.releases, "releases").push(key.to_owned());
        if self.fail_release {
            return Err(IdempotencyLockError::command("DEL failed"));
        }
        lock(&self.held, "held keys").remove(key);
        Ok(())
    }
}
