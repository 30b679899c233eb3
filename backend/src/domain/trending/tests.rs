//! Tests for the trending score scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use tokio::sync::{Notify, mpsc};

use super::*;
use crate::domain::ports::{MockCityRepository, NewCity};
use crate::domain::{City, CityId, CityKey};
use crate::test_support::cities::{InMemoryCityRepository, stored_city};

fn cities_with_plan_counts(counts: &[i64]) -> Vec<City> {
    counts
        .iter()
        .enumerate()
        .map(|(i, count)| {
            let mut city = stored_city(&format!("city-{i}"), "xx", None);
            city.plan_count = *count;
            city
        })
        .collect()
}

fn scheduler_over(repository: Arc<dyn CityRepository>, page_size: usize) -> TrendingScoreScheduler {
    TrendingScoreScheduler::new(
        repository,
        Arc::new(PlanCountScorer),
        Arc::new(DefaultClock),
        TrendingConfig {
            page_size,
            ..TrendingConfig::default()
        },
    )
}

#[rstest]
#[case::single_page(10)]
#[case::several_pages(2)]
#[case::exact_multiple(5)]
#[tokio::test]
async fn every_city_gets_a_score(#[case] page_size: usize) {
    let repository = Arc::new(InMemoryCityRepository::with_cities(cities_with_plan_counts(
        &[0, 1, 5, 10, 100],
    )));
    let scheduler = scheduler_over(repository.clone(), page_size);

    let report = scheduler.run_once().await.expect("run completes");

    assert_eq!((report.updated, report.errors), (5, 0));
    for city in repository.snapshot() {
        assert_eq!(city.trending_score, PlanCountScorer.score(&city));
    }
}

#[tokio::test]
async fn failed_writes_are_counted_and_iteration_continues() {
    let cities = cities_with_plan_counts(&[1, 2, 3]);
    let broken = cities[1].id;
    let repository = Arc::new(InMemoryCityRepository::with_cities(cities));
    repository.fail_score_writes_for(broken);
    let scheduler = scheduler_over(repository.clone(), 500);

    let report = scheduler.run_once().await.expect("run completes");

    assert_eq!((report.updated, report.errors), (2, 1));
    let scored = repository
        .snapshot()
        .into_iter()
        .filter(|c| c.trending_score > 0.0)
        .count();
    assert_eq!(scored, 2);
}

#[tokio::test]
async fn listing_failure_aborts_and_releases_the_guard() {
    let mut repository = MockCityRepository::new();
    repository
        .expect_list_page()
        .times(2)
        .returning(|_, _| Err(CityRepositoryError::connection("database down")));
    let scheduler = scheduler_over(Arc::new(repository), 500);

    let first = scheduler.run_once().await;
    assert!(matches!(first, Err(TrendingError::Listing { offset: 0, .. })));
    assert!(!scheduler.is_running());
    let second = scheduler.run_once().await;
    assert!(matches!(second, Err(TrendingError::Listing { .. })));
}

/// City store whose first listing parks until released.
struct GatedRepository {
    inner: InMemoryCityRepository,
    gated: AtomicBool,
    entered: mpsc::UnboundedSender<()>,
    release: Arc<Notify>,
}

#[async_trait]
impl CityRepository for GatedRepository {
    async fn find_by_key(&self, key: &CityKey) -> Result<Option<City>, CityRepositoryError> {
        self.inner.find_by_key(key).await
    }

    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, city: &NewCity) -> Result<City, CityRepositoryError> {
        self.inner.insert(city).await
    }

    async fn list_page(&self, limit: usize, offset: usize) -> Result<Vec<City>, CityRepositoryError> {
        if self.gated.swap(false, Ordering::SeqCst) {
            let _ = self.entered.send(());
            self.release.notified().await;
        }
        self.inner.list_page(limit, offset).await
    }

    async fn set_image_url(&self, id: &CityId, image_url: &str) -> Result<(), CityRepositoryError> {
        self.inner.set_image_url(id, image_url).await
    }

    async fn set_trending_score(&self, id: &CityId, score: f64) -> Result<(), CityRepositoryError> {
        self.inner.set_trending_score(id, score).await
    }

    async fn adjust_plan_count(
        &self,
        id: &CityId,
        delta: i64,
    ) -> Result<Option<City>, CityRepositoryError> {
        self.inner.adjust_plan_count(id, delta).await
    }
}

#[tokio::test]
async fn overlapping_runs_are_rejected() {
    let (entered, mut entered_rx) = mpsc::unbounded_channel();
    let release = Arc::new(Notify::new());
    let repository = Arc::new(GatedRepository {
        inner: InMemoryCityRepository::with_cities(cities_with_plan_counts(&[4])),
        gated: AtomicBool::new(true),
        entered,
        release: release.clone(),
    });
    let scheduler = Arc::new(scheduler_over(repository, 500));

    let first = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.run_once().await }
    });
    entered_rx.recv().await.expect("first run listing");

    assert!(matches!(
        scheduler.run_once().await,
        Err(TrendingError::AlreadyRunning)
    ));

    release.notify_one();
    let report = first.await.expect("join").expect("first run completes");
    assert_eq!(report.updated, 1);
}
