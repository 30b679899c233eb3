//! Interval driver for the trending score recompute.
//!
//! The first run happens one full interval after start-up; operators can
//! trigger an immediate run through `POST /admin/trending/run`. A tick that
//! lands while a run is still in flight is dropped by the single-flight guard
//! and logged.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{TraceId, TrendingError, TrendingScoreScheduler};

/// Spawn the recompute loop. It exits once `shutdown` observes `true` or its
/// sender is dropped.
pub fn spawn_trending_schedule(
    scheduler: Arc<TrendingScoreScheduler>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = scheduler.interval();
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = period.as_secs(), "trending schedule started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    TraceId::in_new_scope(run_scheduled(&scheduler)).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("trending schedule stopped");
    })
}

async fn run_scheduled(scheduler: &TrendingScoreScheduler) {
    match scheduler.run_once().await {
        Ok(report) => debug!(
            updated = report.updated,
            errors = report.errors,
            "scheduled trending recompute finished"
        ),
        Err(TrendingError::AlreadyRunning) => {
            debug!("scheduled trending tick skipped; a run is in progress");
        }
        Err(err) => warn!(error = %err, "scheduled trending recompute failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockable::DefaultClock;

    use crate::domain::{PlanCountScorer, TrendingConfig};
    use crate::test_support::cities::{InMemoryCityRepository, stored_city};

    fn scheduler_over(repo: Arc<InMemoryCityRepository>, interval: Duration) -> Arc<TrendingScoreScheduler> {
        Arc::new(TrendingScoreScheduler::new(
            repo,
            Arc::new(PlanCountScorer),
            Arc::new(DefaultClock),
            TrendingConfig {
                interval,
                page_size: 10,
            },
        ))
    }

    #[tokio::test]
    async fn ticks_recompute_scores_until_shutdown() {
        let mut city = stored_city("oslo", "no", None);
        city.plan_count = 3;
        let repo = Arc::new(InMemoryCityRepository::with_cities(vec![city]));
        let (tx, rx) = watch::channel(false);

        let handle = spawn_trending_schedule(scheduler_over(repo.clone(), Duration::from_millis(10)), rx);
        time::sleep(Duration::from_millis(80)).await;
        tx.send(true).expect("loop still listening");
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop stops")
            .expect("loop did not panic");

        let scored = repo.snapshot();
        assert!((scored[0].trending_score - 4_f64.ln()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nothing_runs_before_the_first_interval() {
        let mut city = stored_city("oslo", "no", None);
        city.plan_count = 3;
        let repo = Arc::new(InMemoryCityRepository::with_cities(vec![city]));
        let (tx, rx) = watch::channel(false);

        let handle = spawn_trending_schedule(scheduler_over(repo.clone(), Duration::from_secs(3600)), rx);
        time::sleep(Duration::from_millis(20)).await;
        drop(tx);
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop stops when the sender is dropped")
            .expect("loop did not panic");

        assert_eq!(repo.snapshot()[0].trending_score, 0.0);
    }
}
