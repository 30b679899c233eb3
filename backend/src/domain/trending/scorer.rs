//! Pluggable trending score functions.

use crate::domain::City;

/// Computes a city's trending score from its stored state.
pub trait TrendingScorer: Send + Sync {
    fn score(&self, city: &City) -> f64;
}

/// Default scorer: `ln(1 + plan_count)`.
///
/// # Examples
/// ```
/// use city_service::domain::trending::{PlanCountScorer, TrendingScorer};
/// # use city_service::domain::{City, CityId};
/// # let now = chrono::Utc::now();
/// # let city = City {
/// #     id: CityId::random(), name: "oslo".into(), country_code: "no".into(),
/// #     location: None, image_url: None, plan_count: 0, trending_score: 0.0,
/// #     created_at: now, updated_at: now,
/// # };
/// assert_eq!(PlanCountScorer.score(&city), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanCountScorer;

impl TrendingScorer for PlanCountScorer {
    fn score(&self, city: &City) -> f64 {
        (city.plan_count.max(0) as f64).ln_1p()
    }
}
