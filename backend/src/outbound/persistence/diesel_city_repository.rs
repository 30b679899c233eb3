//! PostgreSQL-backed `CityRepository` implementation using Diesel ORM.
//!
//! The `cities_name_country_code_key` unique constraint is the only guard
//! against two processes creating the same city. Its violation is mapped to
//! [`CityRepositoryError::DuplicateKey`] so the resolver can re-read the
//! winning row.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{CityRepository, CityRepositoryError, NewCity};
use crate::domain::{City, CityId, CityKey};

use super::models::{CityRow, NewCityRow};
use super::pool::{DbPool, PoolError};
use super::schema::cities;

/// Diesel-backed implementation of the `CityRepository` port.
#[derive(Clone)]
pub struct DieselCityRepository {
    pool: DbPool,
}

impl DieselCityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CityRepositoryError {
    CityRepositoryError::connection(error.to_string())
}

fn map_diesel_error(error: diesel::result::Error) -> CityRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => CityRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => CityRepositoryError::query("database query error"),
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => CityRepositoryError::duplicate_key(
                info.constraint_name()
                    .unwrap_or("cities_name_country_code_key"),
            ),
            DatabaseErrorKind::ClosedConnection => {
                CityRepositoryError::connection("database connection error")
            }
            _ => CityRepositoryError::query("database error"),
        },
        _ => CityRepositoryError::query("database error"),
    }
}

fn to_i64(value: usize, field: &str) -> Result<i64, CityRepositoryError> {
    i64::try_from(value).map_err(|_| CityRepositoryError::query(format!("{field} out of range")))
}

fn expect_one_row(updated: usize, id: &CityId) -> Result<(), CityRepositoryError> {
    if updated == 0 {
        return Err(CityRepositoryError::query(format!("city {id} not found")));
    }
    Ok(())
}

#[async_trait]
impl CityRepository for DieselCityRepository {
    async fn find_by_key(&self, key: &CityKey) -> Result<Option<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        cities::table
            .filter(
                cities::name
                    .eq(key.name())
                    .and(cities::country_code.eq(key.country_code())),
            )
            .select(CityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(City::from))
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &CityId) -> Result<Option<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        cities::table
            .find(id.as_uuid())
            .select(CityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|row| row.map(City::from))
            .map_err(map_diesel_error)
    }

    async fn insert(&self, city: &NewCity) -> Result<City, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewCityRow {
            name: city.key.name(),
            country_code: city.key.country_code(),
            longitude: city.location.map(|p| p.longitude),
            latitude: city.location.map(|p| p.latitude),
        };

        diesel::insert_into(cities::table)
            .values(&row)
            .returning(CityRow::as_returning())
            .get_result(&mut conn)
            .await
            .map(City::from)
            .map_err(map_diesel_error)
    }

    async fn list_page(&self, limit: usize, offset: usize) -> Result<Vec<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CityRow> = cities::table
            .order(cities::id.asc())
            .limit(to_i64(limit, "limit")?)
            .offset(to_i64(offset, "offset")?)
            .select(CityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(City::from).collect())
    }

    async fn set_image_url(&self, id: &CityId, image_url: &str) -> Result<(), CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(cities::table.find(id.as_uuid()))
            .set((
                cities::image_url.eq(Some(image_url)),
                cities::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        expect_one_row(updated, id)
    }

    async fn set_trending_score(&self, id: &CityId, score: f64) -> Result<(), CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(cities::table.find(id.as_uuid()))
            .set((
                cities::trending_score.eq(score),
                cities::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        expect_one_row(updated, id)
    }

    async fn adjust_plan_count(
        &self,
        id: &CityId,
        delta: i64,
    ) -> Result<Option<City>, CityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let clamped = sql::<BigInt>("GREATEST(plan_count + ")
            .bind::<BigInt, _>(delta)
            .sql(", 0)");
        diesel::update(cities::table.find(id.as_uuid()))
            .set((
                cities::plan_count.eq(clamped),
                cities::updated_at.eq(Utc::now()),
            ))
            .returning(CityRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map(|row| row.map(City::from))
            .map_err(map_diesel_error)
    }
}
