//! Internal Diesel row structs for the `cities` table.
//!
//! These types never leave the persistence layer.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{City, CityId, GeoPoint};

use super::schema::cities;

/// Row struct for reading from the cities table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CityRow {
    pub id: Uuid,
    pub name: String,
    pub country_code: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub image_url: Option<String>,
    pub plan_count: i64,
    pub trending_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating city rows. The id is database-assigned.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cities)]
pub(crate) struct NewCityRow<'a> {
    pub name: &'a str,
    pub country_code: &'a str,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        let location = match (row.longitude, row.latitude) {
            (Some(longitude), Some(latitude)) => Some(GeoPoint {
                longitude,
                latitude,
            }),
            _ => None,
        };
        Self {
            id: CityId::from_uuid(row.id),
            name: row.name,
            country_code: row.country_code,
            location,
            image_url: row.image_url,
            plan_count: row.plan_count,
            trending_score: row.trending_score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
