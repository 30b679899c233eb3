//! Service configuration loaded via OrthoConfig.
//!
//! Every value can come from a `CITY_SERVICE_*` environment variable or the
//! matching CLI flag. Unset values fall back to the defaults exposed by the
//! accessors below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::backfill::{DEFAULT_INTER_RECORD_DELAY, DEFAULT_PAGE_SIZE};
use crate::domain::image_enrichment::{DEFAULT_LOCK_TTL, DEFAULT_PHOTO_MAX_WIDTH};
use crate::domain::trending::{DEFAULT_TRENDING_INTERVAL, DEFAULT_TRENDING_PAGE_SIZE};
use crate::domain::{BackfillConfig, ImageEnrichmentConfig, TrendingConfig};
use crate::outbound::google_maps::DEFAULT_GOOGLE_MAPS_BASE_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REDIS_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("{name} must be set")]
    Missing { name: &'static str },
}

/// Runtime configuration for the city service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CITY_SERVICE")]
pub struct CityServiceSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL for the city store.
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    /// Redis URL for idempotency locks.
    pub redis_url: Option<String>,
    pub redis_max_connections: Option<u32>,
    /// Google Maps API key.
    pub google_maps_api_key: Option<String>,
    pub google_maps_base_url: Option<String>,
    /// Remote city resolver. Unset means resolve in-process.
    pub city_resolver_url: Option<String>,
    /// Base URL of the venue-owning service.
    pub venues_service_url: Option<String>,
    /// Base URL of the event-owning service.
    pub events_service_url: Option<String>,
    /// Where `cityCreated` events are delivered. Unset drops them.
    pub event_sink_url: Option<String>,
    pub backfill_page_size: Option<usize>,
    pub backfill_delay_ms: Option<u64>,
    pub lock_ttl_secs: Option<u64>,
    pub photo_max_width: Option<u32>,
    pub trending_interval_secs: Option<u64>,
    pub trending_page_size: Option<usize>,
    /// Per-request timeout for outbound HTTP calls.
    pub http_timeout_secs: Option<u64>,
}

impl CityServiceSettings {
    /// Parsed bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when no database URL is configured.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        required(self.database_url.as_deref(), "CITY_SERVICE_DATABASE_URL")
    }

    pub fn database_max_connections(&self) -> u32 {
        self.database_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    pub fn redis_url(&self) -> &str {
        self.redis_url.as_deref().unwrap_or(DEFAULT_REDIS_URL)
    }

    pub fn redis_max_connections(&self) -> u32 {
        self.redis_max_connections
            .unwrap_or(DEFAULT_REDIS_MAX_CONNECTIONS)
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when no API key is configured.
    pub fn google_maps_api_key(&self) -> Result<&str, SettingsError> {
        required(
            self.google_maps_api_key.as_deref(),
            "CITY_SERVICE_GOOGLE_MAPS_API_KEY",
        )
    }

    pub fn google_maps_base_url(&self) -> &str {
        self.google_maps_base_url
            .as_deref()
            .unwrap_or(DEFAULT_GOOGLE_MAPS_BASE_URL)
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT)
    }

    pub fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            page_size: self.backfill_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            inter_record_delay: self
                .backfill_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_INTER_RECORD_DELAY),
        }
    }

    pub fn image_enrichment_config(&self) -> ImageEnrichmentConfig {
        ImageEnrichmentConfig {
            lock_ttl: self
                .lock_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LOCK_TTL),
            photo_max_width: self.photo_max_width.unwrap_or(DEFAULT_PHOTO_MAX_WIDTH),
        }
    }

    pub fn trending_config(&self) -> TrendingConfig {
        TrendingConfig {
            interval: self
                .trending_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TRENDING_INTERVAL),
            page_size: self
                .trending_page_size
                .unwrap_or(DEFAULT_TRENDING_PAGE_SIZE),
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, SettingsError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SettingsError::Missing { name }),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "CITY_SERVICE_BIND_ADDR",
        "CITY_SERVICE_DATABASE_URL",
        "CITY_SERVICE_REDIS_URL",
        "CITY_SERVICE_GOOGLE_MAPS_API_KEY",
        "CITY_SERVICE_BACKFILL_PAGE_SIZE",
        "CITY_SERVICE_BACKFILL_DELAY_MS",
        "CITY_SERVICE_LOCK_TTL_SECS",
        "CITY_SERVICE_TRENDING_INTERVAL_SECS",
    ];

    fn load_from_empty_args() -> CityServiceSettings {
        CityServiceSettings::load_from_iter([OsString::from("city-service")])
            .expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.redis_url(), DEFAULT_REDIS_URL);
        assert_eq!(settings.backfill_config(), BackfillConfig::default());
        assert_eq!(settings.image_enrichment_config(), ImageEnrichmentConfig::default());
        assert_eq!(settings.trending_config(), TrendingConfig::default());
        assert!(matches!(
            settings.database_url(),
            Err(SettingsError::Missing { name: "CITY_SERVICE_DATABASE_URL" })
        ));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.retain(|(name, _)| {
            !matches!(
                *name,
                "CITY_SERVICE_DATABASE_URL"
                    | "CITY_SERVICE_BACKFILL_PAGE_SIZE"
                    | "CITY_SERVICE_BACKFILL_DELAY_MS"
                    | "CITY_SERVICE_LOCK_TTL_SECS"
            )
        });
        vars.extend([
            ("CITY_SERVICE_DATABASE_URL", Some("postgres://db/cities".to_owned())),
            ("CITY_SERVICE_BACKFILL_PAGE_SIZE", Some("25".to_owned())),
            ("CITY_SERVICE_BACKFILL_DELAY_MS", Some("0".to_owned())),
            ("CITY_SERVICE_LOCK_TTL_SECS", Some("5".to_owned())),
        ]);
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url().expect("set"), "postgres://db/cities");
        assert_eq!(
            settings.backfill_config(),
            BackfillConfig {
                page_size: 25,
                inter_record_delay: Duration::ZERO,
            }
        );
        assert_eq!(settings.image_enrichment_config().lock_ttl, Duration::from_secs(5));
    }

    #[rstest]
    fn malformed_bind_addresses_are_reported() {
        let mut vars = cleared();
        vars.retain(|(name, _)| *name != "CITY_SERVICE_BIND_ADDR");
        vars.push(("CITY_SERVICE_BIND_ADDR", Some("localhost".to_owned())));
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::BindAddr { .. })
        ));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   "))]
    fn blank_required_values_are_missing(#[case] value: Option<&str>) {
        assert!(required(value, "X").is_err());
    }
}
