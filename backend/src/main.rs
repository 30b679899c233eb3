//! City service entry point: loads settings, migrates the schema, wires
//! adapters, and serves HTTP alongside the trending schedule.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use city_service::inbound::http::health::HealthState;
use city_service::inbound::scheduler::spawn_trending_schedule;
use city_service::outbound::persistence::run_pending_migrations;
use city_service::settings::CityServiceSettings;

use server::{build_http_state, create_server};

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let settings = CityServiceSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;

    let applied = run_pending_migrations(settings.database_url()?)
        .await
        .wrap_err("failed to migrate city store")?;
    info!(applied, "schema up to date");

    let http_state = build_http_state(&settings).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let schedule = spawn_trending_schedule(http_state.trending.clone(), shutdown_rx);

    let health_state = web::Data::new(HealthState::new());
    let bind_addr = settings.bind_addr()?;
    let server = create_server(health_state.clone(), web::Data::new(http_state), bind_addr)
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "city service listening");

    let served = server.await;
    health_state.mark_unhealthy();
    if shutdown_tx.send(true).is_err() {
        warn!("trending schedule already stopped");
    }
    if let Err(err) = schedule.await {
        warn!(error = %err, "trending schedule task failed");
    }
    served.wrap_err("http server failed")
}
