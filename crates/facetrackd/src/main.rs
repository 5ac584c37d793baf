use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;

use config::{BusKind, Config};
use dbus_interface::DashboardService;

const BUS_NAME: &str = "org.facetrack.Dashboard1";
const OBJECT_PATH: &str = "/org/facetrack/Dashboard1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("facetrackd starting");

    let config = Config::from_env().validated();
    tracing::info!(
        system = %config.system_name,
        promotion_ms = config.promotion_period.as_millis() as u64,
        feed_ms = config.feed_period.as_millis() as u64,
        seed_fixtures = config.seed_fixtures,
        autostart = config.autostart,
        "configuration loaded"
    );

    let engine = engine::spawn_engine(&config);

    let builder = match config.bus {
        BusKind::Session => zbus::connection::Builder::session()?,
        BusKind::System => zbus::connection::Builder::system()?,
    };
    let _conn = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, DashboardService::new(engine.clone()))?
        .build()
        .await?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "facetrackd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("facetrackd shutting down");
    engine.shutdown().await;

    Ok(())
}
