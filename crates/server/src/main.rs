//! Game server binary.
//!
//! Composition root that loads configuration, opens every map listed in the
//! layout catalog and runs their zones until Ctrl-C. Zone deltas are logged as
//! JSON where a network sink would forward them to clients.
//!
//! Environment variables (a `.env` file is honored):
//! - `MAP_LAYOUTS` - Path to a JSON list of `{ id, zone_count, max_players }`
//! - `RUST_LOG` - Log filter (default: info)
//! - see [`RuntimeConfig::from_env`] for zone tuning

mod layouts;

use anyhow::Result;
use runtime::{Event, EventBus, MapId, MapManager, RuntimeConfig, Topic};
use tokio::sync::broadcast::{self, error::RecvError};

use layouts::LayoutCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RuntimeConfig::from_env();
    tracing::info!(
        tick_ms = config.tick_interval.as_millis() as u64,
        zone_count_override = ?config.zone_count_override,
        stacking = ?config.stacking,
        "runtime configuration loaded"
    );

    let catalog = match std::env::var("MAP_LAYOUTS") {
        Ok(path) => LayoutCatalog::load(&path)?,
        Err(_) => {
            tracing::warn!("MAP_LAYOUTS not set, using the built-in layout");
            LayoutCatalog::fallback()
        }
    };

    let mut manager = MapManager::new(config);
    spawn_event_sinks(manager.events());

    for id in catalog.ids() {
        manager.open(MapId(id), &catalog)?;
    }
    tracing::info!(maps = manager.len(), "server ready, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    let released = manager.shutdown().await;
    tracing::info!(combatants = released.len(), "server stopped");
    Ok(())
}

fn spawn_event_sinks(bus: &EventBus) {
    for (topic, rx) in bus.subscribe_multiple(&[Topic::Combat, Topic::Options, Topic::Zone]) {
        tokio::spawn(forward_events(topic, rx));
    }
}

async fn forward_events(topic: Topic, mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(payload) => tracing::debug!(target: "server::events", %topic, %payload),
                Err(error) => tracing::warn!(%topic, %error, "failed to encode event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(%topic, skipped, "event sink lagging");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
