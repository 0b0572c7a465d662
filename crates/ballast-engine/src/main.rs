//! Zone binary for Ballast.
//!
//! This is the main entry point that wires together the zone, its timed
//! actions, the snapshot store and the read-only observer. It loads
//! configuration, restores the last snapshot (or lays out a fresh zone),
//! and runs the timeline until the process is told to stop.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ballast-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the zone over a static topology
//! 4. Restore the snapshot, or install the fresh-zone layout
//! 5. Arm the monitor and restock timers
//! 6. Start the observer API server (unless disabled)
//! 7. Run the timeline until Ctrl-C
//! 8. Save the snapshot

mod error;
mod layout;

use std::path::Path;
use std::sync::Arc;

use ballast_core::config::{LogFormat, LoggingConfig, ZoneConfig};
use ballast_core::operator::{OperatorState, StopReason};
use ballast_core::persist::{JsonFileStore, SnapshotStore};
use ballast_core::runner;
use ballast_core::topology::StaticTopology;
use ballast_core::zone::Zone;
use ballast_events::EventBus;
use ballast_observer::state::AppState;
use ballast_world::CatalogGenerator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "ballast-config.yaml";

/// Application entry point for the zone.
///
/// # Errors
///
/// Returns an error if configuration, restore, startup or the final save
/// fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        item_limit = config.zone.item_limit,
        pool_start = config.pool.start,
        pool_cap = config.pool.cap,
        seed = ?config.zone.seed,
        "ballast-engine starting"
    );

    let observer_config = config.observer;
    let store = JsonFileStore::new(config.persistence.snapshot_path.clone());

    // 3. Build the zone.
    let topology = Arc::new(StaticTopology::new(&config.zone.disposal, &config.zone.hub));
    let zone = Arc::new(Zone::new(
        config,
        topology.clone(),
        Arc::new(CatalogGenerator::new()),
        Arc::new(EventBus::default()),
    ));

    // 4. Restore or lay out.
    if let Some(snapshot) = store.load()? {
        zone.restore(snapshot).await?;
    } else {
        let installed = layout::install(&zone, &topology).await;
        info!(
            shelves = installed.shelves,
            shops = installed.shops,
            "Fresh zone laid out"
        );
    }

    // 5. Arm recurring timers.
    zone.start().await?;

    // 6. Observer.
    let operator = Arc::new(OperatorState::new());
    let app_state = Arc::new(AppState::with_operator(
        Arc::clone(&zone),
        Arc::clone(&operator),
    ));
    let observer = if observer_config.enabled {
        Some(ballast_observer::startup::spawn_observer(
            observer_config.port,
            app_state,
            Arc::clone(&operator),
        )?)
    } else {
        info!("Observer disabled");
        None
    };

    // 7. Run until Ctrl-C.
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!(error = %e, "Signal handler failed, stopping"),
            }
            operator.request_stop(StopReason::Signal).await;
        });
    }

    let summary = runner::run_zone(Arc::clone(&zone), Arc::clone(&operator)).await;

    if let Some(observer) = observer {
        if let Err(e) = observer.await {
            warn!(error = %e, "Observer task did not shut down cleanly");
        }
    }

    // 8. Save.
    store.save(&zone.snapshot().await)?;

    info!(
        reason = ?summary.stop_reason,
        actions_fired = summary.actions_fired,
        actions_failed = summary.actions_failed,
        pending = summary.pending,
        "ballast-engine shutdown complete"
    );

    Ok(())
}

/// Load the zone configuration from [`CONFIG_PATH`].
///
/// Looks for the config file relative to the current working directory.
/// Without one the defaults are used, still subject to environment
/// overrides.
fn load_config() -> Result<ZoneConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(ZoneConfig::from_file(config_path)?)
    } else {
        let mut config = ZoneConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
