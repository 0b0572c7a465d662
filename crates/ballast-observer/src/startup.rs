//! Observer server startup helper for embedding in the engine.
//!
//! Provides [`spawn_observer`] which launches the observer on a background
//! Tokio task so it runs concurrently with the zone runner. The server
//! shuts down gracefully once the operator requests a stop.

use std::sync::Arc;

use ballast_core::operator::OperatorState;
use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the observer HTTP server on a background Tokio task.
///
/// Binds to `0.0.0.0:{port}`. The returned [`JoinHandle`] completes after
/// `operator` has been asked to stop and in-flight requests have drained.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the bind address is malformed. The
/// actual bind happens on the background task and is logged if it fails.
pub fn spawn_observer(
    port: u16,
    state: Arc<AppState>,
    operator: Arc<OperatorState>,
) -> Result<JoinHandle<()>, StartupError> {
    let config = ServerConfig {
        host: String::from("0.0.0.0"),
        port,
    };
    config.addr()?;

    let handle = tokio::spawn(async move {
        let shutdown = async move { operator.stopped().await };
        if let Err(e) = crate::server::start_server(&config, state, shutdown).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(port, "Observer server spawned on background task");

    Ok(handle)
}
