//! Runner status for operators.
//!
//! Read-only: the observer reports on the runner but cannot pause or stop
//! it. Control stays with the engine process (signals).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Runner state and pending timeline |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::error::ObserverError;
use crate::state::AppState;

/// JSON body of `GET /api/operator/status`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunnerStatus {
    /// Whether timed actions are paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Timed actions handled since start.
    pub actions_fired: u64,
    /// Timed actions still pending.
    pub actions_pending: usize,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// ISO 8601 timestamp of when the runner started.
    pub started_at: String,
}

/// Return the runner status.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = state
        .operator_state
        .as_ref()
        .ok_or_else(|| ObserverError::Internal("operator state not available".to_owned()))?;

    Ok(Json(RunnerStatus {
        paused: operator.is_paused(),
        stop_requested: operator.is_stop_requested(),
        actions_fired: operator.actions_fired(),
        actions_pending: state.zone.pending_actions().await,
        elapsed_seconds: operator.elapsed_seconds(),
        started_at: operator.started_at().to_rfc3339(),
    }))
}
