//! Shared application state for the observer API.
//!
//! The observer holds the live [`Zone`] and reads it through its query
//! methods; it never mutates anything. Event streams come straight from
//! the zone's event bus.

use std::sync::Arc;

use ballast_core::operator::OperatorState;
use ballast_core::zone::Zone;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The zone being observed.
    pub zone: Arc<Zone>,
    /// Runner control state (present when the runner is running).
    pub operator_state: Option<Arc<OperatorState>>,
}

impl AppState {
    /// Observe `zone` without runner status.
    pub const fn new(zone: Arc<Zone>) -> Self {
        Self {
            zone,
            operator_state: None,
        }
    }

    /// Observe `zone` and report on the runner behind `operator`.
    pub const fn with_operator(zone: Arc<Zone>, operator: Arc<OperatorState>) -> Self {
        Self {
            zone,
            operator_state: Some(operator),
        }
    }
}
