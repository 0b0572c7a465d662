//! Error types for the zone binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, the run and the final save.

/// Top-level error for the zone binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ballast_core::config::ConfigError,
    },

    /// Loading or saving the snapshot failed.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying snapshot error.
        #[from]
        source: ballast_core::persist::SnapshotError,
    },

    /// The zone refused to start.
    #[error("zone error: {source}")]
    Zone {
        /// The underlying zone error.
        #[from]
        source: ballast_core::error::ZoneError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: ballast_observer::startup::StartupError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
