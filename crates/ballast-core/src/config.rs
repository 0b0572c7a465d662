//! Configuration loading and typed config structures for the zone engine.
//!
//! The canonical configuration lives in `ballast-config.yaml` at the project
//! root. Every section and every field is optional: missing values fall back
//! to the defaults below, which are the tunables the zone was balanced
//! around.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use ballast_players::{CurseRules, EnforcementRules, Places};
use ballast_world::{BurnRewards, DEFAULT_SHELF_CAPACITY, PricingRules};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level zone configuration.
///
/// Mirrors the structure of `ballast-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneConfig {
    /// Capacity limit, danger thresholds and place names.
    #[serde(default)]
    pub zone: ZoneSection,

    /// Feedstock pool bounds.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Hoarding enforcement rules.
    #[serde(default)]
    pub enforcement: EnforcementRules,

    /// Timed-action periods.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Fixture costs, rewards and shop behaviour.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Curse tunables.
    #[serde(default)]
    pub curse: CurseRules,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Read-only observer API.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Snapshot location.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl ZoneConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `BALLAST_OBSERVER_PORT` overrides `observer.port`
    /// - `BALLAST_SNAPSHOT_PATH` overrides `persistence.snapshot_path`
    /// - `BALLAST_SEED` overrides `zone.seed`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse_raw(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`validate`](Self::validate) fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config = Self::parse_raw(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_raw(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override selected values with environment variables when set.
    ///
    /// Unparseable numeric overrides are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BALLAST_OBSERVER_PORT") {
            match val.parse() {
                Ok(port) => self.observer.port = port,
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid BALLAST_OBSERVER_PORT"),
            }
        }
        if let Ok(val) = std::env::var("BALLAST_SNAPSHOT_PATH") {
            self.persistence.snapshot_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("BALLAST_SEED") {
            match val.parse() {
                Ok(seed) => self.zone.seed = Some(seed),
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid BALLAST_SEED"),
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.zone.thresholds;
        if t.warning >= t.critical || t.critical >= t.sinking {
            return Err(ConfigError::Invalid {
                field: "zone.thresholds",
                reason: format!(
                    "thresholds must strictly increase, got {}/{}/{}",
                    t.warning, t.critical, t.sinking
                ),
            });
        }
        if self.zone.item_limit == 0 {
            return Err(invalid("zone.item_limit", "must be positive"));
        }
        if self.pool.cap < self.pool.start {
            return Err(ConfigError::Invalid {
                field: "pool.cap",
                reason: format!("cap {} is below start {}", self.pool.cap, self.pool.start),
            });
        }
        if self.enforcement.minor_threshold > self.enforcement.major_threshold {
            return Err(invalid(
                "enforcement.minor_threshold",
                "must not exceed major_threshold",
            ));
        }
        let periods = [
            ("timers.gift_window_secs", self.timers.gift_window_secs),
            ("timers.listing_ttl_secs", self.timers.listing_ttl_secs),
            ("timers.curse_tick_secs", self.timers.curse_tick_secs),
            ("timers.monitor_tick_secs", self.timers.monitor_tick_secs),
            ("timers.investigation_step_secs", self.timers.investigation_step_secs),
            ("timers.escort_phase_secs", self.timers.escort_phase_secs),
            ("timers.restock_secs", self.timers.restock_secs),
        ];
        if let Some((field, _)) = periods.into_iter().find(|(_, secs)| *secs == 0) {
            return Err(invalid(field, "period must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

/// Zone-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneSection {
    /// Item count at which the platform is full.
    #[serde(default = "default_item_limit")]
    pub item_limit: u64,

    /// Danger thresholds as percentages of the limit.
    #[serde(default)]
    pub thresholds: DangerThresholds,

    /// Where offenders are escorted.
    #[serde(default = "default_disposal")]
    pub disposal: String,

    /// Where players respawn.
    #[serde(default = "default_hub")]
    pub hub: String,

    /// Random seed. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ZoneSection {
    /// Place names for narration.
    pub fn places(&self) -> Places<'_> {
        Places {
            disposal: &self.disposal,
            hub: &self.hub,
        }
    }
}

impl Default for ZoneSection {
    fn default() -> Self {
        Self {
            item_limit: default_item_limit(),
            thresholds: DangerThresholds::default(),
            disposal: default_disposal(),
            hub: default_hub(),
            seed: None,
        }
    }
}

/// Inclusive lower bounds of each danger level, in percent of the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DangerThresholds {
    /// Warning threshold.
    #[serde(default = "default_warning")]
    pub warning: u32,

    /// Critical threshold.
    #[serde(default = "default_critical")]
    pub critical: u32,

    /// Sinking threshold.
    #[serde(default = "default_sinking")]
    pub sinking: u32,
}

impl Default for DangerThresholds {
    fn default() -> Self {
        Self {
            warning: default_warning(),
            critical: default_critical(),
            sinking: default_sinking(),
        }
    }
}

/// Feedstock pool bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Balance on first boot.
    #[serde(default = "default_pool_start")]
    pub start: u64,

    /// Upper bound.
    #[serde(default = "default_pool_cap")]
    pub cap: u64,

    /// Ash recovered per monitor tick.
    #[serde(default = "default_pool_recharge")]
    pub recharge: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            start: default_pool_start(),
            cap: default_pool_cap(),
            recharge: default_pool_recharge(),
        }
    }
}

/// Timed-action periods, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Gift auto-accept window.
    #[serde(default = "default_gift_window_secs")]
    pub gift_window_secs: u64,

    /// Shop listing lifetime.
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,

    /// Curse tick period.
    #[serde(default = "default_curse_tick_secs")]
    pub curse_tick_secs: u64,

    /// Capacity monitor period.
    #[serde(default = "default_monitor_tick_secs")]
    pub monitor_tick_secs: u64,

    /// Delay between investigation countdown steps.
    #[serde(default = "default_investigation_step_secs")]
    pub investigation_step_secs: u64,

    /// Delay between escort phases.
    #[serde(default = "default_escort_phase_secs")]
    pub escort_phase_secs: u64,

    /// Shop restock period.
    #[serde(default = "default_restock_secs")]
    pub restock_secs: u64,
}

impl TimerConfig {
    /// Gift auto-accept window.
    pub const fn gift_window(&self) -> Duration {
        Duration::from_secs(self.gift_window_secs)
    }

    /// Shop listing lifetime.
    pub const fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    /// Curse tick period.
    pub const fn curse_tick(&self) -> Duration {
        Duration::from_secs(self.curse_tick_secs)
    }

    /// Capacity monitor period.
    pub const fn monitor_tick(&self) -> Duration {
        Duration::from_secs(self.monitor_tick_secs)
    }

    /// Delay between investigation steps.
    pub const fn investigation_step(&self) -> Duration {
        Duration::from_secs(self.investigation_step_secs)
    }

    /// Delay between escort phases.
    pub const fn escort_phase(&self) -> Duration {
        Duration::from_secs(self.escort_phase_secs)
    }

    /// Shop restock period.
    pub const fn restock(&self) -> Duration {
        Duration::from_secs(self.restock_secs)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            gift_window_secs: default_gift_window_secs(),
            listing_ttl_secs: default_listing_ttl_secs(),
            curse_tick_secs: default_curse_tick_secs(),
            monitor_tick_secs: default_monitor_tick_secs(),
            investigation_step_secs: default_investigation_step_secs(),
            escort_phase_secs: default_escort_phase_secs(),
            restock_secs: default_restock_secs(),
        }
    }
}

/// Fixture costs, burn rewards, pricing and shop stocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Ash per itemator use.
    #[serde(default = "default_fixture_cost")]
    pub itemator_cost: u64,

    /// Ash per raw material.
    #[serde(default = "default_fixture_cost")]
    pub dispenser_cost: u64,

    /// Incinerator payouts.
    #[serde(default)]
    pub burn: BurnRewards,

    /// Shop prices.
    #[serde(default)]
    pub pricing: PricingRules,

    /// Items added per restock.
    #[serde(default = "default_restock_count")]
    pub restock_count: usize,

    /// Listings per shop counter.
    #[serde(default = "default_max_listings")]
    pub max_listings: usize,

    /// Items per display shelf.
    #[serde(default = "default_shelf_capacity")]
    pub shelf_capacity: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            itemator_cost: default_fixture_cost(),
            dispenser_cost: default_fixture_cost(),
            burn: BurnRewards::default(),
            pricing: PricingRules::default(),
            restock_count: default_restock_count(),
            max_listings: default_max_listings(),
            shelf_capacity: default_shelf_capacity(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable, for terminals.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Observer API configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the API at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listen port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_observer_port(),
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Where the JSON snapshot is written on shutdown.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_item_limit() -> u64 {
    1000
}

fn default_disposal() -> String {
    "KonMarie Temple".to_owned()
}

fn default_hub() -> String {
    "Welcome area".to_owned()
}

const fn default_warning() -> u32 {
    75
}

const fn default_critical() -> u32 {
    90
}

const fn default_sinking() -> u32 {
    100
}

const fn default_pool_start() -> u64 {
    500
}

const fn default_pool_cap() -> u64 {
    2000
}

const fn default_pool_recharge() -> u64 {
    5
}

const fn default_gift_window_secs() -> u64 {
    60
}

const fn default_listing_ttl_secs() -> u64 {
    3600
}

const fn default_curse_tick_secs() -> u64 {
    300
}

const fn default_monitor_tick_secs() -> u64 {
    180
}

const fn default_investigation_step_secs() -> u64 {
    60
}

const fn default_escort_phase_secs() -> u64 {
    10
}

const fn default_restock_secs() -> u64 {
    600
}

const fn default_fixture_cost() -> u64 {
    1
}

const fn default_restock_count() -> usize {
    3
}

const fn default_max_listings() -> usize {
    8
}

const fn default_shelf_capacity() -> usize {
    DEFAULT_SHELF_CAPACITY
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("ballast-snapshot.json")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn defaults_match_the_balanced_tunables() {
        let config = ZoneConfig::default();
        assert_eq!(config.zone.item_limit, 1000);
        assert_eq!(config.zone.thresholds.warning, 75);
        assert_eq!(config.pool.start, 500);
        assert_eq!(config.pool.cap, 2000);
        assert_eq!(config.timers.monitor_tick_secs, 180);
        assert_eq!(config.enforcement.escort_debt, 50);
        assert_eq!(config.economy.max_listings, 8);
        assert_eq!(config.zone.disposal, "KonMarie Temple");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r#"
zone:
  item_limit: 200
  seed: 9
  thresholds:
    warning: 50
pool:
  recharge: 0
enforcement:
  minor_threshold: 4
  fine_schedule: [1, 2, 3]
timers:
  gift_window_secs: 5
logging:
  level: "debug"
  format: json
observer:
  port: 9090
"#;
        let config = ZoneConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.zone.item_limit, 200);
        assert_eq!(config.zone.seed, Some(9));
        assert_eq!(config.zone.thresholds.warning, 50);
        assert_eq!(config.zone.thresholds.critical, 90);
        assert_eq!(config.pool.recharge, 0);
        assert_eq!(config.pool.cap, 2000);
        assert_eq!(config.enforcement.minor_threshold, Decimal::from(4));
        assert_eq!(config.enforcement.fine_schedule, vec![1, 2, 3]);
        assert_eq!(config.timers.gift_window_secs, 5);
        assert_eq!(config.timers.curse_tick_secs, 300);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.observer.port, 9090);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ZoneConfig::parse("");
        assert!(config.is_ok());
        assert_eq!(config.ok(), Some(ZoneConfig::default()));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let yaml = "zone:\n  thresholds:\n    warning: 95\n";
        let result = ZoneConfig::parse(yaml);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "zone.thresholds",
                ..
            })
        ));
    }

    #[test]
    fn rejects_cap_below_start() {
        let yaml = "pool:\n  start: 3000\n";
        assert!(matches!(
            ZoneConfig::parse(yaml),
            Err(ConfigError::Invalid {
                field: "pool.cap",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_periods() {
        let yaml = "timers:\n  curse_tick_secs: 0\n";
        assert!(matches!(
            ZoneConfig::parse(yaml),
            Err(ConfigError::Invalid {
                field: "timers.curse_tick_secs",
                ..
            })
        ));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            ZoneConfig::parse("zone: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("ballast-config.yaml");
        if path.exists() {
            let config = ZoneConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
