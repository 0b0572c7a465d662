//! The capacity monitor: turns the global weight total into a danger level.
//!
//! The monitor holds no per-player state. On every tick it recharges the
//! feedstock pool, classifies the current total against the item limit,
//! announces level changes, picks an ambient line for the current intensity
//! and decides whether item generation may run.

use rand::RngCore;
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use tracing::{debug, info};

use ballast_ledger::{CreditReceipt, FeedstockPool};
use ballast_types::{Ambience, DangerLevel};

use crate::config::DangerThresholds;

const WARNING_BROADCASTS: &[&str] = &[
    "Caution: The platform is carrying {count}/{limit} items. Consider visiting the KonMarie Temple.",
    "A structural groan echoes through the corridors. {count} items aboard -- the platform is getting heavy.",
];

const CRITICAL_BROADCASTS: &[&str] = &[
    "WARNING: {count}/{limit} items on the platform! Structural integrity is compromised. Incinerate excess items!",
    "The floor trembles beneath your feet. {count} items and counting -- Zone 25 cannot take much more.",
];

const SINKING_BROADCASTS: &[&str] = &[
    "EMERGENCY: Zone 25 is OVER CAPACITY ({count}/{limit})! The platform is taking on water! INCINERATE NOW!",
    "HULL BREACH IMMINENT. {count} items -- {over} OVER THE LIMIT. Get to the KonMarie Temple!",
];

const SAFE_BROADCASTS: &[&str] = &[
    "The platform settles. {count}/{limit} items aboard -- Zone 25 is riding level again.",
];

const PLEASANT_ECHOES: &[&str] = &[
    "Somewhere below, filtration pumps cycle ocean water through the reclamation system.",
    "A low hum resonates through the deck plates as the waste processors turn over.",
    "The feedstock gauges on a nearby panel tick up a fraction.",
    "You hear the distant gurgle of intake valves pulling in seawater for processing.",
    "A faint chemical smell wafts from the recycling vents -- the station digesting something.",
];

const UNEASY_ECHOES: &[&str] = &[
    "The deck plates creak underfoot.",
    "A faint metallic groan rises from somewhere below.",
    "The gulls have gone quiet.",
    "The horizon tilts slightly, then rights itself.",
];

const OMINOUS_ECHOES: &[&str] = &[
    "The platform shudders. Water sloshes somewhere below.",
    "A deep grinding vibration runs through the deck plates.",
    "The railing is wet, and the sea seems closer than it was.",
    "Rivets pop in the distance. The gulls are gone.",
];

const DIRE_ECHOES: &[&str] = &[
    "The deck lurches. Seawater spills over the outer railing.",
    "A klaxon wails. The platform lists to port.",
    "Water is rising through the deck grates. This is not a drill.",
    "The horizon is wrong. The ocean is climbing the hull.",
];

/// Classify a weighted total against the limit.
///
/// Thresholds are inclusive lower bounds in percent of `limit`.
pub fn danger_level(total: Decimal, limit: u64, thresholds: &DangerThresholds) -> DangerLevel {
    let at_least = |percent: u32| {
        Decimal::from(limit)
            .checked_mul(Decimal::from(percent))
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .is_some_and(|bound| total >= bound)
    };
    if at_least(thresholds.sinking) {
        DangerLevel::Sinking
    } else if at_least(thresholds.critical) {
        DangerLevel::Critical
    } else if at_least(thresholds.warning) {
        DangerLevel::Warning
    } else {
        DangerLevel::Safe
    }
}

/// Ambient lines for an intensity.
pub const fn echoes(ambience: Ambience) -> &'static [&'static str] {
    match ambience {
        Ambience::Pleasant => PLEASANT_ECHOES,
        Ambience::Uneasy => UNEASY_ECHOES,
        Ambience::Ominous => OMINOUS_ECHOES,
        Ambience::Dire => DIRE_ECHOES,
    }
}

const fn broadcasts(level: DangerLevel) -> &'static [&'static str] {
    match level {
        DangerLevel::Safe => SAFE_BROADCASTS,
        DangerLevel::Warning => WARNING_BROADCASTS,
        DangerLevel::Critical => CRITICAL_BROADCASTS,
        DangerLevel::Sinking => SINKING_BROADCASTS,
    }
}

/// Fill `{count}`, `{limit}` and `{over}` in a broadcast template.
pub fn render(template: &str, total: Decimal, limit: u64) -> String {
    let count = total.floor();
    let over = count
        .checked_sub(Decimal::from(limit))
        .filter(|over| *over > Decimal::ZERO)
        .unwrap_or(Decimal::ZERO);
    template
        .replace("{count}", &count.to_string())
        .replace("{limit}", &limit.to_string())
        .replace("{over}", &over.to_string())
}

/// What one monitor tick observed and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    /// Level after this tick.
    pub level: DangerLevel,
    /// Level before this tick.
    pub previous: DangerLevel,
    /// Whether the level changed.
    pub changed: bool,
    /// Passive recharge credited to the pool.
    pub recharge: CreditReceipt,
    /// Global weighted total read this tick.
    pub total: Decimal,
    /// World broadcast for a level change.
    pub broadcast: Option<String>,
    /// Ambient line for the current intensity.
    pub echo: Option<String>,
}

/// Periodic capacity watcher.
///
/// Starts at [`DangerLevel::Safe`] with generation enabled; the first tick
/// after boot compares against that.
#[derive(Debug, Clone)]
pub struct CapacityMonitor {
    limit: u64,
    thresholds: DangerThresholds,
    level: DangerLevel,
    generation_enabled: bool,
    ticks: u64,
}

impl CapacityMonitor {
    /// Create a monitor for the given limit and thresholds.
    pub const fn new(limit: u64, thresholds: DangerThresholds) -> Self {
        Self {
            limit,
            thresholds,
            level: DangerLevel::Safe,
            generation_enabled: true,
            ticks: 0,
        }
    }

    /// Level observed by the last tick.
    pub const fn level(&self) -> DangerLevel {
        self.level
    }

    /// Whether itemators and workbenches may run.
    pub const fn generation_enabled(&self) -> bool {
        self.generation_enabled
    }

    /// Configured item limit.
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Resume from a persisted level without announcing it. The generation
    /// gate follows the level.
    pub fn restore(&mut self, level: DangerLevel) {
        self.level = level;
        self.generation_enabled = level != DangerLevel::Sinking;
        debug!(?level, generation = self.generation_enabled, "Capacity monitor restored");
    }

    /// Ticks run since boot.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick against the pool and the current global total.
    pub fn tick(
        &mut self,
        pool: &mut FeedstockPool,
        total: Decimal,
        rng: &mut dyn RngCore,
    ) -> MonitorReport {
        let recharge = pool.passive_recharge();
        let previous = self.level;
        let level = danger_level(total, self.limit, &self.thresholds);
        let changed = level != previous;

        self.level = level;
        self.ticks = self.ticks.saturating_add(1);

        let gate = level != DangerLevel::Sinking;
        if gate != self.generation_enabled {
            info!(enabled = gate, ?level, "Item generation gate changed");
        }
        self.generation_enabled = gate;

        let broadcast = if changed {
            info!(from = ?previous, to = ?level, total = %total, limit = self.limit, "Danger level changed");
            broadcasts(level)
                .choose(rng)
                .map(|template| render(template, total, self.limit))
        } else {
            None
        };
        let echo = echoes(level.ambience())
            .choose(rng)
            .map(|line| (*line).to_owned());

        debug!(
            tick = self.ticks,
            total = %total,
            ?level,
            recharged = recharge.credited,
            pool = recharge.balance,
            "Capacity monitor tick"
        );

        MonitorReport {
            level,
            previous,
            changed,
            recharge,
            total,
            broadcast,
            echo,
        }
    }
}
