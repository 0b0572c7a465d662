//! Enumeration types shared by every crate in the zone engine.
//!
//! Item classification, danger levels, workshop stations, shop kinds and the
//! enforcement stages all live here so that snapshots and the observer can
//! serialize them without depending on the crates that act on them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Item classification
// ---------------------------------------------------------------------------

/// Base weight class of an item before flag modifiers are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WeightClass {
    /// A finished object. Weighs 1.0.
    Regular,
    /// A raw crafting material. Weighs 0.33.
    RawMaterial,
}

impl WeightClass {
    /// Base weight of this class.
    pub fn base_weight(self) -> Decimal {
        match self {
            Self::Regular => Decimal::ONE,
            Self::RawMaterial => Decimal::new(33, 2),
        }
    }
}

/// One of the orthogonal boolean flags carried by every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ItemFlag {
    /// Placed on a claimed display shelf. Halves effective weight.
    Displayed,
    /// A masterpiece. Halves effective weight.
    Masterpiece,
    /// Cursed. Afflicts whoever carries it.
    Cursed,
    /// Can be eaten (destroyed without payout).
    Edible,
}

/// What kind of object an item is.
///
/// Drives incinerator payouts, shop acceptance and pricing, and which
/// generator table produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ItemCategory {
    /// A small charm or trinket.
    Talisman,
    /// A piece of art. Tiered into masterpiece, normal and cursed.
    Artwork,
    /// Clothing.
    Garment,
    /// A science-fiction paperback.
    Book,
    /// A short poem on a scrap of paper.
    Poem,
    /// A wedge of cheese.
    Cheese,
    /// A scoop (or two) of ice cream.
    IceCream,
    /// A piece of candy.
    Candy,
    /// A raw workshop material.
    Material,
    /// Anything else.
    Misc,
}

impl ItemCategory {
    /// Whether this category is food sold at the food stall.
    pub const fn is_food(self) -> bool {
        matches!(self, Self::Cheese | Self::IceCream | Self::Candy)
    }

    /// Lowercase label used in messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Talisman => "talisman",
            Self::Artwork => "artwork",
            Self::Garment => "garment",
            Self::Book => "book",
            Self::Poem => "poem",
            Self::Cheese => "cheese",
            Self::IceCream => "ice cream",
            Self::Candy => "candy",
            Self::Material => "material",
            Self::Misc => "item",
        }
    }
}

// ---------------------------------------------------------------------------
// Workshops and shops
// ---------------------------------------------------------------------------

/// A workshop station in the industrial park.
///
/// Each station dispenses its own raw materials and owns an output table
/// used when its materials are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Station {
    /// Loom and thread.
    Textile,
    /// Glass furnace.
    Glazier,
    /// Candle works.
    Wax,
    /// Pottery wheel and kiln.
    Clay,
    /// Dairy.
    Milk,
    /// Confectionery.
    Candy,
}

impl Station {
    /// Every station, in display order.
    pub const ALL: [Self; 6] = [
        Self::Textile,
        Self::Glazier,
        Self::Wax,
        Self::Clay,
        Self::Milk,
        Self::Candy,
    ];

    /// Lowercase label used in messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Textile => "textile",
            Self::Glazier => "glazier",
            Self::Wax => "wax",
            Self::Clay => "clay",
            Self::Milk => "milk",
            Self::Candy => "candy",
        }
    }
}

/// The kind of shop behind a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ShopKind {
    /// Art and garments.
    Boutique,
    /// Cheese, ice cream and candy.
    Food,
    /// Trading post. Buys and sells anything.
    General,
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Four-stage capacity pressure indicator.
///
/// Ordered: `Safe < Warning < Critical < Sinking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DangerLevel {
    /// Below the warning threshold.
    Safe,
    /// At or above the warning threshold.
    Warning,
    /// At or above the critical threshold.
    Critical,
    /// At or above the item limit.
    Sinking,
}

impl DangerLevel {
    /// Uppercase label shown on counter signs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Sinking => "SINKING",
        }
    }

    /// Ambient presentation intensity for this level.
    pub const fn ambience(self) -> Ambience {
        match self {
            Self::Safe => Ambience::Pleasant,
            Self::Warning => Ambience::Uneasy,
            Self::Critical => Ambience::Ominous,
            Self::Sinking => Ambience::Dire,
        }
    }
}

/// Ambient presentation intensity, from pleasant to dire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Ambience {
    /// Gentle station noises.
    Pleasant,
    /// Groaning metal.
    Uneasy,
    /// Klaxons in the distance.
    Ominous,
    /// Water where it should not be.
    Dire,
}

// ---------------------------------------------------------------------------
// Enforcement
// ---------------------------------------------------------------------------

/// Coarse state of a player's hoarding enforcement record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EnforcementStage {
    /// No strikes.
    #[default]
    Clean,
    /// One or two strikes, fined.
    Minor,
    /// Escort sequence scheduled or running.
    Escalated,
}

/// One step of the escort sequence run after escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EscortPhase {
    /// Countdown step of the formal investigation.
    Investigation,
    /// The enforcer is dispatched.
    Announce,
    /// The enforcer arrives beside the offender.
    Move,
    /// Possessions are taken from the offender.
    Seize,
    /// The offender is walked to the disposal location.
    Escort,
    /// Possessions are destroyed, the debt applied and the offender
    /// respawned at the entry hub.
    Execute,
    /// The enforcer powers down and the record is released.
    Cleanup,
}

impl EscortPhase {
    /// Every phase, in sequence order.
    pub const ALL: [Self; 7] = [
        Self::Investigation,
        Self::Announce,
        Self::Move,
        Self::Seize,
        Self::Escort,
        Self::Execute,
        Self::Cleanup,
    ];

    /// The phase that follows this one, or `None` after cleanup.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Investigation => Some(Self::Announce),
            Self::Announce => Some(Self::Move),
            Self::Move => Some(Self::Seize),
            Self::Seize => Some(Self::Escort),
            Self::Escort => Some(Self::Execute),
            Self::Execute => Some(Self::Cleanup),
            Self::Cleanup => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn danger_levels_are_ordered() {
        assert!(DangerLevel::Safe < DangerLevel::Warning);
        assert!(DangerLevel::Warning < DangerLevel::Critical);
        assert!(DangerLevel::Critical < DangerLevel::Sinking);
    }

    #[test]
    fn raw_material_weighs_a_third() {
        assert_eq!(WeightClass::RawMaterial.base_weight(), Decimal::new(33, 2));
        assert_eq!(WeightClass::Regular.base_weight(), Decimal::ONE);
    }

    #[test]
    fn escort_phases_run_to_cleanup() {
        let mut phase = EscortPhase::Investigation;
        let mut steps = 0_u32;
        while let Some(next) = phase.next() {
            phase = next;
            steps = steps.saturating_add(1);
        }
        assert_eq!(phase, EscortPhase::Cleanup);
        assert_eq!(steps, 6);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ItemCategory::IceCream).ok();
        assert_eq!(json.as_deref(), Some("\"ice_cream\""));
    }
}
