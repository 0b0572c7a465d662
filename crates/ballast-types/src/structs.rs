//! Core records for the zone engine.
//!
//! Covers items and their flags, ownership, enforcement records, the typed
//! timed-action payload union, and the read-only status projections served
//! to counter signs and the `ash` query.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    Ambience, DangerLevel, EnforcementStage, EscortPhase, ItemCategory, ItemFlag, Station,
    WeightClass,
};
use crate::ids::{GiftId, ItemId, PlayerId, RoomId, ShelfId, ShopId};

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// The four orthogonal item flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemFlags {
    /// On a claimed display shelf.
    pub displayed: bool,
    /// A masterpiece.
    pub masterpiece: bool,
    /// Cursed.
    pub cursed: bool,
    /// Edible.
    pub edible: bool,
}

impl ItemFlags {
    /// Read a single flag.
    pub const fn get(self, flag: ItemFlag) -> bool {
        match flag {
            ItemFlag::Displayed => self.displayed,
            ItemFlag::Masterpiece => self.masterpiece,
            ItemFlag::Cursed => self.cursed,
            ItemFlag::Edible => self.edible,
        }
    }

    /// Write a single flag.
    pub const fn set(&mut self, flag: ItemFlag, value: bool) {
        match flag {
            ItemFlag::Displayed => self.displayed = value,
            ItemFlag::Masterpiece => self.masterpiece = value,
            ItemFlag::Cursed => self.cursed = value,
            ItemFlag::Edible => self.edible = value,
        }
    }
}

/// Station and material a raw material came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MaterialTag {
    /// The dispensing station.
    pub station: Station,
    /// Material name, e.g. `"silk"`.
    pub material: String,
}

/// A tracked object occupying platform capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Item {
    /// Unique identity.
    pub id: ItemId,
    /// Short display name.
    pub name: String,
    /// Longer description shown on inspection.
    pub description: String,
    /// What kind of object this is.
    pub category: ItemCategory,
    /// Base weight class.
    pub weight_class: WeightClass,
    /// Orthogonal flags.
    pub flags: ItemFlags,
    /// Present only for raw materials.
    pub material: Option<MaterialTag>,
    /// Crafting provenance line, if crafted.
    pub provenance: Option<String>,
}

impl Item {
    /// Effective weight after flag modifiers.
    ///
    /// Base weight, halved if displayed, halved again if a masterpiece.
    pub fn effective_weight(&self) -> Decimal {
        effective_weight(self.weight_class, self.flags)
    }

    /// Whether the item is a raw crafting material.
    pub const fn is_material(&self) -> bool {
        matches!(self.weight_class, WeightClass::RawMaterial)
    }
}

/// Effective weight of an item with the given class and flags.
pub fn effective_weight(class: WeightClass, flags: ItemFlags) -> Decimal {
    let half = Decimal::new(5, 1);
    let mut weight = class.base_weight();
    if flags.displayed {
        weight = weight.checked_mul(half).unwrap_or(weight);
    }
    if flags.masterpiece {
        weight = weight.checked_mul(half).unwrap_or(weight);
    }
    weight
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// Who or what currently holds a tracked item.
///
/// Items held by a shelf are attributed to whoever claims the shelf. Items
/// lying in a room, listed on a shop counter or held in enforcement custody
/// still count toward the global total but are attributed to no player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Owner {
    /// Carried by a player.
    Player(PlayerId),
    /// Placed on a display shelf.
    Shelf(ShelfId),
    /// Lying loose in a room.
    Room(RoomId),
    /// Listed on a shop counter.
    Shop(ShopId),
    /// Seized by the enforcement unit escorting a player, awaiting
    /// destruction.
    Custody(PlayerId),
}

impl core::fmt::Display for Owner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player:{id}"),
            Self::Shelf(id) => write!(f, "shelf:{id}"),
            Self::Room(id) => write!(f, "room:{id}"),
            Self::Shop(id) => write!(f, "shop:{id}"),
            Self::Custody(id) => write!(f, "custody:{id}"),
        }
    }
}

/// An item together with its current holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Holding {
    /// The item.
    pub item: Item,
    /// Its current holder.
    pub owner: Owner,
}

// ---------------------------------------------------------------------------
// Enforcement
// ---------------------------------------------------------------------------

/// A single hoarding fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FineEntry {
    /// Strike number that produced the fine.
    pub strike: u32,
    /// Ash amount.
    pub amount: u32,
    /// Whether the target's balance covered it. Unpaid fines become debt.
    pub paid: bool,
    /// When the fine was levied.
    pub levied_at: DateTime<Utc>,
}

/// Per-player hoarding enforcement record.
///
/// Created on the first report against a player and kept across sessions.
/// Strikes reset only through administrative action or a completed escort;
/// the fine history is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EnforcementRecord {
    /// The player this record belongs to.
    pub player: PlayerId,
    /// Coarse state.
    pub stage: EnforcementStage,
    /// Strikes since the last reset.
    pub strike_count: u32,
    /// Every fine ever levied, oldest first.
    pub fine_history: Vec<FineEntry>,
    /// Time of the most recent accepted report.
    pub last_report_time: Option<DateTime<Utc>>,
    /// Distinct reporters since the last reset.
    pub reporters: BTreeSet<PlayerId>,
    /// Fines the player could not pay.
    pub outstanding_debt: u32,
    /// Set on the second strike; cleared by reset.
    pub under_investigation: bool,
    /// Escort phase currently executing, if any.
    pub escort_phase: Option<EscortPhase>,
    /// Investigation countdown steps remaining.
    pub investigation_remaining: u32,
    /// Reports that arrived during an escort, replayed afterwards.
    pub deferred_reports: Vec<PlayerId>,
    /// Completed escorts over the record's lifetime.
    pub escorts_completed: u32,
}

impl EnforcementRecord {
    /// A fresh, clean record.
    pub const fn new(player: PlayerId) -> Self {
        Self {
            player,
            stage: EnforcementStage::Clean,
            strike_count: 0,
            fine_history: Vec::new(),
            last_report_time: None,
            reporters: BTreeSet::new(),
            outstanding_debt: 0,
            under_investigation: false,
            escort_phase: None,
            investigation_remaining: 0,
            deferred_reports: Vec::new(),
            escorts_completed: 0,
        }
    }

    /// Whether an escort sequence is scheduled or running.
    pub const fn is_in_flight(&self) -> bool {
        matches!(self.stage, EnforcementStage::Escalated)
    }
}

/// A player's public standing, as shown by `score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "offenses", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Standing {
    /// An escort sequence is running.
    UnderInvestigation,
    /// Strikes on record.
    Offenses(u32),
    /// No strikes, but holding enough to be reported.
    AtRisk,
    /// Nothing to worry about.
    Clean,
}

impl core::fmt::Display for Standing {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnderInvestigation => write!(f, "UNDER INVESTIGATION"),
            Self::Offenses(1) => write!(f, "1 offense"),
            Self::Offenses(n) => write!(f, "{n} offenses"),
            Self::AtRisk => write!(f, "At risk"),
            Self::Clean => write!(f, "Clean"),
        }
    }
}

// ---------------------------------------------------------------------------
// Timed actions
// ---------------------------------------------------------------------------

/// Typed payload of a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimedPayload {
    /// Auto-accept a pending gift.
    GiftOffer {
        /// The pending gift.
        gift: GiftId,
    },
    /// Expire a shop listing.
    ShopListing {
        /// The shop holding the listing.
        shop: ShopId,
        /// The listed item.
        item: ItemId,
    },
    /// Curse discomfort/drop tick for one player.
    CurseTick {
        /// The afflicted player.
        player: PlayerId,
    },
    /// Global capacity monitor tick.
    MonitorTick,
    /// Periodic shop restock.
    ShopRestock {
        /// The shop to restock.
        shop: ShopId,
    },
    /// One step of an escort sequence.
    EnforcementStep {
        /// The offender.
        target: PlayerId,
        /// The phase to execute.
        phase: EscortPhase,
    },
}

// ---------------------------------------------------------------------------
// Status projections
// ---------------------------------------------------------------------------

/// Read-only view of the feedstock pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PoolStatus {
    /// Current balance.
    pub balance: u64,
    /// Upper bound.
    pub cap: u64,
    /// Lower bound.
    pub floor: u64,
}

/// Read-only view of zone capacity, as shown on counter signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ZoneStatus {
    /// Weighted total of every tracked item.
    #[ts(as = "String")]
    pub global_total: Decimal,
    /// Configured item limit.
    pub item_limit: u64,
    /// Danger level as of the last monitor tick.
    pub danger_level: DangerLevel,
    /// Ambient presentation intensity.
    pub ambience: Ambience,
    /// Whether itemators and workbenches are running.
    pub generation_enabled: bool,
    /// Number of tracked items.
    pub tracked_items: u64,
    /// Feedstock pool view.
    pub pool: PoolStatus,
}

/// Answer to the `ash` and `score` queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AshStatement {
    /// The player queried.
    pub player: PlayerId,
    /// Personal balance (may be negative).
    pub wallet: i64,
    /// Feedstock pool view.
    pub pool: PoolStatus,
    /// Weighted total attributed to the player.
    #[ts(as = "String")]
    pub owner_total: Decimal,
    /// Strikes since the last reset.
    pub strike_count: u32,
    /// Unpaid fines.
    pub outstanding_debt: u32,
    /// Public standing.
    pub standing: Standing,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(class: WeightClass) -> Item {
        Item {
            id: ItemId::new(),
            name: String::from("vase"),
            description: String::from("A glass vase."),
            category: ItemCategory::Artwork,
            weight_class: class,
            flags: ItemFlags::default(),
            material: None,
            provenance: None,
        }
    }

    #[test]
    fn displayed_masterpiece_weighs_a_quarter() {
        let mut vase = item(WeightClass::Regular);
        vase.flags.displayed = true;
        vase.flags.masterpiece = true;
        assert_eq!(vase.effective_weight(), Decimal::new(25, 2));
    }

    #[test]
    fn flags_round_trip_through_accessors() {
        let mut flags = ItemFlags::default();
        flags.set(ItemFlag::Cursed, true);
        assert!(flags.get(ItemFlag::Cursed));
        flags.set(ItemFlag::Cursed, false);
        assert_eq!(flags, ItemFlags::default());
    }

    #[test]
    fn standing_labels() {
        assert_eq!(Standing::Offenses(1).to_string(), "1 offense");
        assert_eq!(Standing::Offenses(2).to_string(), "2 offenses");
        assert_eq!(Standing::UnderInvestigation.to_string(), "UNDER INVESTIGATION");
    }

    #[test]
    fn owner_serializes_tagged() {
        let shelf = ShelfId::new();
        let json = serde_json::to_value(Owner::Shelf(shelf)).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({ "kind": "shelf", "id": shelf.to_string() }))
        );
    }
}
