//! Capability traits and the simple fixtures.
//!
//! Fixtures are composed from small capabilities instead of a type
//! hierarchy:
//!
//! | Fixture | Capabilities |
//! |---|---|
//! | [`Itemator`] | [`Generator`] + [`WeightContributor`] |
//! | [`MaterialDispenser`] | [`Generator`] + [`WeightContributor`] |
//! | [`Workbench`](crate::crafting::Workbench) | [`Combiner`] |
//! | [`DisplayShelf`](crate::shelf::DisplayShelf) | [`Display`] |
//! | [`Incinerator`] | [`Sink`] |
//! | [`Shop`](crate::shop::Shop) | [`Sink`] + [`Generator`] |

use ballast_types::{Item, ItemId, PlayerId, Station, WeightClass};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::crafting::CraftOutcome;
use crate::error::{CraftError, WorldError};
use crate::generator::{ItemGenerator, roll_itemator_category};
use crate::materials::{self, MaterialSpec};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// A fixture whose products occupy platform capacity.
pub trait WeightContributor {
    /// Base weight of each item the fixture produces.
    fn base_weight(&self) -> Decimal;
}

/// A fixture that brings new items into the zone.
pub trait Generator {
    /// Ash charged to the player per use.
    fn cost(&self) -> u64;

    /// Produce one untracked item.
    fn produce(&self, catalog: &dyn ItemGenerator, rng: &mut dyn RngCore) -> Item;
}

/// A fixture that turns two items into one.
pub trait Combiner {
    /// Validate the inputs and describe the result.
    fn combine(
        &self,
        first: &Item,
        second: &Item,
        catalog: &dyn ItemGenerator,
        rng: &mut dyn RngCore,
    ) -> Result<CraftOutcome, CraftError>;
}

/// A fixture that shows items on behalf of a claimant.
pub trait Display {
    /// Maximum number of items shown at once.
    fn capacity(&self) -> usize;

    /// Items currently shown.
    fn shown(&self) -> usize;

    /// Put an item on show.
    fn place(&mut self, player: PlayerId, item: ItemId) -> Result<(), WorldError>;

    /// Take an item off show.
    fn take(&mut self, player: PlayerId, item: ItemId) -> Result<(), WorldError>;
}

/// A fixture that takes items out of circulation.
pub trait Sink {
    /// Whether the fixture will take this item.
    fn accepts(&self, item: &Item) -> bool;
}

// ---------------------------------------------------------------------------
// Itemator
// ---------------------------------------------------------------------------

/// Coin-operated random item generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Itemator {
    cost: u64,
}

impl Itemator {
    /// An itemator charging `cost` ash per use.
    pub const fn new(cost: u64) -> Self {
        Self { cost }
    }
}

impl WeightContributor for Itemator {
    fn base_weight(&self) -> Decimal {
        WeightClass::Regular.base_weight()
    }
}

impl Generator for Itemator {
    fn cost(&self) -> u64 {
        self.cost
    }

    fn produce(&self, catalog: &dyn ItemGenerator, rng: &mut dyn RngCore) -> Item {
        let category = roll_itemator_category(rng);
        catalog.generate(category, rng).into_item()
    }
}

// ---------------------------------------------------------------------------
// Material dispenser
// ---------------------------------------------------------------------------

/// A station outlet dispensing one named raw material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialDispenser {
    station: Station,
    material: &'static MaterialSpec,
    cost: u64,
}

impl MaterialDispenser {
    /// A dispenser for `material` at `station`, charging `cost` ash.
    pub fn new(station: Station, material: &str, cost: u64) -> Result<Self, WorldError> {
        let material = materials::find(station, material)?;
        Ok(Self {
            station,
            material,
            cost,
        })
    }

    /// The station behind the dispenser.
    pub const fn station(&self) -> Station {
        self.station
    }

    /// The material dispensed.
    pub const fn material(&self) -> &'static MaterialSpec {
        self.material
    }
}

impl WeightContributor for MaterialDispenser {
    fn base_weight(&self) -> Decimal {
        WeightClass::RawMaterial.base_weight()
    }
}

impl Generator for MaterialDispenser {
    fn cost(&self) -> u64 {
        self.cost
    }

    fn produce(&self, _catalog: &dyn ItemGenerator, _rng: &mut dyn RngCore) -> Item {
        materials::raw_item(self.station, self.material)
    }
}

// ---------------------------------------------------------------------------
// Incinerator
// ---------------------------------------------------------------------------

/// Ash reclaimed per burned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRewards {
    /// Anything that is not artwork or cursed.
    #[serde(default = "default_normal_reward")]
    pub normal: u64,
    /// Artwork and masterpieces.
    #[serde(default = "default_artwork_reward")]
    pub artwork: u64,
    /// Cursed items, including cursed artwork.
    #[serde(default = "default_cursed_reward")]
    pub cursed: u64,
}

const fn default_normal_reward() -> u64 {
    1
}

const fn default_artwork_reward() -> u64 {
    3
}

const fn default_cursed_reward() -> u64 {
    2
}

impl Default for BurnRewards {
    fn default() -> Self {
        Self {
            normal: default_normal_reward(),
            artwork: default_artwork_reward(),
            cursed: default_cursed_reward(),
        }
    }
}

/// The recycling furnace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Incinerator {
    rewards: BurnRewards,
}

impl Incinerator {
    /// An incinerator paying the given rewards.
    pub const fn new(rewards: BurnRewards) -> Self {
        Self { rewards }
    }

    /// Ash reclaimed by burning `item`.
    pub const fn burn_reward(&self, item: &Item) -> u64 {
        if item.flags.cursed {
            self.rewards.cursed
        } else if item.flags.masterpiece
            || matches!(item.category, ballast_types::ItemCategory::Artwork)
        {
            self.rewards.artwork
        } else {
            self.rewards.normal
        }
    }
}

impl Sink for Incinerator {
    fn accepts(&self, _item: &Item) -> bool {
        true
    }
}
