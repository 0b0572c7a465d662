//! Fixtures, materials, item generation and crafting for the Ballast zone.
//!
//! Everything in this crate is ledger-agnostic: fixtures describe items
//! and validate requests, and the zone turns their answers into weight
//! events.
//!
//! # Modules
//!
//! - [`error`] -- [`WorldError`], [`CraftError`] and [`ShopError`].
//! - [`fixtures`] -- Capability traits plus the itemator, material
//!   dispenser and incinerator.
//! - [`generator`] -- [`ItemGenerator`] and the word-list backed
//!   [`CatalogGenerator`].
//! - [`crafting`] -- Station output tables and the [`Workbench`].
//! - [`materials`] -- Raw materials and flavor words per station.
//! - [`pricing`] -- Scarcity pricing rules.
//! - [`shelf`] -- Claimable [`DisplayShelf`].
//! - [`shop`] -- [`Shop`] counters, accepted categories and restock tables.
//! - [`table`] -- Static weighted tables.

pub mod crafting;
pub mod error;
pub mod fixtures;
pub mod generator;
pub mod materials;
pub mod pricing;
pub mod shelf;
pub mod shop;
pub mod table;
mod words;

pub use crafting::{CraftOutcome, Workbench};
pub use error::{CraftError, Incompatibility, ShopError, WorldError};
pub use fixtures::{
    BurnRewards, Combiner, Display, Generator, Incinerator, Itemator, MaterialDispenser, Sink,
    WeightContributor,
};
pub use generator::{ArtTier, CatalogGenerator, ItemDraft, ItemGenerator};
pub use materials::MaterialSpec;
pub use pricing::{PriceCategory, PricingRules};
pub use shelf::{DEFAULT_SHELF_CAPACITY, DisplayShelf};
pub use shop::Shop;
pub use table::WeightedTable;
