//! Error types for the `ballast-world` crate.
//!
//! Fixture operations return [`WorldError`], the workbench returns
//! [`CraftError`] and shop counters return [`ShopError`]. None of them are
//! fatal: the zone rejects the action and leaves every total untouched.

use ballast_types::{ItemCategory, ItemId, PlayerId, ShelfId, ShopId, Station};

/// Errors raised by dispensers, shelves and other fixtures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The station does not stock the requested material.
    #[error("the {station:?} station has no material called '{material}'")]
    UnknownMaterial {
        /// The station asked.
        station: Station,
        /// The requested material name.
        material: String,
    },

    /// The shelf already holds as many items as it can.
    #[error("shelf {shelf} is full ({capacity} items)")]
    ShelfFull {
        /// The full shelf.
        shelf: ShelfId,
        /// Its capacity.
        capacity: usize,
    },

    /// Someone else has claimed the shelf.
    #[error("shelf {shelf} is already claimed by {claimant}")]
    ShelfClaimed {
        /// The contested shelf.
        shelf: ShelfId,
        /// The current claimant.
        claimant: PlayerId,
    },

    /// The player does not hold the claim on this shelf.
    #[error("player {player} has not claimed shelf {shelf}")]
    NotClaimant {
        /// The shelf.
        shelf: ShelfId,
        /// The player who tried to use it.
        player: PlayerId,
    },

    /// The item is not sitting on the shelf.
    #[error("item {item} is not on shelf {shelf}")]
    NotOnShelf {
        /// The shelf.
        shelf: ShelfId,
        /// The missing item.
        item: ItemId,
    },

    /// The item is already on the shelf.
    #[error("item {item} is already on shelf {shelf}")]
    AlreadyOnShelf {
        /// The shelf.
        shelf: ShelfId,
        /// The duplicate item.
        item: ItemId,
    },
}

/// Why two items cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    /// The item is not a raw material.
    NotAMaterial,
    /// Both inputs are the same item.
    SameItem,
    /// The crafter is not carrying the item.
    NotHeld,
}

impl core::fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotAMaterial => write!(f, "not a raw material"),
            Self::SameItem => write!(f, "cannot be combined with itself"),
            Self::NotHeld => write!(f, "not carried by the crafter"),
        }
    }
}

/// Errors raised by the workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CraftError {
    /// One of the inputs cannot take part in a combination.
    #[error("incompatible materials: {item} is {reason}")]
    IncompatibleMaterials {
        /// The offending input.
        item: ItemId,
        /// What is wrong with it.
        reason: Incompatibility,
    },
}

/// Errors raised by shop counters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShopError {
    /// The shop does not trade in this kind of item.
    #[error("shop {shop} does not buy {category:?}")]
    NotAccepted {
        /// The shop.
        shop: ShopId,
        /// The refused category.
        category: ItemCategory,
    },

    /// The item is not for sale here.
    #[error("item {item} is not listed at shop {shop}")]
    NotListed {
        /// The shop.
        shop: ShopId,
        /// The requested item.
        item: ItemId,
    },

    /// The counter is already carrying the item.
    #[error("item {item} is already listed at shop {shop}")]
    AlreadyListed {
        /// The shop.
        shop: ShopId,
        /// The duplicate listing.
        item: ItemId,
    },
}
