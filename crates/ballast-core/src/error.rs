//! Error type for zone actions and timed-action handlers.

use ballast_ledger::{LedgerError, PoolError, WalletError};
use ballast_players::{EnforcementError, GiftError};
use ballast_types::{ItemId, PlayerId, ShelfId, ShopId};
use ballast_world::{CraftError, ShopError, WorldError};

use crate::scheduler::SchedulerError;

/// Errors surfaced by [`Zone`](crate::zone::Zone) operations.
///
/// Every failing action leaves the ledger, pool and wallets exactly as they
/// were.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// Weight ledger rejected an event.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: LedgerError,
    },

    /// The feedstock pool could not cover a debit.
    #[error("pool error: {source}")]
    Pool {
        /// The underlying pool error.
        #[from]
        source: PoolError,
    },

    /// A personal wallet could not cover a charge.
    #[error("wallet error: {source}")]
    Wallet {
        /// The underlying wallet error.
        #[from]
        source: WalletError,
    },

    /// A fixture refused the request.
    #[error("fixture error: {source}")]
    World {
        /// The underlying fixture error.
        #[from]
        source: WorldError,
    },

    /// Crafting inputs were rejected.
    #[error("crafting error: {source}")]
    Craft {
        /// The underlying crafting error.
        #[from]
        source: CraftError,
    },

    /// A shop refused the trade.
    #[error("shop error: {source}")]
    Shop {
        /// The underlying shop error.
        #[from]
        source: ShopError,
    },

    /// A report was rejected.
    #[error("enforcement error: {source}")]
    Enforcement {
        /// The underlying enforcement error.
        #[from]
        source: EnforcementError,
    },

    /// A gift offer could not be made or resolved.
    #[error("gift error: {source}")]
    Gift {
        /// The underlying gift error.
        #[from]
        source: GiftError,
    },

    /// A timed action could not be scheduled.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },

    /// The zone is sinking; itemators and workbenches are shut down.
    #[error("item generation is disabled while the zone is sinking")]
    GenerationDisabled,

    /// The player does not carry the item.
    #[error("player {player} does not carry item {item}")]
    NotHeld {
        /// The player.
        player: PlayerId,
        /// The item.
        item: ItemId,
    },

    /// The item is promised to someone in a pending gift.
    #[error("item {item} is part of a pending gift")]
    GiftPending {
        /// The item.
        item: ItemId,
    },

    /// The item cannot be eaten.
    #[error("item {item} is not edible")]
    NotEdible {
        /// The item.
        item: ItemId,
    },

    /// No such display shelf.
    #[error("unknown shelf {shelf}")]
    UnknownShelf {
        /// The shelf.
        shelf: ShelfId,
    },

    /// No such shop.
    #[error("unknown shop {shop}")]
    UnknownShop {
        /// The shop.
        shop: ShopId,
    },
}
