//! Capacity and currency bookkeeping for the Ballast zone engine.
//!
//! Two aggregates live here, each the single authority for its numbers:
//!
//! - [`weight`] -- The [`WeightLedger`]: every tracked item, its holder, and
//!   incrementally maintained global, per-holder and per-player totals.
//! - [`pool`] -- The [`FeedstockPool`]: the bounded communal ash reserve.
//!
//! Plus two supporting modules:
//!
//! - [`wallet`] -- Personal, signed ash balances ([`Wallets`]).
//! - [`audit`] -- Full recomputation of ledger totals.
//!
//! # Invariants
//!
//! ```text
//! global_total == sum(effective_weight(item) for every tracked item)
//! 0 <= pool.balance <= pool.cap
//! ```
//!
//! Neither structure panics; every failure is a typed error and leaves the
//! state untouched.
//!
//! # Usage
//!
//! ```
//! use ballast_ledger::{FeedstockPool, WeightEvent, WeightLedger};
//! use ballast_types::{Item, ItemCategory, ItemFlags, ItemId, Owner, PlayerId, WeightClass};
//! use rust_decimal::Decimal;
//!
//! let mut ledger = WeightLedger::new();
//! let player = PlayerId::new();
//! let item = Item {
//!     id: ItemId::new(),
//!     name: String::from("glass bead"),
//!     description: String::from("A bead of blue glass."),
//!     category: ItemCategory::Material,
//!     weight_class: WeightClass::RawMaterial,
//!     flags: ItemFlags::default(),
//!     material: None,
//!     provenance: None,
//! };
//! ledger
//!     .apply(WeightEvent::Create { item: Box::new(item), owner: Owner::Player(player) })
//!     .ok();
//! assert_eq!(ledger.owner_total(player), Decimal::new(33, 2));
//!
//! let mut pool = FeedstockPool::new(1995, 2000, 5);
//! pool.credit(15);
//! assert_eq!(pool.balance(), 2000);
//! ```

pub mod audit;
pub mod pool;
pub mod wallet;
pub mod weight;

// Re-export primary types at crate root.
pub use audit::AuditResult;
pub use pool::{CreditReceipt, FeedstockPool, POOL_FLOOR};
pub use wallet::Wallets;
pub use weight::{WeightChange, WeightEvent, WeightLedger};

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use ballast_types::{ItemId, Owner, PlayerId, ShelfId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when applying weight events.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The event references an item with no tracking record.
    #[error("item {item} is not tracked")]
    NotTracked {
        /// The unknown item.
        item: ItemId,
    },

    /// A create event reused the id of a tracked item.
    #[error("item {item} is already tracked")]
    AlreadyTracked {
        /// The duplicate item.
        item: ItemId,
    },

    /// A transfer named the wrong current holder.
    #[error("item {item} is held by {actual}, not {expected}")]
    OwnerMismatch {
        /// The item being moved.
        item: ItemId,
        /// Holder named by the event.
        expected: Owner,
        /// Actual holder.
        actual: Owner,
    },

    /// The event would leave a total below zero.
    #[error("{scope} weight total would become negative ({total})")]
    NegativeTotal {
        /// Which total.
        scope: String,
        /// The rejected value.
        total: Decimal,
    },

    /// The shelf is claimed by another player.
    #[error("shelf {shelf} is already claimed by {claimant}")]
    ShelfClaimed {
        /// The shelf.
        shelf: ShelfId,
        /// Current claimant.
        claimant: PlayerId,
    },

    /// The shelf has no claimant.
    #[error("shelf {shelf} is not claimed")]
    ShelfNotClaimed {
        /// The shelf.
        shelf: ShelfId,
    },

    /// Decimal arithmetic overflowed.
    #[error("weight arithmetic overflow: {context}")]
    Overflow {
        /// What was being computed.
        context: &'static str,
    },
}

/// Errors from the feedstock pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool cannot cover a debit.
    #[error("insufficient funds in feedstock pool: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Ash requested.
        requested: u64,
        /// Ash available.
        available: u64,
    },
}

/// Errors from personal wallets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The player cannot cover a withdrawal.
    #[error("player {player} has {available} ash, needs {requested}")]
    InsufficientFunds {
        /// The player.
        player: PlayerId,
        /// Ash requested.
        requested: u64,
        /// Current balance.
        available: i64,
    },

    /// The balance would overflow.
    #[error("wallet arithmetic overflow for player {player}")]
    Overflow {
        /// The player.
        player: PlayerId,
    },
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// Drift between incrementally maintained totals and a full recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightAnomaly {
    /// Per-total drift: (`expected`, `actual`) keyed by scope.
    pub drifted: BTreeMap<String, (Decimal, Decimal)>,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for WeightAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
