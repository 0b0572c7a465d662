//! Error types for the `ballast-players` crate.
//!
//! Reports and gift requests that cannot proceed return typed errors
//! rather than panicking. None of them change any state.

use ballast_types::{GiftId, ItemId, PlayerId};
use rust_decimal::Decimal;

/// Errors raised when a hoarding report is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnforcementError {
    /// Players cannot report themselves.
    #[error("player {player} cannot report themselves")]
    SelfReport {
        /// The reporter and target.
        player: PlayerId,
    },

    /// The target is under the minor threshold.
    #[error("player {target} holds {total}, below the hoarding threshold of {threshold}")]
    NotHoarding {
        /// The reported player.
        target: PlayerId,
        /// Their attributed weight.
        total: Decimal,
        /// The minor threshold.
        threshold: Decimal,
    },

    /// An escort sequence is already running for the target.
    #[error("an enforcement action against {target} is already in flight")]
    AlreadyInFlight {
        /// The reported player.
        target: PlayerId,
    },

    /// An escort step arrived for a record with no escort running.
    #[error("no enforcement action against {target} is in flight")]
    NotInFlight {
        /// The player named by the step.
        target: PlayerId,
    },
}

/// Errors raised by the gift book.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GiftError {
    /// Players cannot gift to themselves.
    #[error("player {player} cannot gift to themselves")]
    SelfGift {
        /// The giver and recipient.
        player: PlayerId,
    },

    /// The recipient already has an offer waiting.
    #[error("player {recipient} already has a pending gift")]
    RecipientBusy {
        /// The recipient.
        recipient: PlayerId,
    },

    /// The item is already on offer.
    #[error("item {item} is already on offer")]
    ItemPending {
        /// The item.
        item: ItemId,
    },

    /// No such pending gift.
    #[error("gift {gift} is not pending")]
    NotPending {
        /// The gift.
        gift: GiftId,
    },

    /// The player has no pending gift to answer.
    #[error("player {player} has no pending gift")]
    NothingPending {
        /// The player who tried to answer.
        player: PlayerId,
    },
}
