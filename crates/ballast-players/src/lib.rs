//! Player-facing rules for the Ballast zone: hoarding enforcement, gift
//! offers and curse afflictions.
//!
//! The functions here are pure over their records. The zone aggregate in
//! `ballast-core` owns the locks and performs the ledger, pool and wallet
//! side effects each outcome asks for.
//!
//! # Modules
//!
//! - [`enforcement`] -- Report evaluation, fines, the escort sequence,
//!   reporter rewards and standing.
//! - [`gift`] -- [`GiftBook`]: one pending offer per recipient.
//! - [`curse`] -- Discomfort messages and fumbled items.
//! - [`error`] -- [`EnforcementError`] and [`GiftError`].

pub mod curse;
pub mod enforcement;
pub mod error;
pub mod gift;

pub use curse::{CurseRules, CurseTick};
pub use enforcement::{
    Cue, EnforcementRules, EscalationCause, EscortStep, Places, Settlement, Verdict,
};
pub use error::{EnforcementError, GiftError};
pub use gift::{GiftBook, GiftOffer};
