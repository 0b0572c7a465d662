//! Pending gift offers.
//!
//! A player offers one carried item to another. Each recipient can have
//! at most one pending offer, and an item can be on offer at most once.
//! The item stays in the giver's hands until the offer is accepted
//! (explicitly or by the auto-accept timer) or rejected.

use std::collections::BTreeMap;

use ballast_types::{GiftId, ItemId, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GiftError;

/// A gift waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftOffer {
    /// Offer identity, carried by the auto-accept timer.
    pub id: GiftId,
    /// The item on offer.
    pub item: ItemId,
    /// Who is giving.
    pub giver: PlayerId,
    /// Who is receiving.
    pub recipient: PlayerId,
    /// When the offer was made.
    pub offered_at: DateTime<Utc>,
}

/// Every pending gift in the zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftBook {
    offers: BTreeMap<GiftId, GiftOffer>,
}

impl GiftBook {
    /// An empty book.
    pub const fn new() -> Self {
        Self {
            offers: BTreeMap::new(),
        }
    }

    /// Rebuild from persisted offers.
    pub fn restore(offers: impl IntoIterator<Item = GiftOffer>) -> Self {
        Self {
            offers: offers.into_iter().map(|offer| (offer.id, offer)).collect(),
        }
    }

    /// Record a new offer.
    pub fn offer(
        &mut self,
        item: ItemId,
        giver: PlayerId,
        recipient: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<GiftOffer, GiftError> {
        if giver == recipient {
            return Err(GiftError::SelfGift { player: giver });
        }
        if self.is_pending(item) {
            return Err(GiftError::ItemPending { item });
        }
        if self.for_recipient(recipient).is_some() {
            return Err(GiftError::RecipientBusy { recipient });
        }
        let offer = GiftOffer {
            id: GiftId::new(),
            item,
            giver,
            recipient,
            offered_at: now,
        };
        self.offers.insert(offer.id, offer);
        Ok(offer)
    }

    /// Whether `item` is currently on offer.
    pub fn is_pending(&self, item: ItemId) -> bool {
        self.offers.values().any(|offer| offer.item == item)
    }

    /// The offer waiting for `recipient`, if any.
    pub fn for_recipient(&self, recipient: PlayerId) -> Option<&GiftOffer> {
        self.offers
            .values()
            .find(|offer| offer.recipient == recipient)
    }

    /// Look up an offer.
    pub fn get(&self, gift: GiftId) -> Option<&GiftOffer> {
        self.offers.get(&gift)
    }

    /// Remove and return an offer. Each offer can be resolved only once.
    pub fn take(&mut self, gift: GiftId) -> Result<GiftOffer, GiftError> {
        self.offers
            .remove(&gift)
            .ok_or(GiftError::NotPending { gift })
    }

    /// Remove and return the offer waiting for `recipient`.
    pub fn take_for(&mut self, recipient: PlayerId) -> Result<GiftOffer, GiftError> {
        let gift = self
            .for_recipient(recipient)
            .map(|offer| offer.id)
            .ok_or(GiftError::NothingPending { player: recipient })?;
        self.take(gift)
    }

    /// Drop every offer involving `item`, e.g. when it is destroyed.
    pub fn forget_item(&mut self, item: ItemId) -> Option<GiftOffer> {
        let gift = self
            .offers
            .values()
            .find(|offer| offer.item == item)
            .map(|offer| offer.id)?;
        self.offers.remove(&gift)
    }

    /// Every pending offer.
    pub fn iter(&self) -> impl Iterator<Item = &GiftOffer> {
        self.offers.values()
    }

    /// Number of pending offers.
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}
