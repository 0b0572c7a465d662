//! Shop counters.
//!
//! A counter holds listings: items the shop owns and offers for sale.
//! Restocks draw from the shop kind's weighted table and never push the
//! counter past its listing limit. Player sales are listed too, even on a
//! full counter. Every listing has an expiry timer owned by the caller.

use std::collections::BTreeMap;

use ballast_types::{Item, ItemCategory, ItemId, RoomId, ShopId, ShopKind};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ShopError;
use crate::fixtures::{Generator, Sink};
use crate::generator::ItemGenerator;
use crate::pricing::PriceCategory;
use crate::table::WeightedTable;

const BOUTIQUE_STOCK: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Artwork, 50),
    (ItemCategory::Garment, 40),
    (ItemCategory::Talisman, 10),
]);

const FOOD_STOCK: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Cheese, 30),
    (ItemCategory::IceCream, 30),
    (ItemCategory::Candy, 30),
    (ItemCategory::Talisman, 10),
]);

const GENERAL_STOCK: WeightedTable<ItemCategory> = WeightedTable::new(&[
    (ItemCategory::Talisman, 30),
    (ItemCategory::Garment, 25),
    (ItemCategory::Book, 20),
    (ItemCategory::Poem, 15),
    (ItemCategory::Artwork, 10),
]);

/// Weighted restock table for a kind of shop.
pub const fn stock_table(kind: ShopKind) -> WeightedTable<ItemCategory> {
    match kind {
        ShopKind::Boutique => BOUTIQUE_STOCK,
        ShopKind::Food => FOOD_STOCK,
        ShopKind::General => GENERAL_STOCK,
    }
}

/// Whether a kind of shop buys items of a pricing category.
pub const fn buys(kind: ShopKind, category: PriceCategory) -> bool {
    match kind {
        ShopKind::Boutique => matches!(
            category,
            PriceCategory::Artwork | PriceCategory::Garment | PriceCategory::Base
        ),
        ShopKind::Food => matches!(category, PriceCategory::Food | PriceCategory::Base),
        ShopKind::General => !matches!(category, PriceCategory::Food),
    }
}

/// Sign name for a kind of shop.
pub const fn default_name(kind: ShopKind) -> &'static str {
    match kind {
        ShopKind::Boutique => "the Gallery Boutique",
        ShopKind::Food => "the Specialty Food Market",
        ShopKind::General => "the General Store",
    }
}

/// A shop counter and its listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    /// Shop identity.
    pub id: ShopId,
    /// What the shop trades in.
    pub kind: ShopKind,
    /// Room the counter stands in.
    pub room: RoomId,
    /// Name on the sign.
    pub name: String,
    listings: BTreeMap<ItemId, DateTime<Utc>>,
    max_listings: usize,
}

impl Shop {
    /// An empty counter.
    pub fn new(id: ShopId, kind: ShopKind, room: RoomId, max_listings: usize) -> Self {
        Self {
            id,
            kind,
            room,
            name: String::from(default_name(kind)),
            listings: BTreeMap::new(),
            max_listings,
        }
    }

    /// Listed items and when each was listed.
    pub fn listings(&self) -> impl Iterator<Item = (ItemId, DateTime<Utc>)> + '_ {
        self.listings.iter().map(|(&item, &at)| (item, at))
    }

    /// Number of live listings.
    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    /// Whether `item` is for sale here.
    pub fn is_listed(&self, item: ItemId) -> bool {
        self.listings.contains_key(&item)
    }

    /// How many items a restock of up to `batch` may add.
    pub fn restock_room(&self, batch: usize) -> usize {
        batch.min(self.max_listings.saturating_sub(self.listings.len()))
    }

    /// Put an item on the counter.
    pub fn list(&mut self, item: ItemId, at: DateTime<Utc>) -> Result<(), ShopError> {
        if self.listings.contains_key(&item) {
            return Err(ShopError::AlreadyListed {
                shop: self.id,
                item,
            });
        }
        self.listings.insert(item, at);
        Ok(())
    }

    /// Take an item off the counter (bought or expired).
    pub fn delist(&mut self, item: ItemId) -> Result<DateTime<Utc>, ShopError> {
        self.listings
            .remove(&item)
            .ok_or(ShopError::NotListed {
                shop: self.id,
                item,
            })
    }

    /// Refuse items this shop does not trade in.
    pub fn check_accepts(&self, item: &Item) -> Result<(), ShopError> {
        if self.accepts(item) {
            Ok(())
        } else {
            Err(ShopError::NotAccepted {
                shop: self.id,
                category: item.category,
            })
        }
    }
}

impl Sink for Shop {
    fn accepts(&self, item: &Item) -> bool {
        buys(self.kind, PriceCategory::of(item))
    }
}

impl Generator for Shop {
    fn cost(&self) -> u64 {
        0
    }

    fn produce(&self, catalog: &dyn ItemGenerator, rng: &mut dyn RngCore) -> Item {
        let category = stock_table(self.kind)
            .roll(rng)
            .unwrap_or(ItemCategory::Talisman);
        catalog.generate(category, rng).into_item()
    }
}
