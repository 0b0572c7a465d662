//! Scarcity pricing for shop counters.
//!
//! Every item falls into one pricing category. Its buy price is the
//! category's base price scaled by scarcity: `baseline / (count + 1)`,
//! clamped to `[0.25, 3.0]`, where `count` is how many items of that
//! category the zone currently tracks. All arithmetic is integer; the
//! result is floored and never below 1 ash.

use ballast_types::{Item, ItemCategory};
use serde::{Deserialize, Serialize};

/// Pricing bucket for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    /// Any cursed item.
    Cursed,
    /// Artwork and masterpieces.
    Artwork,
    /// Clothing.
    Garment,
    /// Anything edible.
    Food,
    /// Books and poems.
    Book,
    /// Everything else.
    Base,
}

impl PriceCategory {
    /// Classify an item. The cursed flag takes precedence.
    pub const fn of(item: &Item) -> Self {
        if item.flags.cursed {
            return Self::Cursed;
        }
        if item.flags.masterpiece {
            return Self::Artwork;
        }
        match item.category {
            ItemCategory::Artwork => Self::Artwork,
            ItemCategory::Garment => Self::Garment,
            ItemCategory::Book | ItemCategory::Poem => Self::Book,
            ItemCategory::Cheese | ItemCategory::IceCream | ItemCategory::Candy => Self::Food,
            ItemCategory::Talisman | ItemCategory::Material | ItemCategory::Misc => {
                if item.flags.edible {
                    Self::Food
                } else {
                    Self::Base
                }
            }
        }
    }

    /// Count at which the scarcity multiplier is roughly 1.
    pub const fn baseline(self) -> u64 {
        match self {
            Self::Cursed => 5,
            Self::Artwork => 10,
            Self::Garment => 20,
            Self::Food | Self::Book => 15,
            Self::Base => 30,
        }
    }
}

/// Shop price settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Base price of anything without a more specific price.
    #[serde(default = "default_base_price")]
    pub base_price: u64,
    /// Base price of garments.
    #[serde(default = "default_garment_price")]
    pub garment_price: u64,
    /// Base price of artwork and masterpieces.
    #[serde(default = "default_artwork_price")]
    pub artwork_price: u64,
    /// Base price of food.
    #[serde(default = "default_food_price")]
    pub food_price: u64,
    /// Base price of books and poems.
    #[serde(default = "default_book_price")]
    pub book_price: u64,
    /// Base price to buy a cursed item.
    #[serde(default = "default_cursed_buy_price")]
    pub cursed_buy_price: u64,
    /// Base price paid for a cursed item. The station pays a premium to
    /// get curses out of circulation.
    #[serde(default = "default_cursed_sell_price")]
    pub cursed_sell_price: u64,
    /// Share of the buy price paid when selling, in percent.
    #[serde(default = "default_sell_fraction_percent")]
    pub sell_fraction_percent: u64,
    /// Lower clamp of the scarcity multiplier, in percent.
    #[serde(default = "default_scarcity_min_percent")]
    pub scarcity_min_percent: u64,
    /// Upper clamp of the scarcity multiplier, in percent.
    #[serde(default = "default_scarcity_max_percent")]
    pub scarcity_max_percent: u64,
}

const fn default_base_price() -> u64 {
    5
}
const fn default_garment_price() -> u64 {
    12
}
const fn default_artwork_price() -> u64 {
    50
}
const fn default_food_price() -> u64 {
    4
}
const fn default_book_price() -> u64 {
    4
}
const fn default_cursed_buy_price() -> u64 {
    2
}
const fn default_cursed_sell_price() -> u64 {
    4
}
const fn default_sell_fraction_percent() -> u64 {
    40
}
const fn default_scarcity_min_percent() -> u64 {
    25
}
const fn default_scarcity_max_percent() -> u64 {
    300
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            base_price: default_base_price(),
            garment_price: default_garment_price(),
            artwork_price: default_artwork_price(),
            food_price: default_food_price(),
            book_price: default_book_price(),
            cursed_buy_price: default_cursed_buy_price(),
            cursed_sell_price: default_cursed_sell_price(),
            sell_fraction_percent: default_sell_fraction_percent(),
            scarcity_min_percent: default_scarcity_min_percent(),
            scarcity_max_percent: default_scarcity_max_percent(),
        }
    }
}

impl PricingRules {
    /// Pre-scarcity buy price for a category.
    pub const fn base_buy(&self, category: PriceCategory) -> u64 {
        match category {
            PriceCategory::Cursed => self.cursed_buy_price,
            PriceCategory::Artwork => self.artwork_price,
            PriceCategory::Garment => self.garment_price,
            PriceCategory::Food => self.food_price,
            PriceCategory::Book => self.book_price,
            PriceCategory::Base => self.base_price,
        }
    }

    /// Apply the scarcity multiplier for `count` tracked items of
    /// `category` to `base`.
    pub fn scale(&self, base: u64, category: PriceCategory, count: u64) -> u64 {
        let baseline = category.baseline();
        let denominator = count.saturating_add(1);
        let ratio_percent = baseline.saturating_mul(100);
        let scaled = if ratio_percent >= self.scarcity_max_percent.saturating_mul(denominator) {
            percent_of(base, self.scarcity_max_percent)
        } else if ratio_percent <= self.scarcity_min_percent.saturating_mul(denominator) {
            percent_of(base, self.scarcity_min_percent)
        } else {
            base.saturating_mul(baseline)
                .checked_div(denominator)
                .unwrap_or(0)
        };
        scaled.max(1)
    }

    /// What a player pays for `item`.
    pub fn buy_price(&self, item: &Item, count: u64) -> u64 {
        let category = PriceCategory::of(item);
        self.scale(self.base_buy(category), category, count)
    }

    /// What the station pays a player for `item`.
    pub fn sell_price(&self, item: &Item, count: u64) -> u64 {
        let category = PriceCategory::of(item);
        if category == PriceCategory::Cursed {
            return self.scale(self.cursed_sell_price, category, count);
        }
        let buy = self.buy_price(item, count);
        percent_of(buy, self.sell_fraction_percent).max(1)
    }
}

/// `value * percent / 100`, floored.
const fn percent_of(value: u64, percent: u64) -> u64 {
    match value.saturating_mul(percent).checked_div(100) {
        Some(result) => result,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use ballast_types::{ItemFlags, ItemId, WeightClass};

    use super::*;

    fn item(category: ItemCategory, flags: ItemFlags) -> Item {
        Item {
            id: ItemId::new(),
            name: String::from("thing"),
            description: String::new(),
            category,
            weight_class: WeightClass::Regular,
            flags,
            material: None,
            provenance: None,
        }
    }

    #[test]
    fn classification() {
        let cursed_art = item(
            ItemCategory::Artwork,
            ItemFlags {
                cursed: true,
                ..ItemFlags::default()
            },
        );
        assert_eq!(PriceCategory::of(&cursed_art), PriceCategory::Cursed);
        assert_eq!(
            PriceCategory::of(&item(ItemCategory::Poem, ItemFlags::default())),
            PriceCategory::Book
        );
        assert_eq!(
            PriceCategory::of(&item(ItemCategory::Candy, ItemFlags::default())),
            PriceCategory::Food
        );
        assert_eq!(
            PriceCategory::of(&item(ItemCategory::Talisman, ItemFlags::default())),
            PriceCategory::Base
        );
    }

    #[test]
    fn scarcity_clamps_both_ways() {
        let rules = PricingRules::default();
        // No artwork at all: 10 / 1 = 10x, clamped to 3x.
        assert_eq!(rules.scale(50, PriceCategory::Artwork, 0), 150);
        // Flooded: 10 / 100, clamped to 0.25x.
        assert_eq!(rules.scale(50, PriceCategory::Artwork, 99), 12);
        // 10 / 7 = 1.43x, floored.
        assert_eq!(rules.scale(50, PriceCategory::Artwork, 6), 71);
        // Never below one ash.
        assert_eq!(rules.scale(2, PriceCategory::Cursed, 1_000), 1);
    }

    #[test]
    fn sell_price_is_forty_percent_of_buy() {
        let rules = PricingRules::default();
        let scarf = item(ItemCategory::Garment, ItemFlags::default());
        // 20 / 20 = 1x at count 19.
        assert_eq!(rules.buy_price(&scarf, 19), 12);
        assert_eq!(rules.sell_price(&scarf, 19), 4);
    }

    #[test]
    fn cursed_items_sell_at_a_premium() {
        let rules = PricingRules::default();
        let idol = item(
            ItemCategory::Talisman,
            ItemFlags {
                cursed: true,
                ..ItemFlags::default()
            },
        );
        // 5 / 5 = 1x at count 4.
        assert_eq!(rules.buy_price(&idol, 4), 2);
        assert_eq!(rules.sell_price(&idol, 4), 4);
    }
}
