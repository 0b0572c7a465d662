//! Shop counters: browsing, buying, selling, restocks and listing expiry.
//!
//! Prices follow scarcity: the more items of a pricing category the zone
//! tracks, the cheaper that category gets. Buying charges the wallet and
//! credits the pool; selling is paid out of the pool and refused when the
//! pool cannot cover it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ballast_ledger::{WeightEvent, WeightLedger};
use ballast_types::{ItemCategory, ItemId, Owner, PlayerId, ShopId, TimedPayload};
use ballast_world::{Generator, PriceCategory, ShopError};

use crate::error::ZoneError;
use crate::zone::{Zone, carried, not_pending, refund};

/// One item on a shop counter, as shown by `browse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// The listed item.
    pub item: ItemId,
    /// Item name.
    pub name: String,
    /// Item category.
    pub category: ItemCategory,
    /// Current buy price.
    pub price: u64,
    /// When it was put on the counter.
    pub listed_at: DateTime<Utc>,
}

/// Tracked items sharing a pricing category, for the scarcity multiplier.
fn scarcity_count(ledger: &WeightLedger, category: PriceCategory) -> u64 {
    let count = ledger
        .holdings()
        .filter(|holding| PriceCategory::of(&holding.item) == category)
        .count();
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn buy_price(zone: &Zone, ledger: &WeightLedger, item: ItemId) -> Option<u64> {
    let found = ledger.item(item)?;
    let count = scarcity_count(ledger, PriceCategory::of(found));
    Some(zone.config.economy.pricing.buy_price(found, count))
}

impl Zone {
    /// Everything for sale at a shop, at current prices.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::UnknownShop`] for an unknown shop.
    pub async fn browse(&self, shop_id: ShopId) -> Result<Vec<Listing>, ZoneError> {
        let ledger = self.ledger.lock().await;
        let shops = self.shops.lock().await;
        let shop = shops
            .get(&shop_id)
            .ok_or(ZoneError::UnknownShop { shop: shop_id })?;
        let listings = shop
            .listings()
            .filter_map(|(item, listed_at)| {
                let found = ledger.item(item)?;
                Some(Listing {
                    item,
                    name: found.name.clone(),
                    category: found.category,
                    price: buy_price(self, &ledger, item)?,
                    listed_at,
                })
            })
            .collect();
        Ok(listings)
    }

    /// Buy a listed item. Returns the price paid.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::UnknownShop`] for an unknown shop.
    /// - [`ZoneError::Shop`] if the item is not listed there.
    /// - [`ZoneError::Wallet`] if the player cannot pay.
    pub async fn buy(
        &self,
        player: PlayerId,
        shop_id: ShopId,
        item: ItemId,
    ) -> Result<u64, ZoneError> {
        let (name, price, fanout) = {
            let mut ledger = self.ledger.lock().await;
            let mut pool = self.pool.lock().await;
            let mut wallets = self.wallets.lock().await;
            let mut shops = self.shops.lock().await;
            let shop = shops
                .get_mut(&shop_id)
                .ok_or(ZoneError::UnknownShop { shop: shop_id })?;
            let not_listed = ShopError::NotListed {
                shop: shop_id,
                item,
            };
            if !shop.is_listed(item) || ledger.owner_of(item) != Some(Owner::Shop(shop_id)) {
                return Err(not_listed.into());
            }
            let price = buy_price(self, &ledger, item).ok_or(not_listed)?;
            let name = ledger
                .item(item)
                .map(|found| found.name.clone())
                .unwrap_or_default();

            wallets.withdraw(player, price)?;
            let change = match ledger.apply(WeightEvent::Transfer {
                item,
                from: Owner::Shop(shop_id),
                to: Owner::Player(player),
            }) {
                Ok(change) => change,
                Err(error) => {
                    refund(&mut wallets, player, price);
                    return Err(error.into());
                }
            };
            pool.credit(price);
            if let Err(error) = shop.delist(item) {
                warn!(shop = %shop_id, item = %item, %error, "Sold item was not listed");
            }
            (name, price, self.fanout(&ledger, vec![change]))
        };
        self.cancel_timer(TimedPayload::ShopListing {
            shop: shop_id,
            item,
        })
        .await;
        info!(player = %player, shop = %shop_id, item = %item, price, "Item bought");
        self.notify(fanout).await;
        self.say(player, format!("You buy {name} for {price} ash."));
        Ok(price)
    }

    /// Sell a carried item to a shop. Returns the price received.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GiftPending`] if the item is on offer.
    /// - [`ZoneError::NotHeld`] if the player does not carry it.
    /// - [`ZoneError::Shop`] if the shop does not trade in it.
    /// - [`ZoneError::Pool`] if the pool cannot pay.
    pub async fn sell(
        &self,
        player: PlayerId,
        shop_id: ShopId,
        item: ItemId,
    ) -> Result<u64, ZoneError> {
        let (name, price, fanout) = {
            let gifts = self.gifts.lock().await;
            not_pending(&gifts, item)?;
            let mut ledger = self.ledger.lock().await;
            let mut pool = self.pool.lock().await;
            let mut wallets = self.wallets.lock().await;
            let mut shops = self.shops.lock().await;
            let shop = shops
                .get_mut(&shop_id)
                .ok_or(ZoneError::UnknownShop { shop: shop_id })?;

            let found = carried(&ledger, player, item)?;
            shop.check_accepts(found)?;
            let count = scarcity_count(&ledger, PriceCategory::of(found));
            let price = self.config.economy.pricing.sell_price(found, count);
            let name = found.name.clone();

            pool.debit(price)?;
            if let Err(error) = wallets.deposit(player, price) {
                pool.credit(price);
                return Err(error.into());
            }
            let change = match ledger.apply(WeightEvent::Transfer {
                item,
                from: Owner::Player(player),
                to: Owner::Shop(shop_id),
            }) {
                Ok(change) => change,
                Err(error) => {
                    if let Err(reverse) = wallets.withdraw(player, price) {
                        warn!(player = %player, %reverse, "Sale payout could not be reversed");
                    }
                    pool.credit(price);
                    return Err(error.into());
                }
            };
            if let Err(error) = shop.list(item, Utc::now()) {
                warn!(shop = %shop_id, item = %item, %error, "Sold item already listed");
            }
            (name, price, self.fanout(&ledger, vec![change]))
        };
        self.scheduler.lock().await.schedule_once(
            self.config.timers.listing_ttl(),
            TimedPayload::ShopListing {
                shop: shop_id,
                item,
            },
        );
        info!(player = %player, shop = %shop_id, item = %item, price, "Item sold");
        self.notify(fanout).await;
        self.say(player, format!("You sell {name} for {price} ash."));
        Ok(price)
    }

    /// Add fresh stock to a shop, up to its listing limit. Skipped while
    /// generation is disabled. Returns the number of items added.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::UnknownShop`] for an unknown shop.
    /// - [`ZoneError::Ledger`] if the new items could not be tracked.
    pub async fn restock(&self, shop_id: ShopId) -> Result<usize, ZoneError> {
        if !self.monitor.lock().await.generation_enabled() {
            debug!(shop = %shop_id, "Restock skipped while sinking");
            return Ok(0);
        }
        let template = self
            .shops
            .lock()
            .await
            .get(&shop_id)
            .cloned()
            .ok_or(ZoneError::UnknownShop { shop: shop_id })?;
        let planned = template.restock_room(self.config.economy.restock_count);
        if planned == 0 {
            return Ok(0);
        }
        let stock: Vec<_> = {
            let mut rng = self.rng().await;
            (0..planned)
                .map(|_| template.produce(self.catalog.as_ref(), &mut *rng))
                .collect()
        };

        let (added, fanout) = {
            let mut ledger = self.ledger.lock().await;
            let mut shops = self.shops.lock().await;
            let shop = shops
                .get_mut(&shop_id)
                .ok_or(ZoneError::UnknownShop { shop: shop_id })?;
            let room = shop.restock_room(planned);
            let stock: Vec<_> = stock.into_iter().take(room).collect();
            let ids: Vec<ItemId> = stock.iter().map(|item| item.id).collect();
            let changes = ledger.apply_all(
                stock
                    .into_iter()
                    .map(|item| WeightEvent::Create {
                        item: Box::new(item),
                        owner: Owner::Shop(shop_id),
                    })
                    .collect(),
            )?;
            let now = Utc::now();
            for id in &ids {
                if let Err(error) = shop.list(*id, now) {
                    warn!(shop = %shop_id, %error, "Restocked item already listed");
                }
            }
            (ids, self.fanout(&ledger, changes))
        };

        {
            let ttl = self.config.timers.listing_ttl();
            let mut scheduler = self.scheduler.lock().await;
            for item in &added {
                scheduler.schedule_once(
                    ttl,
                    TimedPayload::ShopListing {
                        shop: shop_id,
                        item: *item,
                    },
                );
            }
        }
        info!(shop = %shop_id, added = added.len(), "Shop restocked");
        self.notify(fanout).await;
        Ok(added.len())
    }

    /// Remove an expired listing and destroy the item.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Ledger`] if the item could not be destroyed.
    pub(crate) async fn expire_listing(
        &self,
        shop_id: ShopId,
        item: ItemId,
    ) -> Result<(), ZoneError> {
        let fanout = {
            let mut ledger = self.ledger.lock().await;
            let mut shops = self.shops.lock().await;
            let Some(shop) = shops.get_mut(&shop_id) else {
                debug!(shop = %shop_id, "Listing expiry for a removed shop");
                return Ok(());
            };
            if shop.delist(item).is_err() {
                debug!(shop = %shop_id, item = %item, "Listing already gone");
                return Ok(());
            }
            if ledger.owner_of(item) != Some(Owner::Shop(shop_id)) {
                warn!(shop = %shop_id, item = %item, "Expired listing not held by the shop");
                return Ok(());
            }
            let change = ledger.apply(WeightEvent::Destroy { item })?;
            self.fanout(&ledger, vec![change])
        };
        info!(shop = %shop_id, item = %item, "Listing expired");
        self.notify(fanout).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ballast_events::EventBus;
    use ballast_ledger::PoolError;
    use ballast_types::{Item, ItemFlags, RoomId, ShopKind, WeightClass};
    use ballast_world::CatalogGenerator;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::ZoneConfig;
    use crate::topology::StaticTopology;

    fn zone_with(config: ZoneConfig) -> Zone {
        Zone::new(
            config,
            Arc::new(StaticTopology::new("Temple", "Hub")),
            Arc::new(CatalogGenerator::new()),
            Arc::new(EventBus::default()),
        )
    }

    fn garment() -> Item {
        Item {
            id: ItemId::new(),
            name: String::from("a wool coat"),
            description: String::from("A coat."),
            category: ItemCategory::Garment,
            weight_class: WeightClass::Regular,
            flags: ItemFlags::default(),
            material: None,
            provenance: None,
        }
    }

    #[tokio::test]
    async fn sell_then_buy_back() {
        let zone = zone_with(ZoneConfig::default());
        let shop = zone.add_shop(ShopKind::Boutique, RoomId::new()).await;
        let player = PlayerId::new();
        let coat = garment();
        zone.spawn(coat.clone(), Owner::Player(player)).await.unwrap();
        let pool_start = zone.pool_balance().await;

        // One garment tracked: scarcity 20/2 clamps to 3.0, buy 36, sell 14.
        let paid = zone.sell(player, shop, coat.id).await.unwrap();
        assert_eq!(paid, 14);
        assert_eq!(zone.wallet(player).await, 14);
        assert_eq!(zone.pool_balance().await, pool_start - 14);
        assert_eq!(zone.owner_total(player).await, Decimal::ZERO);

        let listings = zone.browse(shop).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings.first().map(|l| l.price), Some(36));

        assert!(matches!(
            zone.buy(player, shop, coat.id).await,
            Err(ZoneError::Wallet { .. })
        ));
        zone.grant(player, 22).await.unwrap();
        assert_eq!(zone.buy(player, shop, coat.id).await.unwrap(), 36);
        assert_eq!(zone.wallet(player).await, 0);
        assert!(zone.browse(shop).await.unwrap().is_empty());
        assert!(zone.scheduler.lock().await.is_empty());
    }

    #[tokio::test]
    async fn sale_refused_when_pool_is_dry() {
        let mut config = ZoneConfig::default();
        config.pool.start = 0;
        let zone = zone_with(config);
        let shop = zone.add_shop(ShopKind::General, RoomId::new()).await;
        let player = PlayerId::new();
        let coat = garment();
        zone.spawn(coat.clone(), Owner::Player(player)).await.unwrap();

        assert!(matches!(
            zone.sell(player, shop, coat.id).await,
            Err(ZoneError::Pool {
                source: PoolError::InsufficientFunds { .. }
            })
        ));
        assert_eq!(zone.owner_total(player).await, Decimal::ONE);
        assert_eq!(zone.wallet(player).await, 0);
    }

    #[tokio::test]
    async fn food_market_refuses_garments() {
        let zone = zone_with(ZoneConfig::default());
        let shop = zone.add_shop(ShopKind::Food, RoomId::new()).await;
        let player = PlayerId::new();
        let coat = garment();
        zone.spawn(coat.clone(), Owner::Player(player)).await.unwrap();
        assert!(matches!(
            zone.sell(player, shop, coat.id).await,
            Err(ZoneError::Shop {
                source: ShopError::NotAccepted { .. }
            })
        ));
    }

    #[tokio::test]
    async fn restock_respects_the_listing_limit() {
        let mut config = ZoneConfig::default();
        config.zone.seed = Some(4);
        config.economy.max_listings = 4;
        let zone = zone_with(config);
        let shop = zone.add_shop(ShopKind::Food, RoomId::new()).await;

        assert_eq!(zone.restock(shop).await.unwrap(), 3);
        assert_eq!(zone.restock(shop).await.unwrap(), 1);
        assert_eq!(zone.restock(shop).await.unwrap(), 0);
        assert_eq!(zone.browse(shop).await.unwrap().len(), 4);
        assert_eq!(zone.global_total().await, Decimal::from(4));
    }

    #[tokio::test]
    async fn expired_listings_are_destroyed() {
        let mut config = ZoneConfig::default();
        config.zone.seed = Some(9);
        let zone = zone_with(config);
        let shop = zone.add_shop(ShopKind::Food, RoomId::new()).await;
        zone.restock(shop).await.unwrap();
        let listed = zone.browse(shop).await.unwrap();
        for listing in &listed {
            zone.expire_listing(shop, listing.item).await.unwrap();
        }
        assert!(zone.browse(shop).await.unwrap().is_empty());
        assert_eq!(zone.global_total().await, Decimal::ZERO);
    }
}
