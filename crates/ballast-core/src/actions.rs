//! Player actions on items and fixtures: generation, crafting, burning,
//! eating and display shelves.
//!
//! Each action validates against the aggregates it locks, commits one
//! ledger batch, and only then publishes notifications. A failure at any
//! step leaves the ledger, pool and wallets untouched.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use ballast_events::ZoneEvent;
use ballast_ledger::{FeedstockPool, WeightEvent};
use ballast_types::{Item, ItemFlag, ItemId, Owner, PlayerId, ShelfId, Station};
use ballast_world::{
    Combiner, CraftError, Display, Generator, Incompatibility, MaterialDispenser,
};

use crate::error::ZoneError;
use crate::zone::{Zone, carried, not_pending, refund};

fn credit_pool(pool: &mut FeedstockPool, amount: u64, source: &'static str) {
    let receipt = pool.credit(amount);
    if receipt.discarded > 0 {
        debug!(source, discarded = receipt.discarded, "Pool at cap, ash discarded");
    }
}

impl Zone {
    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Use the itemator: pay its cost and receive a random item.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GenerationDisabled`] while the zone is sinking.
    /// - [`ZoneError::Wallet`] if the player cannot pay.
    pub async fn use_itemator(&self, player: PlayerId) -> Result<Item, ZoneError> {
        self.require_generation().await?;
        let item = {
            let mut rng = self.rng().await;
            self.itemator.produce(self.catalog.as_ref(), &mut *rng)
        };
        let item = self.generate(player, item, self.itemator.cost(), "itemator").await?;
        self.say(player, format!("The itemator whirs and produces {}.", item.name));
        Ok(item)
    }

    /// Take a raw material from a station's dispenser.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GenerationDisabled`] while the zone is sinking.
    /// - [`ZoneError::World`] if the station does not stock the material.
    /// - [`ZoneError::Wallet`] if the player cannot pay.
    pub async fn dispense(
        &self,
        player: PlayerId,
        station: Station,
        material: &str,
    ) -> Result<Item, ZoneError> {
        self.require_generation().await?;
        let dispenser =
            MaterialDispenser::new(station, material, self.config.economy.dispenser_cost)?;
        let item = {
            let mut rng = self.rng().await;
            dispenser.produce(self.catalog.as_ref(), &mut *rng)
        };
        let item = self.generate(player, item, dispenser.cost(), "dispenser").await?;
        self.say(player, format!("The dispenser drops {} into your hands.", item.name));
        Ok(item)
    }

    async fn generate(
        &self,
        player: PlayerId,
        item: Item,
        cost: u64,
        source: &'static str,
    ) -> Result<Item, ZoneError> {
        let fanout = {
            let mut ledger = self.ledger.lock().await;
            let mut pool = self.pool.lock().await;
            let mut wallets = self.wallets.lock().await;
            wallets.withdraw(player, cost)?;
            let change = match ledger.apply(WeightEvent::Create {
                item: Box::new(item.clone()),
                owner: Owner::Player(player),
            }) {
                Ok(change) => change,
                Err(error) => {
                    refund(&mut wallets, player, cost);
                    return Err(error.into());
                }
            };
            credit_pool(&mut pool, cost, source);
            self.fanout(&ledger, vec![change])
        };
        info!(player = %player, item = %item.id, category = ?item.category, source, "Item generated");
        self.notify(fanout).await;
        Ok(item)
    }

    // -----------------------------------------------------------------------
    // Crafting
    // -----------------------------------------------------------------------

    /// Combine two carried raw materials at the workbench.
    ///
    /// Both inputs are destroyed and the product created in one ledger
    /// batch. A masterpiece is announced to the zone without naming the
    /// crafter.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GenerationDisabled`] while the zone is sinking.
    /// - [`ZoneError::GiftPending`] if either input is on offer.
    /// - [`ZoneError::Craft`] if either input is not a carried raw material.
    pub async fn combine(
        &self,
        player: PlayerId,
        first: ItemId,
        second: ItemId,
    ) -> Result<Item, ZoneError> {
        self.require_generation().await?;
        let (product, fanout) = {
            let gifts = self.gifts.lock().await;
            not_pending(&gifts, first)?;
            not_pending(&gifts, second)?;

            let mut ledger = self.ledger.lock().await;
            let a = held_material(&ledger, player, first)?.clone();
            let b = held_material(&ledger, player, second)?.clone();
            let outcome = {
                let mut rng = self.rng().await;
                self.workbench
                    .combine(&a, &b, self.catalog.as_ref(), &mut *rng)?
            };
            let [x, y] = outcome.consumed;
            let changes = ledger.apply_all(vec![
                WeightEvent::Destroy { item: x },
                WeightEvent::Destroy { item: y },
                WeightEvent::Create {
                    item: Box::new(outcome.item.clone()),
                    owner: Owner::Player(player),
                },
            ])?;
            info!(
                player = %player,
                item = %outcome.item.id,
                category = ?outcome.item.category,
                same_station = outcome.same_station,
                promoted = outcome.promoted,
                "Materials combined"
            );
            (outcome.item, self.fanout(&ledger, changes))
        };
        self.notify(fanout).await;
        self.say(
            player,
            format!("You work the materials together and make {}.", product.name),
        );
        if product.flags.masterpiece {
            self.announce_masterpiece(player, &product);
        }
        Ok(product)
    }

    fn announce_masterpiece(&self, crafter: PlayerId, item: &Item) {
        let room = self.topology.room_of(crafter);
        let location = room.map_or_else(
            || String::from("somewhere on the platform"),
            |room| self.topology.room_name(room),
        );
        info!(item = %item.id, location = %location, "Masterpiece crafted");
        self.announce(format!(
            "[ZONE 25] A masterpiece has been completed in the {location}: {}.",
            item.name
        ));
        self.bus.publish(ZoneEvent::Masterpiece {
            item_name: item.name.clone(),
            room,
            location,
        });
    }

    // -----------------------------------------------------------------------
    // Sinks
    // -----------------------------------------------------------------------

    /// Feed a carried item to the incinerator.
    ///
    /// The pool is credited with the reclaimed value and the burner is paid
    /// the same amount. Returns the reward.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GiftPending`] if the item is on offer.
    /// - [`ZoneError::NotHeld`] if the player does not carry it.
    pub async fn burn(&self, player: PlayerId, item: ItemId) -> Result<u64, ZoneError> {
        let (name, reward, fanout) = {
            let gifts = self.gifts.lock().await;
            not_pending(&gifts, item)?;
            let mut ledger = self.ledger.lock().await;
            let found = carried(&ledger, player, item)?;
            let reward = self.incinerator.burn_reward(found);
            let name = found.name.clone();

            let mut pool = self.pool.lock().await;
            let mut wallets = self.wallets.lock().await;
            let change = ledger.apply(WeightEvent::Destroy { item })?;
            credit_pool(&mut pool, reward, "incinerator");
            if let Err(error) = wallets.deposit(player, reward) {
                warn!(player = %player, reward, %error, "Burn reward not paid");
            }
            (name, reward, self.fanout(&ledger, vec![change]))
        };
        info!(player = %player, item = %item, reward, "Item incinerated");
        self.notify(fanout).await;
        self.say(
            player,
            format!("You feed {name} to the incinerator. It returns {reward} ash."),
        );
        Ok(reward)
    }

    /// Eat a carried edible item.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GiftPending`] if the item is on offer.
    /// - [`ZoneError::NotHeld`] if the player does not carry it.
    /// - [`ZoneError::NotEdible`] for anything that is not food.
    pub async fn eat(&self, player: PlayerId, item: ItemId) -> Result<(), ZoneError> {
        let (name, fanout) = {
            let gifts = self.gifts.lock().await;
            not_pending(&gifts, item)?;
            let mut ledger = self.ledger.lock().await;
            let found = carried(&ledger, player, item)?;
            if !found.flags.edible {
                return Err(ZoneError::NotEdible { item });
            }
            let name = found.name.clone();
            let change = ledger.apply(WeightEvent::Destroy { item })?;
            (name, self.fanout(&ledger, vec![change]))
        };
        debug!(player = %player, item = %item, "Item eaten");
        self.notify(fanout).await;
        self.say(player, format!("You eat {name}."));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Display shelves
    // -----------------------------------------------------------------------

    /// Claim a shelf. Everything already on it starts counting toward the
    /// claimant. Returns the weight that was attributed.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::UnknownShelf`] for an unknown shelf.
    /// - [`ZoneError::World`] if someone else claims it.
    pub async fn claim(&self, player: PlayerId, shelf_id: ShelfId) -> Result<Decimal, ZoneError> {
        let (moved, crossed) = {
            let mut shelves = self.shelves.lock().await;
            let shelf = shelves
                .get_mut(&shelf_id)
                .ok_or(ZoneError::UnknownShelf { shelf: shelf_id })?;
            if shelf.claimant() == Some(player) {
                return Ok(Decimal::ZERO);
            }
            shelf.claim(player)?;

            let mut ledger = self.ledger.lock().await;
            let before = ledger.owner_total(player);
            match ledger.claim_shelf(shelf_id, player) {
                Ok(moved) => {
                    let after = ledger.owner_total(player);
                    (moved, self.crossed(before, after))
                }
                Err(error) => {
                    if let Err(revert) = shelf.unclaim(player) {
                        warn!(shelf = %shelf_id, %revert, "Shelf claim revert failed");
                    }
                    return Err(error.into());
                }
            }
        };
        info!(player = %player, shelf = %shelf_id, moved = %moved, "Shelf claimed");
        if crossed {
            self.hoarding_hint(player);
        }
        self.say(player, "You claim the display shelf.");
        Ok(moved)
    }

    /// Release a shelf. Its items stay put but stop counting toward the
    /// former claimant.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::UnknownShelf`] for an unknown shelf.
    /// - [`ZoneError::World`] if the player is not the claimant.
    pub async fn unclaim(&self, player: PlayerId, shelf_id: ShelfId) -> Result<(), ZoneError> {
        {
            let mut shelves = self.shelves.lock().await;
            let shelf = shelves
                .get_mut(&shelf_id)
                .ok_or(ZoneError::UnknownShelf { shelf: shelf_id })?;
            shelf.unclaim(player)?;

            let mut ledger = self.ledger.lock().await;
            if let Err(error) = ledger.unclaim_shelf(shelf_id) {
                if let Err(revert) = shelf.claim(player) {
                    warn!(shelf = %shelf_id, %revert, "Shelf unclaim revert failed");
                }
                return Err(error.into());
            }
        }
        info!(player = %player, shelf = %shelf_id, "Shelf released");
        self.say(player, "You release your claim on the display shelf.");
        Ok(())
    }

    /// Put a carried item on the player's claimed shelf. Displayed items
    /// weigh half and still count toward the claimant.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::GiftPending`] if the item is on offer.
    /// - [`ZoneError::UnknownShelf`] for an unknown shelf.
    /// - [`ZoneError::World`] if the player is not the claimant or the shelf
    ///   is full.
    /// - [`ZoneError::NotHeld`] if the player does not carry the item.
    pub async fn display(
        &self,
        player: PlayerId,
        item: ItemId,
        shelf_id: ShelfId,
    ) -> Result<(), ZoneError> {
        let fanout = {
            let gifts = self.gifts.lock().await;
            not_pending(&gifts, item)?;
            let mut shelves = self.shelves.lock().await;
            let shelf = shelves
                .get_mut(&shelf_id)
                .ok_or(ZoneError::UnknownShelf { shelf: shelf_id })?;
            let mut ledger = self.ledger.lock().await;
            carried(&ledger, player, item)?;
            shelf.place(player, item)?;

            match ledger.apply_all(vec![
                WeightEvent::Transfer {
                    item,
                    from: Owner::Player(player),
                    to: Owner::Shelf(shelf_id),
                },
                WeightEvent::SetFlag {
                    item,
                    flag: ItemFlag::Displayed,
                    value: true,
                },
            ]) {
                Ok(changes) => self.fanout(&ledger, changes),
                Err(error) => {
                    shelf.evict(item);
                    return Err(error.into());
                }
            }
        };
        debug!(player = %player, item = %item, shelf = %shelf_id, "Item displayed");
        self.notify(fanout).await;
        self.say(player, "You set the item on the display shelf.");
        Ok(())
    }

    /// Take an item off the player's claimed shelf.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::UnknownShelf`] for an unknown shelf.
    /// - [`ZoneError::World`] if the player is not the claimant or the item
    ///   is not on the shelf.
    pub async fn retrieve(
        &self,
        player: PlayerId,
        item: ItemId,
        shelf_id: ShelfId,
    ) -> Result<(), ZoneError> {
        let fanout = {
            let mut shelves = self.shelves.lock().await;
            let shelf = shelves
                .get_mut(&shelf_id)
                .ok_or(ZoneError::UnknownShelf { shelf: shelf_id })?;
            shelf.take(player, item)?;

            let mut ledger = self.ledger.lock().await;
            match ledger.apply_all(vec![
                WeightEvent::SetFlag {
                    item,
                    flag: ItemFlag::Displayed,
                    value: false,
                },
                WeightEvent::Transfer {
                    item,
                    from: Owner::Shelf(shelf_id),
                    to: Owner::Player(player),
                },
            ]) {
                Ok(changes) => self.fanout(&ledger, changes),
                Err(error) => {
                    if let Err(revert) = shelf.place(player, item) {
                        warn!(shelf = %shelf_id, item = %item, %revert, "Shelf retrieve revert failed");
                    }
                    return Err(error.into());
                }
            }
        };
        debug!(player = %player, item = %item, shelf = %shelf_id, "Item retrieved");
        self.notify(fanout).await;
        self.say(player, "You take the item back from the display shelf.");
        Ok(())
    }
}

fn held_material<'a>(
    ledger: &'a ballast_ledger::WeightLedger,
    player: PlayerId,
    item: ItemId,
) -> Result<&'a Item, ZoneError> {
    match carried(ledger, player, item) {
        Err(ZoneError::NotHeld { item, .. }) => Err(CraftError::IncompatibleMaterials {
            item,
            reason: Incompatibility::NotHeld,
        }
        .into()),
        other => other,
    }
}
