//! Gift offers between players.
//!
//! The offered item stays with the giver while the offer is pending and is
//! locked against every other action. The offer resolves exactly once: by
//! `accept`, by `reject`, or by the auto-accept timer.

use chrono::Utc;
use tracing::{debug, info, warn};

use ballast_events::ZoneEvent;
use ballast_ledger::WeightEvent;
use ballast_players::GiftOffer;
use ballast_types::{GiftId, ItemFlag, ItemId, Owner, PlayerId, TimedPayload};

use crate::error::ZoneError;
use crate::zone::Zone;

/// How a gift resolution finds its offer.
#[derive(Debug, Clone, Copy)]
enum Pick {
    Recipient(PlayerId),
    Offer(GiftId),
}

/// Where a resolved gift ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftOutcome {
    /// The recipient has it.
    Accepted,
    /// Back with the giver.
    Returned,
    /// Dropped in the giver's room because the giver was gone.
    Dropped,
}

impl Zone {
    /// Offer an item to another player.
    ///
    /// The item may be carried or sit on the giver's claimed shelf; a
    /// shelved item is taken down first. The recipient has the gift window
    /// to answer before the offer is accepted automatically.
    ///
    /// # Errors
    ///
    /// - [`ZoneError::Gift`] for self-gifts, busy recipients or items
    ///   already on offer.
    /// - [`ZoneError::NotHeld`] if the giver neither carries nor displays
    ///   the item.
    pub async fn gift(
        &self,
        giver: PlayerId,
        item: ItemId,
        recipient: PlayerId,
    ) -> Result<GiftOffer, ZoneError> {
        let (offer, name, fanout) = {
            let mut gifts = self.gifts.lock().await;
            let mut shelves = self.shelves.lock().await;
            let mut ledger = self.ledger.lock().await;

            let shelf = match ledger.owner_of(item) {
                Some(Owner::Player(holder)) if holder == giver => None,
                Some(Owner::Shelf(shelf)) if ledger.shelf_claimant(shelf) == Some(giver) => {
                    Some(shelf)
                }
                None => return Err(ballast_ledger::LedgerError::NotTracked { item }.into()),
                Some(_) => return Err(ZoneError::NotHeld { player: giver, item }),
            };
            let name = ledger
                .item(item)
                .map(|found| found.name.clone())
                .unwrap_or_default();

            let offer = gifts.offer(item, giver, recipient, Utc::now())?;

            let changes = match shelf {
                Some(shelf_id) => {
                    let taken_down = ledger.apply_all(vec![
                        WeightEvent::SetFlag {
                            item,
                            flag: ItemFlag::Displayed,
                            value: false,
                        },
                        WeightEvent::Transfer {
                            item,
                            from: Owner::Shelf(shelf_id),
                            to: Owner::Player(giver),
                        },
                    ]);
                    match taken_down {
                        Ok(changes) => {
                            if let Some(shelf) = shelves.get_mut(&shelf_id) {
                                shelf.evict(item);
                            }
                            changes
                        }
                        Err(error) => {
                            if let Err(rollback) = gifts.take(offer.id) {
                                warn!(gift = %offer.id, %rollback, "Gift rollback failed");
                            }
                            return Err(error.into());
                        }
                    }
                }
                None => Vec::new(),
            };
            (offer, name, self.fanout(&ledger, changes))
        };

        self.scheduler.lock().await.schedule_once(
            self.config.timers.gift_window(),
            TimedPayload::GiftOffer { gift: offer.id },
        );
        info!(gift = %offer.id, giver = %giver, recipient = %recipient, item = %item, "Gift offered");
        self.notify(fanout).await;

        let giver_name = self.name(giver);
        let recipient_name = self.name(recipient);
        self.say(giver, format!("You offer {name} to {recipient_name} as a gift."));
        self.say(
            recipient,
            format!("{giver_name} offers you {name} as a gift. Use accept or reject."),
        );
        Ok(offer)
    }

    /// Accept the gift waiting for `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Gift`] if nothing is pending.
    pub async fn accept(&self, recipient: PlayerId) -> Result<GiftOutcome, ZoneError> {
        self.resolve_gift(Pick::Recipient(recipient), true).await
    }

    /// Reject the gift waiting for `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Gift`] if nothing is pending.
    pub async fn reject(&self, recipient: PlayerId) -> Result<GiftOutcome, ZoneError> {
        self.resolve_gift(Pick::Recipient(recipient), false).await
    }

    /// Auto-accept an offer whose window ran out.
    pub(crate) async fn auto_accept(&self, gift: GiftId) -> Result<GiftOutcome, ZoneError> {
        self.resolve_gift(Pick::Offer(gift), true).await
    }

    async fn resolve_gift(&self, pick: Pick, accepted: bool) -> Result<GiftOutcome, ZoneError> {
        let (offer, name, outcome, fanout) = {
            let mut gifts = self.gifts.lock().await;
            let offer = match pick {
                Pick::Recipient(recipient) => gifts.take_for(recipient)?,
                Pick::Offer(gift) => gifts.take(gift)?,
            };
            let mut ledger = self.ledger.lock().await;
            let name = ledger
                .item(offer.item)
                .map(|found| found.name.clone())
                .unwrap_or_default();

            let (outcome, to) = if accepted {
                (GiftOutcome::Accepted, Some(Owner::Player(offer.recipient)))
            } else if self.topology.is_online(offer.giver) {
                (GiftOutcome::Returned, None)
            } else {
                match self.topology.room_of(offer.giver) {
                    Some(room) => (GiftOutcome::Dropped, Some(Owner::Room(room))),
                    None => (GiftOutcome::Returned, None),
                }
            };
            let changes = match to {
                Some(to) => vec![ledger.apply(WeightEvent::Transfer {
                    item: offer.item,
                    from: Owner::Player(offer.giver),
                    to,
                })?],
                None => Vec::new(),
            };
            (offer, name, outcome, self.fanout(&ledger, changes))
        };

        if self
            .cancel_timer(TimedPayload::GiftOffer { gift: offer.id })
            .await
        {
            debug!(gift = %offer.id, "Gift timer cancelled");
        }
        info!(gift = %offer.id, ?outcome, "Gift resolved");
        self.notify(fanout).await;
        self.bus.publish(ZoneEvent::GiftResolved {
            item: offer.item,
            giver: offer.giver,
            recipient: offer.recipient,
            accepted: outcome == GiftOutcome::Accepted,
        });

        let giver_name = self.name(offer.giver);
        let recipient_name = self.name(offer.recipient);
        match (outcome, pick) {
            (GiftOutcome::Accepted, Pick::Offer(_)) => {
                self.say(
                    offer.recipient,
                    format!("The gift of {name} has been accepted automatically."),
                );
                self.say(
                    offer.giver,
                    format!("{recipient_name} accepted your gift of {name}."),
                );
            }
            (GiftOutcome::Accepted, Pick::Recipient(_)) => {
                self.say(offer.recipient, format!("You accept {name} from {giver_name}."));
                self.say(
                    offer.giver,
                    format!("{recipient_name} accepted your gift of {name}."),
                );
            }
            (GiftOutcome::Returned | GiftOutcome::Dropped, _) => {
                self.say(
                    offer.recipient,
                    format!("You decline the gift of {name} from {giver_name}."),
                );
                self.say(
                    offer.giver,
                    format!("{recipient_name} declined your gift of {name}. It has been returned."),
                );
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ballast_events::EventBus;
    use ballast_players::GiftError;
    use ballast_types::{Item, ItemCategory, ItemFlags, WeightClass};
    use ballast_world::CatalogGenerator;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::ZoneConfig;
    use crate::topology::{Place, StaticTopology};

    struct Fixture {
        zone: Zone,
        topology: Arc<StaticTopology>,
        giver: PlayerId,
        recipient: PlayerId,
        item: ItemId,
    }

    async fn fixture() -> Fixture {
        let topology = Arc::new(StaticTopology::new("Temple", "Hub"));
        let zone = Zone::new(
            ZoneConfig::default(),
            topology.clone(),
            Arc::new(CatalogGenerator::new()),
            Arc::new(EventBus::default()),
        );
        let giver = PlayerId::new();
        let recipient = PlayerId::new();
        let hub = topology.place(Place::Hub);
        topology.join(giver, "Ada", hub);
        topology.join(recipient, "Mo", hub);
        let item = Item {
            id: ItemId::new(),
            name: String::from("a quiet poem"),
            description: String::from("A poem."),
            category: ItemCategory::Poem,
            weight_class: WeightClass::Regular,
            flags: ItemFlags::default(),
            material: None,
            provenance: None,
        };
        let id = zone.spawn(item, Owner::Player(giver)).await.unwrap();
        Fixture {
            zone,
            topology,
            giver,
            recipient,
            item: id,
        }
    }

    #[tokio::test]
    async fn pending_items_stay_with_the_giver_and_are_locked() {
        let f = fixture().await;
        f.zone.gift(f.giver, f.item, f.recipient).await.unwrap();
        assert_eq!(f.zone.owner_total(f.giver).await, Decimal::ONE);
        assert!(matches!(
            f.zone.burn(f.giver, f.item).await,
            Err(ZoneError::GiftPending { .. })
        ));
        assert!(matches!(
            f.zone.gift(f.giver, f.item, PlayerId::new()).await,
            Err(ZoneError::Gift {
                source: GiftError::ItemPending { .. }
            })
        ));
    }

    #[tokio::test]
    async fn accept_moves_the_item_once() {
        let f = fixture().await;
        f.zone.gift(f.giver, f.item, f.recipient).await.unwrap();
        assert_eq!(f.zone.accept(f.recipient).await.unwrap(), GiftOutcome::Accepted);
        assert_eq!(f.zone.owner_total(f.recipient).await, Decimal::ONE);
        assert_eq!(f.zone.owner_total(f.giver).await, Decimal::ZERO);
        assert!(matches!(
            f.zone.accept(f.recipient).await,
            Err(ZoneError::Gift {
                source: GiftError::NothingPending { .. }
            })
        ));
        assert!(f.zone.scheduler.lock().await.is_empty());
    }

    #[tokio::test]
    async fn reject_returns_to_an_online_giver() {
        let f = fixture().await;
        f.zone.gift(f.giver, f.item, f.recipient).await.unwrap();
        assert_eq!(f.zone.reject(f.recipient).await.unwrap(), GiftOutcome::Returned);
        assert_eq!(f.zone.owner_total(f.giver).await, Decimal::ONE);
    }

    #[tokio::test]
    async fn reject_drops_in_the_room_of_an_absent_giver() {
        let f = fixture().await;
        f.zone.gift(f.giver, f.item, f.recipient).await.unwrap();
        f.topology.set_online(f.giver, false);
        assert_eq!(f.zone.reject(f.recipient).await.unwrap(), GiftOutcome::Dropped);
        assert_eq!(
            f.zone.item(f.item).await.map(|h| h.owner),
            Some(Owner::Room(f.topology.place(Place::Hub)))
        );
        assert_eq!(f.zone.global_total().await, Decimal::ONE);
    }

    #[tokio::test]
    async fn gifting_from_a_shelf_takes_the_item_down() {
        let f = fixture().await;
        let shelf = f.zone.add_shelf(f.topology.place(Place::Hub), "notice board").await;
        f.zone.claim(f.giver, shelf).await.unwrap();
        f.zone.display(f.giver, f.item, shelf).await.unwrap();

        f.zone.gift(f.giver, f.item, f.recipient).await.unwrap();
        let holding = f.zone.item(f.item).await.unwrap();
        assert_eq!(holding.owner, Owner::Player(f.giver));
        assert!(!holding.item.flags.displayed);
        assert!(f.zone.shelves().await.iter().all(|s| !s.holds(f.item)));
    }
}
