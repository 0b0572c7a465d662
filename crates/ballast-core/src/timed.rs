//! Handlers for scheduled actions.
//!
//! The runner pops due actions from the scheduler and hands each one to
//! [`Zone::handle`] in deadline order. Handlers are idempotent with respect
//! to stale payloads: a gift that was already answered or a listing that
//! was already bought is logged and skipped.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use ballast_events::ZoneEvent;
use ballast_ledger::{AuditResult, WeightEvent};
use ballast_players::{CurseTick, GiftError, curse};
use ballast_types::{ItemId, Owner, PlayerId, TimedPayload};

use crate::error::ZoneError;
use crate::scheduler::{ActionToken, Fired};
use crate::zone::Zone;

/// What one [`Zone::fire_due`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireSummary {
    /// Actions handled.
    pub fired: usize,
    /// Actions whose handler returned an error.
    pub failed: usize,
}

impl Zone {
    /// Earliest pending deadline.
    pub async fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.lock().await.next_deadline()
    }

    /// Signalled whenever an action is scheduled.
    pub async fn waker(&self) -> Arc<Notify> {
        self.scheduler.lock().await.waker()
    }

    /// Number of pending timed actions.
    pub async fn pending_actions(&self) -> usize {
        self.scheduler.lock().await.len()
    }

    /// Run every action due at or before `now`, one after another.
    pub async fn fire_due(&self, now: Instant) -> FireSummary {
        let due = self.scheduler.lock().await.pop_due(now);
        let mut summary = FireSummary::default();
        for fired in due {
            summary.fired = summary.fired.saturating_add(1);
            if let Err(error) = self.handle(fired).await {
                summary.failed = summary.failed.saturating_add(1);
                warn!(payload = ?fired.payload, due_at = %fired.due_at, %error, "Timed action failed");
            }
        }
        summary
    }

    /// Run one fired action.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error. Stale gift offers are not errors.
    pub async fn handle(&self, fired: Fired) -> Result<(), ZoneError> {
        match fired.payload {
            TimedPayload::GiftOffer { gift } => match self.auto_accept(gift).await {
                Ok(_) => Ok(()),
                Err(ZoneError::Gift {
                    source: GiftError::NotPending { .. },
                }) => {
                    debug!(gift = %gift, "Gift already resolved");
                    Ok(())
                }
                Err(error) => Err(error),
            },
            TimedPayload::ShopListing { shop, item } => self.expire_listing(shop, item).await,
            TimedPayload::CurseTick { player } => self.curse_tick(player, fired.token).await,
            TimedPayload::MonitorTick => {
                self.monitor_tick().await;
                Ok(())
            }
            TimedPayload::ShopRestock { shop } => self.restock(shop).await.map(|_| ()),
            TimedPayload::EnforcementStep { target, phase } => {
                self.enforcement_step(target, phase).await
            }
        }
    }

    async fn curse_tick(&self, player: PlayerId, token: ActionToken) -> Result<(), ZoneError> {
        let (tick, dropped, fanout) = {
            let gifts = self.gifts.lock().await;
            let mut ledger = self.ledger.lock().await;
            let cursed = ledger.cursed_carried(player);
            let droppable: Vec<ItemId> = ledger
                .items_held_by(Owner::Player(player))
                .into_iter()
                .map(|item| item.id)
                .filter(|item| !gifts.is_pending(*item))
                .collect();
            let tick = {
                let mut rng = self.rng().await;
                curse::tick(cursed, &droppable, &self.config.curse, &mut *rng)
            };
            let fumble = match (&tick, self.topology.room_of(player)) {
                (CurseTick::Afflicted { dropped: Some(item), .. }, Some(room)) => Some((*item, room)),
                _ => None,
            };
            match fumble {
                Some((item, room)) => {
                    let name = ledger
                        .item(item)
                        .map(|found| found.name.clone())
                        .unwrap_or_default();
                    let change = ledger.apply(WeightEvent::Transfer {
                        item,
                        from: Owner::Player(player),
                        to: Owner::Room(room),
                    })?;
                    (tick, Some((name, room)), Some(self.fanout(&ledger, vec![change])))
                }
                None => (tick, None, None),
            }
        };

        match tick {
            CurseTick::Lifted => {
                self.scheduler.lock().await.cancel(token);
                info!(player = %player, "Curse lifted");
            }
            CurseTick::Afflicted { message, .. } => {
                self.say(player, message);
                if let Some((name, room)) = dropped {
                    debug!(player = %player, "Cursed fumble");
                    self.say(
                        player,
                        format!("Your hands spasm. {name} slips from your grasp and clatters to the floor."),
                    );
                    self.bus.publish(ZoneEvent::room(
                        room,
                        format!("{} fumbles {name}, which clatters to the floor.", self.name(player)),
                    ));
                }
            }
        }
        if let Some(fanout) = fanout {
            self.notify(fanout).await;
        }
        Ok(())
    }

    async fn monitor_tick(&self) {
        if let AuditResult::Anomaly(anomaly) = self.audit().await {
            warn!(%anomaly, "Weight ledger drift detected");
        }
        let total = self.ledger.lock().await.global_total();
        let report = {
            let mut pool = self.pool.lock().await;
            let mut monitor = self.monitor.lock().await;
            let mut rng = self.rng().await;
            monitor.tick(&mut pool, total, &mut *rng)
        };
        if report.changed {
            self.bus.publish(ZoneEvent::DangerLevelChanged {
                from: report.previous,
                to: report.level,
                global_total: report.total,
            });
        }
        if let Some(broadcast) = report.broadcast {
            self.announce(broadcast);
        }
        if let Some(text) = report.echo {
            self.bus.publish(ZoneEvent::Ambient {
                ambience: report.level.ambience(),
                text,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::time::Duration;

    use ballast_events::{EventBus, drain};
    use ballast_types::{DangerLevel, EscortPhase, Item, ItemCategory, ItemFlags, WeightClass};
    use ballast_world::CatalogGenerator;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::ZoneConfig;
    use crate::topology::{Place, StaticTopology};

    fn zone(config: ZoneConfig) -> (Zone, Arc<StaticTopology>) {
        let topology = Arc::new(StaticTopology::new("Temple", "Hub"));
        let zone = Zone::new(
            config,
            topology.clone(),
            Arc::new(CatalogGenerator::new()),
            Arc::new(EventBus::default()),
        );
        (zone, topology)
    }

    fn item(flags: ItemFlags) -> Item {
        Item {
            id: ItemId::new(),
            name: String::from("an ugly portrait"),
            description: String::from("It stares."),
            category: ItemCategory::Artwork,
            weight_class: WeightClass::Regular,
            flags,
            material: None,
            provenance: None,
        }
    }

    fn cursed() -> ItemFlags {
        ItemFlags {
            cursed: true,
            ..ItemFlags::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_tick_broadcasts_and_gates_generation() {
        let mut config = ZoneConfig::default();
        config.zone.item_limit = 10;
        let (zone, _) = zone(config);
        zone.start().await.unwrap();
        let mut rx = zone.subscribe();
        for _ in 0..10 {
            zone.spawn(item(ItemFlags::default()), Owner::Room(ballast_types::RoomId::new()))
                .await
                .unwrap();
        }

        tokio::time::advance(Duration::from_secs(180)).await;
        let summary = zone.fire_due(Instant::now()).await;
        assert_eq!(summary.fired, 1);
        assert_eq!(zone.status().await.danger_level, DangerLevel::Sinking);
        assert!(matches!(
            zone.use_itemator(PlayerId::new()).await,
            Err(ZoneError::GenerationDisabled)
        ));
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ZoneEvent::DangerLevelChanged {
                to: DangerLevel::Sinking,
                ..
            }
        )));
        assert!(events.iter().any(|e| matches!(e, ZoneEvent::Ambient { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn curse_tick_starts_on_receipt_and_lifts_itself() {
        let (zone, topology) = zone(ZoneConfig::default());
        let player = PlayerId::new();
        topology.join(player, "Ada", topology.place(Place::Hub));
        let portrait = item(cursed());
        zone.spawn(portrait.clone(), Owner::Player(player)).await.unwrap();
        let tick = TimedPayload::CurseTick { player };
        assert!(zone.scheduler.lock().await.is_scheduled(&tick));

        tokio::time::advance(Duration::from_secs(300)).await;
        zone.fire_due(Instant::now()).await;
        assert!(zone.scheduler.lock().await.is_scheduled(&tick));

        zone.burn(player, portrait.id).await.unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;
        zone.fire_due(Instant::now()).await;
        assert!(!zone.scheduler.lock().await.is_scheduled(&tick));
    }

    #[tokio::test(start_paused = true)]
    async fn certain_fumbles_drop_into_the_room() {
        let mut config = ZoneConfig::default();
        config.curse.drop_percent = 100;
        let (zone, topology) = zone(config);
        let player = PlayerId::new();
        let room = topology.add_room("Corridor");
        topology.join(player, "Ada", room);
        zone.spawn(item(cursed()), Owner::Player(player)).await.unwrap();
        zone.spawn(item(cursed()), Owner::Player(player)).await.unwrap();

        tokio::time::advance(Duration::from_secs(300)).await;
        zone.fire_due(Instant::now()).await;
        assert_eq!(zone.owner_total(player).await, Decimal::ONE);
        assert_eq!(zone.global_total().await, Decimal::from(2));
    }

    #[tokio::test(start_paused = true)]
    async fn gift_window_auto_accepts_once() {
        let (zone, _) = zone(ZoneConfig::default());
        let (giver, recipient) = (PlayerId::new(), PlayerId::new());
        let poem = zone
            .spawn(item(ItemFlags::default()), Owner::Player(giver))
            .await
            .unwrap();
        zone.gift(giver, poem, recipient).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(zone.fire_due(Instant::now()).await.fired, 0);
        tokio::time::advance(Duration::from_secs(1)).await;
        let summary = zone.fire_due(Instant::now()).await;
        assert_eq!(summary, FireSummary { fired: 1, failed: 0 });
        assert_eq!(zone.owner_total(recipient).await, Decimal::ONE);
        assert!(matches!(
            zone.reject(recipient).await,
            Err(ZoneError::Gift { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_action_does_not_block_later_ones() {
        let (zone, _) = zone(ZoneConfig::default());
        let (giver, recipient) = (PlayerId::new(), PlayerId::new());
        zone.scheduler.lock().await.schedule_once(
            Duration::from_secs(30),
            TimedPayload::EnforcementStep {
                target: PlayerId::new(),
                phase: EscortPhase::Execute,
            },
        );
        let poem = zone
            .spawn(item(ItemFlags::default()), Owner::Player(giver))
            .await
            .unwrap();
        zone.gift(giver, poem, recipient).await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        let summary = zone.fire_due(Instant::now()).await;
        assert_eq!(summary, FireSummary { fired: 2, failed: 1 });
        assert_eq!(zone.owner_total(recipient).await, Decimal::ONE);
        assert_eq!(zone.pending_actions().await, 0);
    }
}
