//! Hoarding reports and the escort sequence.
//!
//! A report is judged against the target's enforcement record while that
//! record is locked, so two reports against the same player serialize and
//! reports against different players run in parallel. Escort phases run
//! as scheduled steps: each step advances the record under its lock, then
//! releases it before touching the ledger, wallets or the map.

use chrono::Utc;
use tracing::{debug, info, warn};

use ballast_events::ZoneEvent;
use ballast_ledger::WeightEvent;
use ballast_players::{Cue, EscortStep, Verdict, enforcement};
use ballast_types::{EscortPhase, ItemFlag, ItemId, Owner, PlayerId, TimedPayload};

use crate::error::ZoneError;
use crate::topology::Place;
use crate::zone::Zone;

impl Zone {
    /// Report `target` for hoarding.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Enforcement`] for self-reports and for targets
    /// below the minor threshold. Neither changes any state.
    pub async fn report(&self, reporter: PlayerId, target: PlayerId) -> Result<Verdict, ZoneError> {
        let rules = &self.config.enforcement;
        let handle = self.record_handle(target).await;
        let mut record = handle.lock().await;
        let total = self.ledger.lock().await.owner_total(target);
        let now = Utc::now();
        let verdict = enforcement::evaluate(&mut record, reporter, total, now, rules)?;

        let target_name = self.name(target);
        match verdict {
            Verdict::Fined {
                strike,
                amount,
                investigation,
            } => {
                let paid = {
                    let mut pool = self.pool.lock().await;
                    let mut wallets = self.wallets.lock().await;
                    let paid = wallets.withdraw(target, u64::from(amount)).is_ok();
                    pool.credit(u64::from(amount));
                    paid
                };
                enforcement::record_fine(&mut record, strike, amount, paid, now);
                drop(record);

                self.bus.publish(ZoneEvent::Fined {
                    target,
                    strike,
                    amount,
                    paid,
                });
                let owed = if paid { "deducted" } else { "added to your debt" };
                if strike == 1 {
                    self.say(
                        target,
                        format!(
                            "You have been reported for hoarding ({total} weight). A fine of \
                             {amount} ash has been {owed}. Consider visiting the {}.",
                            self.config.zone.disposal
                        ),
                    );
                } else {
                    self.say(
                        target,
                        format!(
                            "Offense #{strike}. {amount} ash {owed}. Further violations will \
                             trigger a formal investigation."
                        ),
                    );
                }
                if investigation {
                    info!(target = %target, strike, "Formal investigation flag raised");
                }
                self.say_in_room_of(
                    reporter,
                    format!("{target_name} has been cited for hoarding. A fine of {amount} ash has been levied."),
                );
                self.say(
                    reporter,
                    format!("You report {target_name} for hoarding. Fine of {amount} ash applied."),
                );
            }
            Verdict::Escalated { cause } => {
                let remaining = record.investigation_remaining;
                let first = record.escort_phase;
                drop(record);

                info!(target = %target, reporter = %reporter, ?cause, "Escort sequence ordered");
                self.announce(enforcement::investigation_notice(
                    &target_name,
                    remaining,
                    rules.investigation_steps,
                    self.config.zone.places(),
                ));
                self.say(
                    reporter,
                    format!(
                        "You file a formal hoarding report against {target_name}. \
                         An investigation has begun."
                    ),
                );
                if let Some(phase) = first {
                    self.schedule_step(target, phase).await;
                }
            }
            Verdict::Deferred => {
                let remaining = record.investigation_remaining;
                drop(record);
                self.say(
                    reporter,
                    format!(
                        "Enforcement against {target_name} is already under way \
                         ({remaining} investigation cycle(s) remain). Your report is \
                         queued and will be reviewed once it is over."
                    ),
                );
            }
        }
        Ok(verdict)
    }

    /// Administrative reset of a player's strikes and any running escort.
    ///
    /// Pending escort steps are cancelled and anything already seized is
    /// handed back. Fine history and outstanding debt are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Ledger`] if seized items could not be returned.
    pub async fn admin_reset(&self, player: PlayerId) -> Result<(), ZoneError> {
        let handle = self.record_handle(player).await;
        let was_in_flight = {
            let mut record = handle.lock().await;
            let in_flight = record.is_in_flight();
            enforcement::admin_reset(&mut record);
            in_flight
        };
        if !was_in_flight {
            return Ok(());
        }
        for phase in EscortPhase::ALL {
            self.cancel_timer(TimedPayload::EnforcementStep {
                target: player,
                phase,
            })
            .await;
        }
        let fanout = {
            let mut ledger = self.ledger.lock().await;
            let seized: Vec<ItemId> = ledger
                .items_held_by(Owner::Custody(player))
                .into_iter()
                .map(|item| item.id)
                .collect();
            let changes = ledger.apply_all(
                seized
                    .into_iter()
                    .map(|item| WeightEvent::Transfer {
                        item,
                        from: Owner::Custody(player),
                        to: Owner::Player(player),
                    })
                    .collect(),
            )?;
            self.fanout(&ledger, changes)
        };
        info!(player = %player, "Running escort cancelled by admin");
        self.notify(fanout).await;
        self.say(player, "Your enforcement record has been reset by an administrator.");
        Ok(())
    }

    /// Run one scheduled escort step.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Enforcement`] for stale steps, for example after
    /// an administrative reset.
    pub(crate) async fn enforcement_step(
        &self,
        target: PlayerId,
        phase: EscortPhase,
    ) -> Result<(), ZoneError> {
        let handle = self.record_handle(target).await;
        let step = {
            let mut record = handle.lock().await;
            enforcement::advance(&mut record, phase)?
        };
        debug!(target = %target, ?phase, remaining = step.remaining, "Escort step");

        match step.phase {
            EscortPhase::Investigation => {
                self.announce(enforcement::investigation_notice(
                    &self.name(target),
                    step.remaining,
                    self.config.enforcement.investigation_steps,
                    self.config.zone.places(),
                ));
            }
            EscortPhase::Announce | EscortPhase::Move => self.narrate(target, step.phase),
            EscortPhase::Seize => {
                let seized = self.seize(target).await?;
                info!(target = %target, seized, "Possessions seized");
                self.narrate(target, step.phase);
            }
            EscortPhase::Escort => {
                self.topology.relocate(target, Place::Disposal);
                self.narrate(target, step.phase);
            }
            EscortPhase::Execute => {
                self.execute(target).await?;
                self.narrate(target, step.phase);
                self.topology.relocate(target, Place::Hub);
            }
            EscortPhase::Cleanup => {
                self.narrate(target, step.phase);
                let deferred = enforcement::finish(&mut *handle.lock().await);
                info!(target = %target, deferred = deferred.len(), "Escort complete");
                for reporter in deferred {
                    if let Err(error) = self.report(reporter, target).await {
                        debug!(reporter = %reporter, target = %target, %error, "Deferred report dropped");
                    }
                }
            }
        }

        self.bus.publish(ZoneEvent::Escort {
            target,
            phase: step.phase,
        });
        self.schedule_next(target, step).await;
        Ok(())
    }

    async fn schedule_step(&self, target: PlayerId, phase: EscortPhase) {
        let timers = self.config.timers;
        let delay = if phase == EscortPhase::Investigation {
            timers.investigation_step()
        } else {
            timers.escort_phase()
        };
        self.scheduler
            .lock()
            .await
            .schedule_once(delay, TimedPayload::EnforcementStep { target, phase });
    }

    async fn schedule_next(&self, target: PlayerId, step: EscortStep) {
        if let Some(next) = step.next {
            self.schedule_step(target, next).await;
        }
    }

    fn narrate(&self, target: PlayerId, phase: EscortPhase) {
        let name = self.name(target);
        let cues = enforcement::escort_cues(
            phase,
            &name,
            self.config.enforcement.escort_debt,
            self.config.zone.places(),
        );
        for cue in cues {
            match cue {
                Cue::World(text) => self.announce(text),
                Cue::Room(text) => {
                    let room = if phase == EscortPhase::Cleanup {
                        Some(self.topology.locate(Place::Disposal))
                    } else {
                        self.topology.room_of(target)
                    };
                    if let Some(room) = room {
                        self.bus.publish(ZoneEvent::room(room, text));
                    }
                }
                Cue::Target(text) => self.say(target, text),
            }
        }
    }

    /// Move everything attributed to `target` into custody. Shelved items
    /// are taken down and any gift offers for them are withdrawn.
    async fn seize(&self, target: PlayerId) -> Result<usize, ZoneError> {
        let (seized, withdrawn, fanout) = {
            let mut gifts = self.gifts.lock().await;
            let mut shelves = self.shelves.lock().await;
            let mut ledger = self.ledger.lock().await;

            let possessions = ledger.possessions_of(target);
            let mut events = Vec::with_capacity(possessions.len());
            let mut shelved = Vec::new();
            for holding in &possessions {
                let item = holding.item.id;
                if let Owner::Shelf(shelf) = holding.owner {
                    if holding.item.flags.displayed {
                        events.push(WeightEvent::SetFlag {
                            item,
                            flag: ItemFlag::Displayed,
                            value: false,
                        });
                    }
                    shelved.push((shelf, item));
                }
                events.push(WeightEvent::Transfer {
                    item,
                    from: holding.owner,
                    to: Owner::Custody(target),
                });
            }
            let changes = ledger.apply_all(events)?;

            for (shelf, item) in shelved {
                if let Some(shelf) = shelves.get_mut(&shelf) {
                    shelf.evict(item);
                }
            }
            let withdrawn: Vec<_> = possessions
                .iter()
                .filter_map(|holding| gifts.forget_item(holding.item.id))
                .collect();
            (possessions.len(), withdrawn, self.fanout(&ledger, changes))
        };
        for offer in withdrawn {
            self.cancel_timer(TimedPayload::GiftOffer { gift: offer.id })
                .await;
            self.say(
                offer.recipient,
                "The gift offered to you was confiscated by a Security Unit.",
            );
        }
        self.notify(fanout).await;
        Ok(seized)
    }

    /// Destroy custody, apply the escort debt and pay the reporters.
    async fn execute(&self, target: PlayerId) -> Result<(), ZoneError> {
        let late = self.seize(target).await?;
        if late > 0 {
            debug!(target = %target, late, "Late possessions seized at execution");
        }
        let fanout = {
            let mut ledger = self.ledger.lock().await;
            let doomed: Vec<ItemId> = ledger
                .items_held_by(Owner::Custody(target))
                .into_iter()
                .map(|item| item.id)
                .collect();
            let changes = ledger.apply_all(
                doomed
                    .into_iter()
                    .map(|item| WeightEvent::Destroy { item })
                    .collect(),
            )?;
            self.fanout(&ledger, changes)
        };
        self.notify(fanout).await;

        let settlement = {
            let handle = self.record_handle(target).await;
            let mut record = handle.lock().await;
            enforcement::settle(&mut record)
        };
        let rules = &self.config.enforcement;
        let share = enforcement::reward_share(rules.reporter_reward, settlement.reporters.len());
        let payout = u64::try_from(settlement.reporters.len())
            .ok()
            .and_then(|count| share.checked_mul(count))
            .unwrap_or(0);
        let paid_reporters = {
            let mut pool = self.pool.lock().await;
            let mut wallets = self.wallets.lock().await;
            wallets.set(target, 0_i64.saturating_sub(i64::from(rules.escort_debt)));
            if payout == 0 {
                false
            } else if let Err(error) = pool.debit(payout) {
                warn!(target = %target, payout, %error, "Reporter rewards unpaid");
                false
            } else {
                for reporter in &settlement.reporters {
                    if let Err(error) = wallets.deposit(*reporter, share) {
                        warn!(reporter = %reporter, %error, "Reporter reward lost");
                    }
                }
                true
            }
        };
        info!(
            target = %target,
            debt = rules.escort_debt,
            cleared_fines = settlement.cleared_debt,
            reporters = settlement.reporters.len(),
            share,
            "Escort executed"
        );
        if paid_reporters {
            let name = self.name(target);
            for reporter in &settlement.reporters {
                self.say(
                    *reporter,
                    format!("Your report against {name} has been resolved. You receive {share} ash."),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;

    use ballast_events::EventBus;
    use ballast_players::{EnforcementError, EscalationCause};
    use ballast_types::{Item, ItemCategory, ItemFlags, Standing, WeightClass};
    use ballast_world::CatalogGenerator;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::ZoneConfig;
    use crate::topology::StaticTopology;

    fn zone() -> (Zone, Arc<StaticTopology>) {
        let topology = Arc::new(StaticTopology::new("Temple", "Hub"));
        let zone = Zone::new(
            ZoneConfig::default(),
            topology.clone(),
            Arc::new(CatalogGenerator::new()),
            Arc::new(EventBus::default()),
        );
        (zone, topology)
    }

    async fn load(zone: &Zone, player: PlayerId, count: usize) {
        for _ in 0..count {
            let item = Item {
                id: ItemId::new(),
                name: String::from("a brass talisman"),
                description: String::from("A talisman."),
                category: ItemCategory::Talisman,
                weight_class: WeightClass::Regular,
                flags: ItemFlags::default(),
                material: None,
                provenance: None,
            };
            zone.spawn(item, Owner::Player(player)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn light_targets_cannot_be_reported() {
        let (zone, _) = zone();
        let (reporter, target) = (PlayerId::new(), PlayerId::new());
        load(&zone, target, 9).await;
        assert!(matches!(
            zone.report(reporter, target).await,
            Err(ZoneError::Enforcement {
                source: EnforcementError::NotHoarding { .. }
            })
        ));
        assert!(matches!(
            zone.report(target, target).await,
            Err(ZoneError::Enforcement {
                source: EnforcementError::SelfReport { .. }
            })
        ));
        assert_eq!(zone.standing(target).await, Standing::Clean);
    }

    #[tokio::test]
    async fn fines_go_to_the_pool_even_when_unpaid() {
        let (zone, _) = zone();
        let (reporter, target) = (PlayerId::new(), PlayerId::new());
        load(&zone, target, 12).await;
        zone.grant(target, 5).await.unwrap();
        let pool_start = zone.pool_balance().await;

        let first = zone.report(reporter, target).await.unwrap();
        assert!(matches!(first, Verdict::Fined { strike: 1, amount: 5, .. }));
        assert_eq!(zone.wallet(target).await, 0);

        let second = zone.report(reporter, target).await.unwrap();
        assert!(matches!(
            second,
            Verdict::Fined {
                strike: 2,
                amount: 15,
                investigation: true
            }
        ));
        assert_eq!(zone.pool_balance().await, pool_start + 20);
        let card = zone.score(target).await;
        assert_eq!(card.statement.outstanding_debt, 15);
        assert_eq!(card.statement.standing, Standing::Offenses(2));
        assert_eq!(card.fine_history.len(), 2);
        assert!(card.under_investigation);
    }

    #[tokio::test]
    async fn major_hoarding_escalates_and_schedules_the_countdown() {
        let (zone, _) = zone();
        let (reporter, target) = (PlayerId::new(), PlayerId::new());
        load(&zone, target, 20).await;
        let verdict = zone.report(reporter, target).await.unwrap();
        assert!(matches!(
            verdict,
            Verdict::Escalated {
                cause: EscalationCause::MajorHoarding
            }
        ));
        assert_eq!(zone.standing(target).await, Standing::UnderInvestigation);
        assert!(zone.scheduler.lock().await.is_scheduled(&TimedPayload::EnforcementStep {
            target,
            phase: EscortPhase::Investigation,
        }));
        assert!(matches!(
            zone.report(PlayerId::new(), target).await,
            Ok(Verdict::Deferred)
        ));
    }

    #[tokio::test]
    async fn stale_steps_are_rejected_after_reset() {
        let (zone, topology) = zone();
        let (reporter, target) = (PlayerId::new(), PlayerId::new());
        topology.join(target, "Hoarder", topology.place(Place::Hub));
        load(&zone, target, 20).await;
        zone.report(reporter, target).await.unwrap();

        for _ in 0..5 {
            zone.enforcement_step(target, EscortPhase::Investigation)
                .await
                .unwrap();
        }
        for phase in [EscortPhase::Announce, EscortPhase::Move, EscortPhase::Seize] {
            zone.enforcement_step(target, phase).await.unwrap();
        }
        assert_eq!(zone.owner_total(target).await, Decimal::ZERO);
        assert_eq!(zone.global_total().await, Decimal::from(20));

        zone.admin_reset(target).await.unwrap();
        assert_eq!(zone.owner_total(target).await, Decimal::from(20));
        assert!(matches!(
            zone.enforcement_step(target, EscortPhase::Escort).await,
            Err(ZoneError::Enforcement {
                source: EnforcementError::NotInFlight { .. }
            })
        ));
        assert!(!zone.scheduler.lock().await.is_scheduled(&TimedPayload::EnforcementStep {
            target,
            phase: EscortPhase::Escort,
        }));
        assert_eq!(zone.standing(target).await, Standing::AtRisk);
    }
}
