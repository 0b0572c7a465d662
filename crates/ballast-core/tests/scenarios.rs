//! End-to-end zone scenarios driven on a paused tokio clock.
//!
//! Each test builds a fresh [`Zone`] over a [`StaticTopology`], performs
//! player actions, then advances time and fires due actions the way the
//! runner would.

#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

use std::sync::Arc;
use std::time::Duration;

use ballast_core::config::ZoneConfig;
use ballast_core::error::ZoneError;
use ballast_core::topology::{Place, StaticTopology, Topology};
use ballast_core::zone::Zone;
use ballast_events::{Audience, EventBus, ZoneEvent, drain};
use ballast_ledger::AuditResult;
use ballast_players::{EscalationCause, Verdict};
use ballast_types::{
    DangerLevel, EscortPhase, Item, ItemCategory, ItemFlags, ItemId, Owner, PlayerId, Standing,
    Station, WeightClass,
};
use ballast_world::CatalogGenerator;
use rust_decimal::Decimal;
use tokio::time::Instant;

fn zone_with(config: ZoneConfig) -> (Zone, Arc<StaticTopology>) {
    let topology = Arc::new(StaticTopology::new("KonMarie Temple", "Welcome area"));
    let zone = Zone::new(
        config,
        topology.clone(),
        Arc::new(CatalogGenerator::new()),
        Arc::new(EventBus::default()),
    );
    (zone, topology)
}

fn trinket() -> Item {
    Item {
        id: ItemId::new(),
        name: String::from("a brass trinket"),
        description: String::from("Shiny, mostly."),
        category: ItemCategory::Talisman,
        weight_class: WeightClass::Regular,
        flags: ItemFlags::default(),
        material: None,
        provenance: None,
    }
}

async fn fill(zone: &Zone, owner: Owner, count: usize) {
    for _ in 0..count {
        zone.spawn(trinket(), owner).await.unwrap();
    }
}

/// Advance the paused clock in `step` increments, firing due actions.
async fn run_for(zone: &Zone, total: Duration, step: Duration) {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        tokio::time::advance(step).await;
        zone.fire_due(Instant::now()).await;
        elapsed += step;
    }
}

fn world_messages(events: &[ZoneEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            ZoneEvent::Message {
                audience: Audience::World,
                text,
            } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Capacity
// =============================================================================

#[tokio::test(start_paused = true)]
async fn crossing_into_warning_broadcasts_exactly_once() {
    let (zone, topology) = zone_with(ZoneConfig::default());
    let room = topology.place(Place::Hub);
    zone.start().await.unwrap();
    let mut rx = zone.subscribe();

    fill(&zone, Owner::Room(room), 749).await;
    run_for(&zone, Duration::from_secs(180), Duration::from_secs(180)).await;
    assert_eq!(zone.status().await.danger_level, DangerLevel::Safe);
    assert!(world_messages(&drain(&mut rx)).is_empty());

    fill(&zone, Owner::Room(room), 1).await;
    run_for(&zone, Duration::from_secs(180), Duration::from_secs(180)).await;
    let events = drain(&mut rx);
    assert_eq!(zone.status().await.danger_level, DangerLevel::Warning);
    assert_eq!(world_messages(&events).len(), 1);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, ZoneEvent::DangerLevelChanged { .. }))
            .count(),
        1
    );

    run_for(&zone, Duration::from_secs(180), Duration::from_secs(180)).await;
    assert!(world_messages(&drain(&mut rx)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn sinking_gate_reopens_after_burning() {
    let mut config = ZoneConfig::default();
    config.zone.item_limit = 10;
    let (zone, topology) = zone_with(config);
    let player = PlayerId::new();
    topology.join(player, "Ada", topology.place(Place::Hub));
    zone.start().await.unwrap();

    fill(&zone, Owner::Player(player), 10).await;
    run_for(&zone, Duration::from_secs(180), Duration::from_secs(180)).await;
    assert!(!zone.status().await.generation_enabled);
    assert!(matches!(
        zone.use_itemator(player).await,
        Err(ZoneError::GenerationDisabled)
    ));

    let first = zone.possessions(player).await.first().unwrap().item.id;
    let reward = zone.burn(player, first).await.unwrap();
    assert!(reward > 0);
    run_for(&zone, Duration::from_secs(180), Duration::from_secs(180)).await;
    let status = zone.status().await;
    assert_eq!(status.danger_level, DangerLevel::Critical);
    assert!(status.generation_enabled);
    zone.use_itemator(player).await.unwrap();
}

#[tokio::test]
async fn fines_into_a_nearly_full_pool_clamp_at_the_cap() {
    let mut config = ZoneConfig::default();
    config.pool.start = 1995;
    let (zone, _) = zone_with(config);
    let (reporter, target) = (PlayerId::new(), PlayerId::new());
    fill(&zone, Owner::Player(target), 12).await;

    zone.report(reporter, target).await.unwrap();
    assert_eq!(zone.pool_balance().await, 2000);
    zone.report(reporter, target).await.unwrap();
    assert_eq!(zone.pool_balance().await, 2000);
    assert_eq!(zone.record(target).await.unwrap().outstanding_debt, 20);
}

// =============================================================================
// Enforcement
// =============================================================================

#[tokio::test(start_paused = true)]
async fn major_hoarder_is_escorted_and_starts_over() {
    let (zone, topology) = zone_with(ZoneConfig::default());
    let (reporter, target) = (PlayerId::new(), PlayerId::new());
    let hub = topology.place(Place::Hub);
    topology.join(reporter, "Mo", hub);
    topology.join(target, "Hoarder", topology.add_room("Attic"));
    fill(&zone, Owner::Player(target), 22).await;
    let pool_start = zone.pool_balance().await;
    let mut rx = zone.subscribe();

    let verdict = zone.report(reporter, target).await.unwrap();
    assert!(matches!(
        verdict,
        Verdict::Escalated {
            cause: EscalationCause::MajorHoarding
        }
    ));
    assert_eq!(zone.standing(target).await, Standing::UnderInvestigation);

    run_for(&zone, Duration::from_secs(300), Duration::from_secs(10)).await;
    assert_eq!(zone.owner_total(target).await, Decimal::from(22));

    run_for(&zone, Duration::from_secs(100), Duration::from_secs(10)).await;
    let events = drain(&mut rx);
    let phases: Vec<EscortPhase> = events
        .iter()
        .filter_map(|e| match e {
            ZoneEvent::Escort { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            EscortPhase::Investigation,
            EscortPhase::Investigation,
            EscortPhase::Investigation,
            EscortPhase::Investigation,
            EscortPhase::Investigation,
            EscortPhase::Announce,
            EscortPhase::Move,
            EscortPhase::Seize,
            EscortPhase::Escort,
            EscortPhase::Execute,
            EscortPhase::Cleanup,
        ]
    );

    assert_eq!(zone.global_total().await, Decimal::ZERO);
    assert_eq!(zone.wallet(target).await, -50);
    assert_eq!(zone.wallet(reporter).await, 25);
    assert_eq!(zone.pool_balance().await, pool_start - 25);
    assert_eq!(topology.room_of(target), Some(hub));

    let record = zone.record(target).await.unwrap();
    assert_eq!(record.strike_count, 0);
    assert_eq!(record.escorts_completed, 1);
    assert!(!record.is_in_flight());
    assert_eq!(zone.standing(target).await, Standing::Clean);
    assert_eq!(zone.pending_actions().await, 0);
}

#[tokio::test(start_paused = true)]
async fn escort_confiscates_shelved_items_and_pending_gifts() {
    let (zone, topology) = zone_with(ZoneConfig::default());
    let (reporter, target, friend) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
    let hub = topology.place(Place::Hub);
    topology.join(target, "Hoarder", hub);
    topology.join(friend, "Friend", hub);
    let shelf = zone.add_shelf(hub, "mantel").await;
    zone.claim(target, shelf).await.unwrap();
    fill(&zone, Owner::Player(target), 21).await;
    let shown = zone.possessions(target).await.first().unwrap().item.id;
    zone.display(target, shown, shelf).await.unwrap();

    zone.report(reporter, target).await.unwrap();
    run_for(&zone, Duration::from_secs(300), Duration::from_secs(60)).await;

    let offered = zone
        .possessions(target)
        .await
        .into_iter()
        .find(|h| h.owner == Owner::Player(target))
        .unwrap()
        .item
        .id;
    zone.gift(target, offered, friend).await.unwrap();

    run_for(&zone, Duration::from_secs(60), Duration::from_secs(10)).await;
    assert_eq!(zone.global_total().await, Decimal::ZERO);
    assert_eq!(zone.owner_total(friend).await, Decimal::ZERO);
    assert!(zone.shelves().await.iter().all(|s| !s.holds(shown)));
    assert!(matches!(zone.accept(friend).await, Err(ZoneError::Gift { .. })));
}

#[tokio::test(start_paused = true)]
async fn reports_during_an_escort_are_replayed_afterwards() {
    let (zone, topology) = zone_with(ZoneConfig::default());
    let (first, second, target) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
    topology.join(target, "Hoarder", topology.place(Place::Hub));
    fill(&zone, Owner::Player(target), 20).await;

    zone.report(first, target).await.unwrap();
    let mut rx = zone.subscribe();
    assert!(matches!(
        zone.report(second, target).await.unwrap(),
        Verdict::Deferred
    ));
    let events = drain(&mut rx);
    let reply = events.iter().find_map(|event| match event {
        ZoneEvent::Message {
            audience: Audience::Player(player),
            text,
        } if *player == second => Some(text.as_str()),
        _ => None,
    });
    assert!(reply.is_some_and(|text| text.contains("queued")));
    // Refill before the deferred report is replayed.
    run_for(&zone, Duration::from_secs(350), Duration::from_secs(10)).await;
    fill(&zone, Owner::Player(target), 12).await;
    run_for(&zone, Duration::from_secs(10), Duration::from_secs(10)).await;

    let record = zone.record(target).await.unwrap();
    assert_eq!(record.escorts_completed, 1);
    assert_eq!(record.strike_count, 1);
    assert_eq!(zone.standing(target).await, Standing::Offenses(1));
}

// =============================================================================
// Gifts and crafting
// =============================================================================

#[tokio::test(start_paused = true)]
async fn unanswered_gift_transfers_exactly_once() {
    let (zone, topology) = zone_with(ZoneConfig::default());
    let (giver, recipient) = (PlayerId::new(), PlayerId::new());
    topology.join(giver, "Ada", topology.place(Place::Hub));
    topology.join(recipient, "Mo", topology.place(Place::Hub));
    let item = zone.spawn(trinket(), Owner::Player(giver)).await.unwrap();
    let mut rx = zone.subscribe();

    zone.gift(giver, item, recipient).await.unwrap();
    run_for(&zone, Duration::from_secs(300), Duration::from_secs(30)).await;

    let resolved = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, ZoneEvent::GiftResolved { accepted: true, .. }))
        .count();
    assert_eq!(resolved, 1);
    assert_eq!(zone.item(item).await.unwrap().owner, Owner::Player(recipient));
}

#[tokio::test]
async fn masterpiece_announcement_names_the_room_not_the_crafter() {
    let mut config = ZoneConfig::default();
    config.zone.seed = Some(7);
    let (zone, topology) = zone_with(config);
    let crafter = PlayerId::new();
    let studio = topology.add_room("Glass studio");
    topology.join(crafter, "Secretive Sam", studio);
    zone.grant(crafter, 200).await.unwrap();
    let mut rx = zone.subscribe();

    let mut made = 0_u32;
    for _ in 0..40 {
        let a = zone.dispense(crafter, Station::Glazier, "crystal rod").await.unwrap();
        let b = zone.dispense(crafter, Station::Glazier, "crystal rod").await.unwrap();
        if zone.combine(crafter, a.id, b.id).await.unwrap().flags.masterpiece {
            made += 1;
        }
    }
    assert!(made > 0);

    let events = drain(&mut rx);
    let announcements: Vec<&str> = world_messages(&events)
        .into_iter()
        .filter(|text| text.contains("masterpiece"))
        .collect();
    assert_eq!(announcements.len(), usize::try_from(made).unwrap());
    for text in announcements {
        assert!(text.contains("Glass studio"));
        assert!(!text.contains("Secretive Sam"));
    }
    assert!(events.iter().any(|e| matches!(
        e,
        ZoneEvent::Masterpiece { room: Some(room), .. } if *room == studio
    )));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_actions_keep_weight_and_ash_consistent() {
    let (zone, topology) = zone_with(ZoneConfig::default());
    let zone = Arc::new(zone);
    let hub = topology.place(Place::Hub);
    let start = zone.pool_balance().await;
    let mut everyone = Vec::new();
    let mut tasks = Vec::new();

    // Burners: 16 players feeding 4 trinkets each (1 ash per burn, paid to
    // both the pool and the burner).
    for n in 0..16 {
        let burner = PlayerId::new();
        topology.join(burner, &format!("Burner{n}"), hub);
        everyone.push(burner);
        let mut items = Vec::new();
        for _ in 0..4 {
            items.push(zone.spawn(trinket(), Owner::Player(burner)).await.unwrap());
        }
        let zone = Arc::clone(&zone);
        tasks.push(tokio::spawn(async move {
            for item in items {
                zone.burn(burner, item).await.unwrap();
            }
        }));
    }

    // Gifts: 8 giver/recipient pairs, answered straight away.
    let mut recipients = Vec::new();
    for n in 0..8 {
        let (giver, recipient) = (PlayerId::new(), PlayerId::new());
        topology.join(giver, &format!("Giver{n}"), hub);
        topology.join(recipient, &format!("Friend{n}"), hub);
        everyone.extend([giver, recipient]);
        recipients.push(recipient);
        let item = zone.spawn(trinket(), Owner::Player(giver)).await.unwrap();
        let zone = Arc::clone(&zone);
        tasks.push(tokio::spawn(async move {
            zone.gift(giver, item, recipient).await.unwrap();
            zone.accept(recipient).await.unwrap();
        }));
    }

    // Collectors: 4 players claiming a shelf each and showing 2 items.
    for n in 0..4 {
        let collector = PlayerId::new();
        topology.join(collector, &format!("Collector{n}"), hub);
        everyone.push(collector);
        let shelf = zone.add_shelf(hub, &format!("shelf {n}")).await;
        let first = zone.spawn(trinket(), Owner::Player(collector)).await.unwrap();
        let second = zone.spawn(trinket(), Owner::Player(collector)).await.unwrap();
        let zone = Arc::clone(&zone);
        tasks.push(tokio::spawn(async move {
            zone.claim(collector, shelf).await.unwrap();
            zone.display(collector, first, shelf).await.unwrap();
            zone.display(collector, second, shelf).await.unwrap();
        }));
    }

    // Hoarders: 4 players with 12 trinkets and 10 ash, each reported once.
    let mut hoarders = Vec::new();
    for n in 0..4 {
        let (hoarder, reporter) = (PlayerId::new(), PlayerId::new());
        topology.join(hoarder, &format!("Hoarder{n}"), hub);
        topology.join(reporter, &format!("Reporter{n}"), hub);
        everyone.extend([hoarder, reporter]);
        hoarders.push(hoarder);
        zone.grant(hoarder, 10).await.unwrap();
        fill(&zone, Owner::Player(hoarder), 12).await;
        let zone = Arc::clone(&zone);
        tasks.push(tokio::spawn(async move {
            let verdict = zone.report(reporter, hoarder).await.unwrap();
            assert!(matches!(verdict, Verdict::Fined { strike: 1, .. }));
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(zone.audit().await, AuditResult::Consistent);
    // 8 gifted + 8 displayed at half weight + 48 hoarded.
    assert_eq!(zone.global_total().await, Decimal::from(60));
    for recipient in recipients {
        assert_eq!(zone.owner_total(recipient).await, Decimal::ONE);
    }
    for hoarder in hoarders {
        assert_eq!(zone.wallet(hoarder).await, 5);
        assert_eq!(zone.record(hoarder).await.unwrap().strike_count, 1);
    }

    let pool = zone.pool_balance().await;
    assert!(pool <= ZoneConfig::default().pool.cap);
    let mut wallets: i64 = 0;
    for player in everyone {
        wallets += zone.wallet(player).await;
    }
    // Grants and fines move ash; each of the 64 burns mints it twice.
    let expected = i64::try_from(start).unwrap() + 2 * 64;
    assert_eq!(i64::try_from(pool).unwrap() + wallets, expected);
    // +64 burned, -40 granted, +20 in fines.
    assert_eq!(pool, start + 44);
}
