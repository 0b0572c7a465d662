//! The `Zone` aggregate: every shared structure of the economy behind its
//! own lock, plus the queries and notification plumbing the actions share.
//!
//! Player actions live in [`actions`](crate::actions),
//! [`market`](crate::market) and [`compliance`](crate::compliance); timed
//! handlers in [`timed`](crate::timed). They all follow one discipline.
//!
//! # Lock order
//!
//! A multi-aggregate operation acquires locks in this order, skipping the
//! ones it does not need:
//!
//! ```text
//! enforcement record -> gifts -> shelves -> ledger -> pool -> wallets -> shops
//! ```
//!
//! The record map, the monitor, the scheduler and the random source are
//! leaves: they are taken last and never held while waiting on another
//! lock. Escort side effects run with the enforcement record released.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard, broadcast};
use tracing::{debug, info, warn};

use ballast_events::{Envelope, EventBus, ZoneEvent};
use ballast_ledger::{
    AuditResult, FeedstockPool, LedgerError, Wallets, WeightChange, WeightEvent, WeightLedger,
};
use ballast_players::{GiftBook, enforcement};
use ballast_types::{
    AshStatement, EnforcementRecord, FineEntry, Holding, Item, ItemId, Owner, PlayerId, RoomId,
    ShelfId, ShopId, ShopKind, Standing, TimedPayload, ZoneStatus,
};
use ballast_world::{DisplayShelf, Incinerator, ItemGenerator, Itemator, Shop, Workbench};

use crate::config::ZoneConfig;
use crate::error::ZoneError;
use crate::monitor::CapacityMonitor;
use crate::scheduler::Scheduler;
use crate::topology::Topology;

/// Everything `score` shows about a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorecard {
    /// Balances and standing.
    pub statement: AshStatement,
    /// Every fine on record, oldest first.
    pub fine_history: Vec<FineEntry>,
    /// Completed escorts.
    pub escorts_completed: u32,
    /// Formal investigation flag from a second strike.
    pub under_investigation: bool,
}

/// The zone economy and compliance engine.
pub struct Zone {
    pub(crate) config: ZoneConfig,
    pub(crate) gifts: Mutex<GiftBook>,
    pub(crate) shelves: Mutex<BTreeMap<ShelfId, DisplayShelf>>,
    pub(crate) ledger: Mutex<WeightLedger>,
    pub(crate) pool: Mutex<FeedstockPool>,
    pub(crate) wallets: Mutex<Wallets>,
    pub(crate) shops: Mutex<BTreeMap<ShopId, Shop>>,
    pub(crate) records: Mutex<HashMap<PlayerId, Arc<Mutex<EnforcementRecord>>>>,
    pub(crate) monitor: Mutex<CapacityMonitor>,
    pub(crate) scheduler: Mutex<Scheduler>,
    pub(crate) rng: Mutex<StdRng>,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) topology: Arc<dyn Topology>,
    pub(crate) catalog: Arc<dyn ItemGenerator>,
    pub(crate) itemator: Itemator,
    pub(crate) incinerator: Incinerator,
    pub(crate) workbench: Workbench,
}

impl Zone {
    /// Create an empty zone.
    pub fn new(
        config: ZoneConfig,
        topology: Arc<dyn Topology>,
        catalog: Arc<dyn ItemGenerator>,
        bus: Arc<EventBus>,
    ) -> Self {
        let rng = config
            .zone
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let pool = FeedstockPool::new(config.pool.start, config.pool.cap, config.pool.recharge);
        let monitor = CapacityMonitor::new(config.zone.item_limit, config.zone.thresholds);
        let itemator = Itemator::new(config.economy.itemator_cost);
        let incinerator = Incinerator::new(config.economy.burn);
        Self {
            config,
            gifts: Mutex::new(GiftBook::new()),
            shelves: Mutex::new(BTreeMap::new()),
            ledger: Mutex::new(WeightLedger::new()),
            pool: Mutex::new(pool),
            wallets: Mutex::new(Wallets::new()),
            shops: Mutex::new(BTreeMap::new()),
            records: Mutex::new(HashMap::new()),
            monitor: Mutex::new(monitor),
            scheduler: Mutex::new(Scheduler::new()),
            rng: Mutex::new(rng),
            bus,
            topology,
            catalog,
            itemator,
            incinerator,
            workbench: Workbench::new(),
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// The event bus notifications are published on.
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// Subscribe to zone notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.bus.subscribe()
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Install a claimable display shelf.
    pub async fn add_shelf(&self, room: RoomId, name: &str) -> ShelfId {
        let id = ShelfId::new();
        let shelf = DisplayShelf::new(id, room, name, self.config.economy.shelf_capacity);
        self.shelves.lock().await.insert(id, shelf);
        info!(shelf = %id, room = %room, name, "Display shelf installed");
        id
    }

    /// Install a shop counter. Its restock timer starts with [`start`](Self::start).
    pub async fn add_shop(&self, kind: ShopKind, room: RoomId) -> ShopId {
        let id = ShopId::new();
        let shop = Shop::new(id, kind, room, self.config.economy.max_listings);
        self.shops.lock().await.insert(id, shop);
        info!(shop = %id, room = %room, ?kind, "Shop installed");
        id
    }

    /// Arm the process-wide recurring actions: the capacity monitor and
    /// every shop's restock. Actions already pending (for example restored
    /// from a snapshot) are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Scheduler`] if a configured period is zero.
    pub async fn start(&self) -> Result<(), ZoneError> {
        let shop_ids: Vec<ShopId> = self.shops.lock().await.keys().copied().collect();
        let timers = self.config.timers;
        let mut scheduler = self.scheduler.lock().await;
        if !scheduler.is_scheduled(&TimedPayload::MonitorTick) {
            scheduler.schedule_recurring(timers.monitor_tick(), TimedPayload::MonitorTick)?;
        }
        for shop in shop_ids {
            let payload = TimedPayload::ShopRestock { shop };
            if !scheduler.is_scheduled(&payload) {
                scheduler.schedule_recurring(timers.restock(), payload)?;
            }
        }
        info!(pending = scheduler.len(), "Zone timers armed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Counter-sign view of capacity and the pool.
    pub async fn status(&self) -> ZoneStatus {
        let (global_total, tracked) = {
            let ledger = self.ledger.lock().await;
            (ledger.global_total(), ledger.tracked_count())
        };
        let pool = self.pool.lock().await.status();
        let monitor = self.monitor.lock().await;
        ZoneStatus {
            global_total,
            item_limit: monitor.limit(),
            danger_level: monitor.level(),
            ambience: monitor.level().ambience(),
            generation_enabled: monitor.generation_enabled(),
            tracked_items: u64::try_from(tracked).unwrap_or(u64::MAX),
            pool,
        }
    }

    /// The `ash` query.
    pub async fn ash(&self, player: PlayerId) -> AshStatement {
        let record = self.record(player).await;
        let owner_total = self.ledger.lock().await.owner_total(player);
        let pool = self.pool.lock().await.status();
        let wallet = self.wallets.lock().await.balance(player);
        AshStatement {
            player,
            wallet,
            pool,
            owner_total,
            strike_count: record.as_ref().map_or(0, |r| r.strike_count),
            outstanding_debt: record.as_ref().map_or(0, |r| r.outstanding_debt),
            standing: enforcement::standing(record.as_ref(), owner_total, &self.config.enforcement),
        }
    }

    /// The `score` query: the `ash` statement plus the enforcement history.
    pub async fn score(&self, player: PlayerId) -> Scorecard {
        let statement = self.ash(player).await;
        let record = self.record(player).await;
        Scorecard {
            statement,
            fine_history: record
                .as_ref()
                .map(|r| r.fine_history.clone())
                .unwrap_or_default(),
            escorts_completed: record.as_ref().map_or(0, |r| r.escorts_completed),
            under_investigation: record.as_ref().is_some_and(|r| r.under_investigation),
        }
    }

    /// Public standing of a player.
    pub async fn standing(&self, player: PlayerId) -> Standing {
        self.ash(player).await.standing
    }

    /// A copy of a player's enforcement record, if one exists.
    pub async fn record(&self, player: PlayerId) -> Option<EnforcementRecord> {
        let handle = self.records.lock().await.get(&player).cloned()?;
        let record = handle.lock().await.clone();
        Some(record)
    }

    /// Everything attributed to a player: carried or on a claimed shelf.
    pub async fn possessions(&self, player: PlayerId) -> Vec<Holding> {
        self.ledger.lock().await.possessions_of(player)
    }

    /// Look up a tracked item.
    pub async fn item(&self, item: ItemId) -> Option<Holding> {
        let ledger = self.ledger.lock().await;
        let owner = ledger.owner_of(item)?;
        ledger.item(item).map(|found| Holding {
            item: found.clone(),
            owner,
        })
    }

    /// Weighted total attributed to a player.
    pub async fn owner_total(&self, player: PlayerId) -> Decimal {
        self.ledger.lock().await.owner_total(player)
    }

    /// Weighted total of every tracked item.
    pub async fn global_total(&self) -> Decimal {
        self.ledger.lock().await.global_total()
    }

    /// A player's personal balance.
    pub async fn wallet(&self, player: PlayerId) -> i64 {
        self.wallets.lock().await.balance(player)
    }

    /// Current pool balance.
    pub async fn pool_balance(&self) -> u64 {
        self.pool.lock().await.balance()
    }

    /// Every display shelf.
    pub async fn shelves(&self) -> Vec<DisplayShelf> {
        self.shelves.lock().await.values().cloned().collect()
    }

    /// Every shop counter.
    pub async fn shops(&self) -> Vec<Shop> {
        self.shops.lock().await.values().cloned().collect()
    }

    /// Recompute ledger totals from scratch.
    pub async fn audit(&self) -> AuditResult {
        self.ledger.lock().await.audit()
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Credit a player's wallet out of the pool, e.g. a starting allowance.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Pool`] if the pool cannot cover the grant.
    pub async fn grant(&self, player: PlayerId, amount: u64) -> Result<i64, ZoneError> {
        let mut pool = self.pool.lock().await;
        let mut wallets = self.wallets.lock().await;
        pool.debit(amount)?;
        match wallets.deposit(player, amount) {
            Ok(balance) => {
                info!(player = %player, amount, balance, "Ash granted");
                Ok(balance)
            }
            Err(source) => {
                pool.credit(amount);
                Err(source.into())
            }
        }
    }

    /// Put a new item straight into a holder's hands, bypassing fixtures.
    /// Used by world seeding and administration.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Ledger`] if the id is already tracked.
    pub async fn spawn(&self, item: Item, owner: Owner) -> Result<ItemId, ZoneError> {
        let id = item.id;
        let fanout = {
            let mut ledger = self.ledger.lock().await;
            let change = ledger.apply(WeightEvent::Create {
                item: Box::new(item),
                owner,
            })?;
            self.fanout(&ledger, vec![change])
        };
        self.notify(fanout).await;
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    pub(crate) async fn record_handle(&self, player: PlayerId) -> Arc<Mutex<EnforcementRecord>> {
        let mut records = self.records.lock().await;
        Arc::clone(
            records
                .entry(player)
                .or_insert_with(|| Arc::new(Mutex::new(EnforcementRecord::new(player)))),
        )
    }

    pub(crate) async fn require_generation(&self) -> Result<(), ZoneError> {
        if self.monitor.lock().await.generation_enabled() {
            Ok(())
        } else {
            debug!("Generation request refused while sinking");
            Err(ZoneError::GenerationDisabled)
        }
    }

    pub(crate) fn name(&self, player: PlayerId) -> String {
        self.topology.display_name(player)
    }

    pub(crate) fn say(&self, player: PlayerId, text: impl Into<String>) {
        self.bus.publish(ZoneEvent::player(player, text));
    }

    pub(crate) fn announce(&self, text: impl Into<String>) {
        self.bus.publish(ZoneEvent::world(text));
    }

    pub(crate) fn say_in_room_of(&self, player: PlayerId, text: impl Into<String>) {
        if let Some(room) = self.topology.room_of(player) {
            self.bus.publish(ZoneEvent::room(room, text));
        }
    }

    /// Cancel every pending action carrying `payload`.
    pub(crate) async fn cancel_timer(&self, payload: TimedPayload) -> bool {
        let mut scheduler = self.scheduler.lock().await;
        let mut cancelled = false;
        while let Some(token) = scheduler.find(&payload) {
            cancelled |= scheduler.cancel(token);
        }
        cancelled
    }

    /// Collect what the fixed subscribers owe for a committed batch.
    pub(crate) fn fanout(&self, ledger: &WeightLedger, changes: Vec<WeightChange>) -> Fanout {
        let mut net: BTreeMap<PlayerId, Decimal> = BTreeMap::new();
        let mut cursed = BTreeSet::new();
        for change in &changes {
            if let Some(player) = change.player_after {
                let entry = net.entry(player).or_insert(Decimal::ZERO);
                *entry = entry.checked_add(change.weight_after).unwrap_or(*entry);
            }
            if let Some(player) = change.player_before {
                let entry = net.entry(player).or_insert(Decimal::ZERO);
                *entry = entry.checked_sub(change.weight_before).unwrap_or(*entry);
            }
            if let (true, Some(Owner::Player(player))) = (change.cursed, change.after) {
                cursed.insert(player);
            }
        }
        let at_risk = net
            .into_iter()
            .filter(|(_, delta)| *delta > Decimal::ZERO)
            .filter(|(player, delta)| {
                let after = ledger.owner_total(*player);
                let before = after.checked_sub(*delta).unwrap_or(after);
                self.crossed(before, after)
            })
            .map(|(player, _)| player)
            .collect();
        Fanout {
            changes,
            cursed,
            at_risk,
        }
    }

    /// Deliver a fanout: item notifications, curse ticks, hoarding hints.
    pub(crate) async fn notify(&self, fanout: Fanout) {
        for change in &fanout.changes {
            self.bus.publish(ZoneEvent::ItemChanged {
                item: change.item,
                category: change.category,
                before: change.before,
                after: change.after,
                delta: change.delta(),
            });
        }
        if !fanout.cursed.is_empty() {
            let period = self.config.timers.curse_tick();
            let mut scheduler = self.scheduler.lock().await;
            for player in fanout.cursed {
                let payload = TimedPayload::CurseTick { player };
                if scheduler.is_scheduled(&payload) {
                    continue;
                }
                match scheduler.schedule_recurring(period, payload) {
                    Ok(_) => info!(player = %player, "Curse tick started"),
                    Err(error) => warn!(player = %player, %error, "Could not start curse tick"),
                }
            }
        }
        for player in fanout.at_risk {
            self.hoarding_hint(player);
        }
    }

    /// Warn a player whose attributed total just became reportable.
    pub(crate) fn hoarding_hint(&self, player: PlayerId) {
        debug!(player = %player, "Player crossed the hoarding threshold");
        self.say(
            player,
            format!(
                "Your pack feels heavy. Anyone could report you for hoarding now -- \
                 consider a trip to the {}.",
                self.config.zone.disposal
            ),
        );
    }

    /// Whether a move from `before` to `after` crosses the minor threshold upward.
    pub(crate) fn crossed(&self, before: Decimal, after: Decimal) -> bool {
        let threshold = self.config.enforcement.minor_threshold;
        before < threshold && after >= threshold
    }

    pub(crate) async fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().await
    }
}

/// Side effects owed to the fixed subscribers after a committed batch.
#[derive(Debug, Default)]
pub(crate) struct Fanout {
    changes: Vec<WeightChange>,
    cursed: BTreeSet<PlayerId>,
    at_risk: Vec<PlayerId>,
}

/// The item a player carries directly, or why not.
pub(crate) fn carried<'a>(
    ledger: &'a WeightLedger,
    player: PlayerId,
    item: ItemId,
) -> Result<&'a Item, ZoneError> {
    match (ledger.owner_of(item), ledger.item(item)) {
        (Some(Owner::Player(holder)), Some(found)) if holder == player => Ok(found),
        (None, _) | (_, None) => {
            warn!(player = %player, item = %item, "Action on untracked item");
            Err(LedgerError::NotTracked { item }.into())
        }
        _ => Err(ZoneError::NotHeld { player, item }),
    }
}

/// Refuse items promised in a pending gift.
pub(crate) fn not_pending(gifts: &GiftBook, item: ItemId) -> Result<(), ZoneError> {
    if gifts.is_pending(item) {
        Err(ZoneError::GiftPending { item })
    } else {
        Ok(())
    }
}

/// Return a charge that could not be completed.
pub(crate) fn refund(wallets: &mut Wallets, player: PlayerId, amount: u64) {
    if let Err(error) = wallets.deposit(player, amount) {
        warn!(player = %player, amount, %error, "Refund failed");
    }
}
