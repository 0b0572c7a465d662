//! The weight ledger: incremental aggregation of platform capacity.
//!
//! [`WeightLedger`] tracks every item that occupies capacity together with
//! its current holder, and maintains three running totals:
//!
//! - the global total across every tracked item,
//! - a per-holder total (player, shelf, room or shop counter),
//! - a per-player attributed total: items the player carries plus items on
//!   shelves the player has claimed.
//!
//! # Design
//!
//! - **Event-driven**: all mutation goes through [`WeightEvent`]s applied by
//!   [`WeightLedger::apply_all`]. A batch is validated against a staging
//!   overlay first and committed only if every event is valid, so a
//!   multi-step action (destroy, destroy, create) never half-applies.
//! - **Signed deltas**: each event subtracts the item's effective weight as
//!   it was before and adds it as it is after, so flag changes and transfers
//!   share one code path.
//! - **Precision**: weights are [`Decimal`]; 0.33, 0.5 and 0.25 sum exactly.
//! - **Reads** of the global and attributed totals are single map lookups.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::warn;

use ballast_types::{
    Holding, Item, ItemCategory, ItemFlag, ItemId, Owner, PlayerId, ShelfId,
};

use crate::LedgerError;
use crate::audit::{AuditResult, audit_totals};

// ---------------------------------------------------------------------------
// Events and notifications
// ---------------------------------------------------------------------------

/// A mutation of the tracked item graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightEvent {
    /// Start tracking a newly created item.
    Create {
        /// The new item.
        item: Box<Item>,
        /// Its first holder.
        owner: Owner,
    },
    /// Stop tracking an item (incinerated, eaten, seized, expired).
    Destroy {
        /// The item to remove.
        item: ItemId,
    },
    /// Move an item between holders.
    Transfer {
        /// The item to move.
        item: ItemId,
        /// Expected current holder.
        from: Owner,
        /// New holder.
        to: Owner,
    },
    /// Change one flag on an item.
    SetFlag {
        /// The item to update.
        item: ItemId,
        /// Which flag.
        flag: ItemFlag,
        /// New value.
        value: bool,
    },
}

/// Notification produced for every applied [`WeightEvent`].
///
/// Subscribers (curse effects, enforcement warnings, the event bus) use the
/// before/after attribution to react without re-reading the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightChange {
    /// The affected item.
    pub item: ItemId,
    /// Its category.
    pub category: ItemCategory,
    /// Whether the item is cursed after the event.
    pub cursed: bool,
    /// Holder before the event (`None` for a create).
    pub before: Option<Owner>,
    /// Holder after the event (`None` for a destroy).
    pub after: Option<Owner>,
    /// Player the item counted toward before the event.
    pub player_before: Option<PlayerId>,
    /// Player the item counts toward after the event.
    pub player_after: Option<PlayerId>,
    /// Effective weight before the event.
    pub weight_before: Decimal,
    /// Effective weight after the event.
    pub weight_after: Decimal,
}

impl WeightChange {
    /// Signed change in global weight caused by the event.
    pub fn delta(&self) -> Decimal {
        self.weight_after
            .checked_sub(self.weight_before)
            .unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

/// One planned holding replacement: `before` becomes `after`.
struct Step {
    id: ItemId,
    before: Option<Holding>,
    after: Option<Holding>,
}

/// Running totals touched by a batch, seeded lazily from the ledger.
struct Tally {
    global: Decimal,
    holders: HashMap<Owner, Decimal>,
    players: HashMap<PlayerId, Decimal>,
}

impl Tally {
    fn new(global: Decimal) -> Self {
        Self {
            global,
            holders: HashMap::new(),
            players: HashMap::new(),
        }
    }

    fn shift(
        &mut self,
        ledger: &WeightLedger,
        owner: Owner,
        weight: Decimal,
        add: bool,
    ) -> Result<(), LedgerError> {
        let step = |total: Decimal| {
            if add {
                total.checked_add(weight)
            } else {
                total.checked_sub(weight)
            }
        };

        self.global = step(self.global).ok_or(LedgerError::Overflow {
            context: "global weight total",
        })?;

        let holder = self
            .holders
            .entry(owner)
            .or_insert_with(|| ledger.holder_total(owner));
        *holder = step(*holder).ok_or(LedgerError::Overflow {
            context: "holder weight total",
        })?;

        if let Some(player) = ledger.attributed_player(owner) {
            let total = self
                .players
                .entry(player)
                .or_insert_with(|| ledger.owner_total(player));
            *total = step(*total).ok_or(LedgerError::Overflow {
                context: "player weight total",
            })?;
        }
        Ok(())
    }

    fn check_non_negative(&self) -> Result<(), LedgerError> {
        if self.global < Decimal::ZERO {
            return Err(LedgerError::NegativeTotal {
                scope: String::from("global"),
                total: self.global,
            });
        }
        for (owner, total) in &self.holders {
            if *total < Decimal::ZERO {
                return Err(LedgerError::NegativeTotal {
                    scope: owner.to_string(),
                    total: *total,
                });
            }
        }
        for (player, total) in &self.players {
            if *total < Decimal::ZERO {
                return Err(LedgerError::NegativeTotal {
                    scope: format!("attributed:{player}"),
                    total: *total,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WeightLedger
// ---------------------------------------------------------------------------

/// Incrementally maintained weighted count of every tracked item.
#[derive(Debug, Default, Clone)]
pub struct WeightLedger {
    /// Every tracked item and its holder.
    holdings: BTreeMap<ItemId, Holding>,
    /// Which player claims each shelf.
    shelf_claims: BTreeMap<ShelfId, PlayerId>,
    /// Sum of all effective weights.
    global: Decimal,
    /// Per-holder direct totals.
    holders: HashMap<Owner, Decimal>,
    /// Per-player attributed totals (carried plus claimed shelves).
    players: HashMap<PlayerId, Decimal>,
}

impl WeightLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted holdings and shelf claims.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyTracked`] if an item appears twice.
    pub fn restore(
        holdings: Vec<Holding>,
        claims: impl IntoIterator<Item = (ShelfId, PlayerId)>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        ledger.shelf_claims = claims.into_iter().collect();
        let events = holdings
            .into_iter()
            .map(|h| WeightEvent::Create {
                item: Box::new(h.item),
                owner: h.owner,
            })
            .collect();
        ledger.apply_all(events)?;
        Ok(ledger)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Weighted total of every tracked item.
    pub const fn global_total(&self) -> Decimal {
        self.global
    }

    /// Weighted total attributed to a player: items carried plus items on
    /// shelves the player claims.
    pub fn owner_total(&self, player: PlayerId) -> Decimal {
        self.players.get(&player).copied().unwrap_or(Decimal::ZERO)
    }

    /// Weighted total held directly by one holder.
    pub fn holder_total(&self, owner: Owner) -> Decimal {
        self.holders.get(&owner).copied().unwrap_or(Decimal::ZERO)
    }

    /// Number of tracked items.
    pub fn tracked_count(&self) -> usize {
        self.holdings.len()
    }

    /// Look up a tracked item.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.holdings.get(&id).map(|h| &h.item)
    }

    /// Current holder of a tracked item.
    pub fn owner_of(&self, id: ItemId) -> Option<Owner> {
        self.holdings.get(&id).map(|h| h.owner)
    }

    /// Every item held directly by `owner`, in id order.
    pub fn items_held_by(&self, owner: Owner) -> Vec<&Item> {
        self.holdings
            .values()
            .filter(|h| h.owner == owner)
            .map(|h| &h.item)
            .collect()
    }

    /// Every item attributed to `player`: carried or on a claimed shelf.
    pub fn possessions_of(&self, player: PlayerId) -> Vec<Holding> {
        self.holdings
            .values()
            .filter(|h| self.attributed_player(h.owner) == Some(player))
            .cloned()
            .collect()
    }

    /// Number of cursed items the player carries (shelved items excluded).
    pub fn cursed_carried(&self, player: PlayerId) -> usize {
        self.holdings
            .values()
            .filter(|h| h.owner == Owner::Player(player) && h.item.flags.cursed)
            .count()
    }

    /// Number of tracked items of a category anywhere in the zone.
    pub fn category_count(&self, category: ItemCategory) -> usize {
        self.holdings
            .values()
            .filter(|h| h.item.category == category)
            .count()
    }

    /// Number of tracked cursed items anywhere in the zone.
    pub fn cursed_count(&self) -> usize {
        self.holdings
            .values()
            .filter(|h| h.item.flags.cursed)
            .count()
    }

    /// Player currently claiming a shelf.
    pub fn shelf_claimant(&self, shelf: ShelfId) -> Option<PlayerId> {
        self.shelf_claims.get(&shelf).copied()
    }

    /// Iterate every holding, in id order.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    /// Iterate every shelf claim.
    pub fn shelf_claims(&self) -> impl Iterator<Item = (ShelfId, PlayerId)> + '_ {
        self.shelf_claims.iter().map(|(s, p)| (*s, *p))
    }

    /// The player an item held by `owner` counts toward, if any.
    pub fn attributed_player(&self, owner: Owner) -> Option<PlayerId> {
        match owner {
            Owner::Player(player) => Some(player),
            Owner::Shelf(shelf) => self.shelf_claims.get(&shelf).copied(),
            Owner::Room(_) | Owner::Shop(_) | Owner::Custody(_) => None,
        }
    }

    /// Recompute every total from scratch and compare.
    pub fn audit(&self) -> AuditResult {
        audit_totals(
            self.holdings.values(),
            &self.shelf_claims,
            self.global,
            &self.holders,
            &self.players,
        )
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Apply a single event.
    ///
    /// # Errors
    ///
    /// See [`apply_all`](Self::apply_all).
    pub fn apply(&mut self, event: WeightEvent) -> Result<WeightChange, LedgerError> {
        let mut changes = self.apply_all(vec![event])?;
        changes.pop().ok_or(LedgerError::Overflow {
            context: "empty change set for a single event",
        })
    }

    /// Apply a batch of events atomically.
    ///
    /// Every event is validated against the state left by the events before
    /// it. If any event fails, nothing is committed.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotTracked`] for destroy/transfer/flag events on an
    ///   item that is not tracked.
    /// - [`LedgerError::AlreadyTracked`] for a create of a tracked id.
    /// - [`LedgerError::OwnerMismatch`] when a transfer's `from` is not the
    ///   current holder.
    /// - [`LedgerError::NegativeTotal`] if any total would drop below zero.
    pub fn apply_all(&mut self, events: Vec<WeightEvent>) -> Result<Vec<WeightChange>, LedgerError> {
        let steps = self.plan(events)?;

        let mut tally = Tally::new(self.global);
        for step in &steps {
            if let Some(before) = &step.before {
                tally.shift(self, before.owner, before.item.effective_weight(), false)?;
            }
            if let Some(after) = &step.after {
                tally.shift(self, after.owner, after.item.effective_weight(), true)?;
            }
        }
        tally.check_non_negative()?;

        let changes = steps.iter().map(|s| self.describe(s)).collect();
        self.commit(steps, tally);
        Ok(changes)
    }

    /// Attribute a shelf (and everything on it) to a player.
    ///
    /// Claiming a shelf the player already claims is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ShelfClaimed`] if another player holds it.
    pub fn claim_shelf(&mut self, shelf: ShelfId, player: PlayerId) -> Result<Decimal, LedgerError> {
        match self.shelf_claims.get(&shelf) {
            Some(current) if *current == player => return Ok(Decimal::ZERO),
            Some(current) => {
                return Err(LedgerError::ShelfClaimed {
                    shelf,
                    claimant: *current,
                });
            }
            None => {}
        }
        let moved = self.holder_total(Owner::Shelf(shelf));
        let total = self
            .owner_total(player)
            .checked_add(moved)
            .ok_or(LedgerError::Overflow {
                context: "player weight total",
            })?;
        self.players.insert(player, total);
        self.shelf_claims.insert(shelf, player);
        Ok(moved)
    }

    /// Drop a shelf claim. Items stay on the shelf but stop counting toward
    /// the former claimant.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ShelfNotClaimed`] if nobody claims it.
    pub fn unclaim_shelf(&mut self, shelf: ShelfId) -> Result<PlayerId, LedgerError> {
        let player = self
            .shelf_claims
            .get(&shelf)
            .copied()
            .ok_or(LedgerError::ShelfNotClaimed { shelf })?;
        let moved = self.holder_total(Owner::Shelf(shelf));
        let remaining = self.owner_total(player).checked_sub(moved).ok_or(
            LedgerError::Overflow {
                context: "player weight total",
            },
        )?;
        if remaining < Decimal::ZERO {
            return Err(LedgerError::NegativeTotal {
                scope: format!("attributed:{player}"),
                total: remaining,
            });
        }
        self.shelf_claims.remove(&shelf);
        self.players.insert(player, remaining);
        Ok(player)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn plan(&self, events: Vec<WeightEvent>) -> Result<Vec<Step>, LedgerError> {
        let mut overlay: BTreeMap<ItemId, Option<Holding>> = BTreeMap::new();
        let mut steps = Vec::with_capacity(events.len());

        for event in events {
            let (id, after) = match event {
                WeightEvent::Create { item, owner } => {
                    let id = item.id;
                    if self.staged(&overlay, id).is_some() {
                        return Err(LedgerError::AlreadyTracked { item: id });
                    }
                    (id, Some(Holding { item: *item, owner }))
                }
                WeightEvent::Destroy { item } => {
                    self.require(&overlay, item)?;
                    (item, None)
                }
                WeightEvent::Transfer { item, from, to } => {
                    let current = self.require(&overlay, item)?;
                    if current.owner != from {
                        return Err(LedgerError::OwnerMismatch {
                            item,
                            expected: from,
                            actual: current.owner,
                        });
                    }
                    let mut moved = current.clone();
                    moved.owner = to;
                    (item, Some(moved))
                }
                WeightEvent::SetFlag { item, flag, value } => {
                    let mut updated = self.require(&overlay, item)?.clone();
                    updated.item.flags.set(flag, value);
                    (item, Some(updated))
                }
            };

            let before = self.staged(&overlay, id).cloned();
            overlay.insert(id, after.clone());
            steps.push(Step { id, before, after });
        }
        Ok(steps)
    }

    fn staged<'a>(
        &'a self,
        overlay: &'a BTreeMap<ItemId, Option<Holding>>,
        id: ItemId,
    ) -> Option<&'a Holding> {
        match overlay.get(&id) {
            Some(slot) => slot.as_ref(),
            None => self.holdings.get(&id),
        }
    }

    fn require<'a>(
        &'a self,
        overlay: &'a BTreeMap<ItemId, Option<Holding>>,
        id: ItemId,
    ) -> Result<&'a Holding, LedgerError> {
        self.staged(overlay, id).ok_or_else(|| {
            warn!(item = %id, "ledger event references an untracked item");
            LedgerError::NotTracked { item: id }
        })
    }

    fn describe(&self, step: &Step) -> WeightChange {
        let reference = step.after.as_ref().or(step.before.as_ref());
        WeightChange {
            item: step.id,
            category: reference.map_or(ItemCategory::Misc, |h| h.item.category),
            cursed: reference.is_some_and(|h| h.item.flags.cursed),
            before: step.before.as_ref().map(|h| h.owner),
            after: step.after.as_ref().map(|h| h.owner),
            player_before: step
                .before
                .as_ref()
                .and_then(|h| self.attributed_player(h.owner)),
            player_after: step
                .after
                .as_ref()
                .and_then(|h| self.attributed_player(h.owner)),
            weight_before: step
                .before
                .as_ref()
                .map_or(Decimal::ZERO, |h| h.item.effective_weight()),
            weight_after: step
                .after
                .as_ref()
                .map_or(Decimal::ZERO, |h| h.item.effective_weight()),
        }
    }

    fn commit(&mut self, steps: Vec<Step>, tally: Tally) {
        for step in steps {
            match step.after {
                Some(holding) => {
                    self.holdings.insert(step.id, holding);
                }
                None => {
                    self.holdings.remove(&step.id);
                }
            }
        }
        self.global = tally.global;
        for (owner, total) in tally.holders {
            if total.is_zero() {
                self.holders.remove(&owner);
            } else {
                self.holders.insert(owner, total);
            }
        }
        for (player, total) in tally.players {
            self.players.insert(player, total);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
