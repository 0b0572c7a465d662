//! Consistency audit for the weight ledger.
//!
//! The ledger maintains its totals incrementally. An audit recomputes them
//! from the raw holdings and compares. Every applied event shifts the totals
//! by exactly the weight it moves, so the audit passes by construction; it
//! is run after restores and by the monitor as a guard against upstream
//! consistency bugs.
//!
//! A mismatch produces a [`WeightAnomaly`] naming every total that drifted.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use ballast_types::{Holding, Owner, PlayerId, ShelfId};

use crate::WeightAnomaly;

/// The result of auditing the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// Every incremental total matches a full recomputation.
    Consistent,
    /// One or more totals drifted.
    Anomaly(WeightAnomaly),
}

/// Recompute global, per-holder and per-player totals and compare them with
/// the incrementally maintained ones.
pub fn audit_totals<'a>(
    holdings: impl Iterator<Item = &'a Holding>,
    claims: &BTreeMap<ShelfId, PlayerId>,
    global: Decimal,
    holders: &HashMap<Owner, Decimal>,
    players: &HashMap<PlayerId, Decimal>,
) -> AuditResult {
    let mut expected_global = Decimal::ZERO;
    let mut expected_holders: BTreeMap<Owner, Decimal> = BTreeMap::new();
    let mut expected_players: BTreeMap<PlayerId, Decimal> = BTreeMap::new();

    for holding in holdings {
        let weight = holding.item.effective_weight();
        expected_global = match expected_global.checked_add(weight) {
            Some(v) => v,
            None => return overflow_anomaly("global"),
        };

        let h = expected_holders.entry(holding.owner).or_insert(Decimal::ZERO);
        *h = match h.checked_add(weight) {
            Some(v) => v,
            None => return overflow_anomaly("holder"),
        };

        let player = match holding.owner {
            Owner::Player(p) => Some(p),
            Owner::Shelf(s) => claims.get(&s).copied(),
            Owner::Room(_) | Owner::Shop(_) | Owner::Custody(_) => None,
        };
        if let Some(p) = player {
            let t = expected_players.entry(p).or_insert(Decimal::ZERO);
            *t = match t.checked_add(weight) {
                Some(v) => v,
                None => return overflow_anomaly("player"),
            };
        }
    }

    let mut drifted: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();

    if expected_global != global {
        drifted.insert(String::from("global"), (expected_global, global));
    }

    for (owner, expected) in &expected_holders {
        let actual = holders.get(owner).copied().unwrap_or(Decimal::ZERO);
        if *expected != actual {
            drifted.insert(owner.to_string(), (*expected, actual));
        }
    }
    for (owner, actual) in holders {
        if !expected_holders.contains_key(owner) && !actual.is_zero() {
            drifted.insert(owner.to_string(), (Decimal::ZERO, *actual));
        }
    }

    for (player, expected) in &expected_players {
        let actual = players.get(player).copied().unwrap_or(Decimal::ZERO);
        if *expected != actual {
            drifted.insert(format!("attributed:{player}"), (*expected, actual));
        }
    }
    for (player, actual) in players {
        if !expected_players.contains_key(player) && !actual.is_zero() {
            drifted.insert(format!("attributed:{player}"), (Decimal::ZERO, *actual));
        }
    }

    if drifted.is_empty() {
        AuditResult::Consistent
    } else {
        let count = drifted.len();
        AuditResult::Anomaly(WeightAnomaly {
            drifted,
            message: format!("WEIGHT_ANOMALY: {count} total(s) drifted from their holdings"),
        })
    }
}

/// Construct an anomaly result for arithmetic overflow during summation.
fn overflow_anomaly(scope: &str) -> AuditResult {
    let mut drifted = BTreeMap::new();
    drifted.insert(scope.to_owned(), (Decimal::ZERO, Decimal::ZERO));
    AuditResult::Anomaly(WeightAnomaly {
        drifted,
        message: format!("WEIGHT_ANOMALY: arithmetic overflow while summing {scope} totals"),
    })
}
