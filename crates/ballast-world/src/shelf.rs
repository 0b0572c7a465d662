//! Claimable display shelves.
//!
//! A player claims a shelf, then places items on it. Displayed items weigh
//! half and still count toward the claimant. Unclaiming leaves the items
//! where they are, but they stop counting toward anyone.

use std::collections::BTreeSet;

use ballast_types::{ItemId, PlayerId, RoomId, ShelfId};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::fixtures::Display;

/// Default number of items a shelf can hold.
pub const DEFAULT_SHELF_CAPACITY: usize = 5;

/// A display shelf fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayShelf {
    /// Shelf identity.
    pub id: ShelfId,
    /// Room the shelf stands in.
    pub room: RoomId,
    /// Name shown to players.
    pub name: String,
    claimant: Option<PlayerId>,
    items: BTreeSet<ItemId>,
    capacity: usize,
}

impl DisplayShelf {
    /// An empty, unclaimed shelf.
    pub fn new(id: ShelfId, room: RoomId, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id,
            room,
            name: name.into(),
            claimant: None,
            items: BTreeSet::new(),
            capacity,
        }
    }

    /// Current claimant, if any.
    pub const fn claimant(&self) -> Option<PlayerId> {
        self.claimant
    }

    /// Items on the shelf.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    /// Whether `item` sits on the shelf.
    pub fn holds(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    /// Claim the shelf. Re-claiming your own shelf is a no-op.
    pub fn claim(&mut self, player: PlayerId) -> Result<(), WorldError> {
        match self.claimant {
            Some(claimant) if claimant != player => Err(WorldError::ShelfClaimed {
                shelf: self.id,
                claimant,
            }),
            _ => {
                self.claimant = Some(player);
                Ok(())
            }
        }
    }

    /// Release the claim. Items stay on the shelf.
    pub fn unclaim(&mut self, player: PlayerId) -> Result<(), WorldError> {
        self.require_claimant(player)?;
        self.claimant = None;
        Ok(())
    }

    /// Remove an item regardless of claim, e.g. when it is gifted, seized
    /// or burned.
    pub fn evict(&mut self, item: ItemId) -> bool {
        self.items.remove(&item)
    }

    /// Drop every item from the shelf, returning them.
    pub fn clear(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.items).into_iter().collect()
    }

    fn require_claimant(&self, player: PlayerId) -> Result<(), WorldError> {
        if self.claimant == Some(player) {
            Ok(())
        } else {
            Err(WorldError::NotClaimant {
                shelf: self.id,
                player,
            })
        }
    }
}

impl Display for DisplayShelf {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn shown(&self) -> usize {
        self.items.len()
    }

    fn place(&mut self, player: PlayerId, item: ItemId) -> Result<(), WorldError> {
        self.require_claimant(player)?;
        if self.items.contains(&item) {
            return Err(WorldError::AlreadyOnShelf {
                shelf: self.id,
                item,
            });
        }
        if self.items.len() >= self.capacity {
            return Err(WorldError::ShelfFull {
                shelf: self.id,
                capacity: self.capacity,
            });
        }
        self.items.insert(item);
        Ok(())
    }

    fn take(&mut self, player: PlayerId, item: ItemId) -> Result<(), WorldError> {
        self.require_claimant(player)?;
        if self.items.remove(&item) {
            Ok(())
        } else {
            Err(WorldError::NotOnShelf {
                shelf: self.id,
                item,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shelf() -> DisplayShelf {
        DisplayShelf::new(ShelfId::new(), RoomId::new(), "oak shelf", DEFAULT_SHELF_CAPACITY)
    }

    #[test]
    fn claim_is_exclusive() {
        let mut shelf = shelf();
        let alice = PlayerId::new();
        let bob = PlayerId::new();
        shelf.claim(alice).unwrap();
        shelf.claim(alice).unwrap();
        let err = shelf.claim(bob).unwrap_err();
        assert_eq!(
            err,
            WorldError::ShelfClaimed {
                shelf: shelf.id,
                claimant: alice
            }
        );
    }

    #[test]
    fn only_claimant_places_and_takes() {
        let mut shelf = shelf();
        let alice = PlayerId::new();
        let bob = PlayerId::new();
        let vase = ItemId::new();
        assert!(matches!(
            shelf.place(alice, vase),
            Err(WorldError::NotClaimant { .. })
        ));
        shelf.claim(alice).unwrap();
        shelf.place(alice, vase).unwrap();
        assert!(matches!(shelf.take(bob, vase), Err(WorldError::NotClaimant { .. })));
        shelf.take(alice, vase).unwrap();
        assert_eq!(shelf.shown(), 0);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut shelf = shelf();
        let alice = PlayerId::new();
        shelf.claim(alice).unwrap();
        for _ in 0..DEFAULT_SHELF_CAPACITY {
            shelf.place(alice, ItemId::new()).unwrap();
        }
        assert!(matches!(
            shelf.place(alice, ItemId::new()),
            Err(WorldError::ShelfFull { capacity: 5, .. })
        ));
    }

    #[test]
    fn unclaim_keeps_items() {
        let mut shelf = shelf();
        let alice = PlayerId::new();
        let vase = ItemId::new();
        shelf.claim(alice).unwrap();
        shelf.place(alice, vase).unwrap();
        shelf.unclaim(alice).unwrap();
        assert_eq!(shelf.claimant(), None);
        assert!(shelf.holds(vase));
        assert!(shelf.evict(vase));
        assert!(!shelf.evict(vase));
    }
}
