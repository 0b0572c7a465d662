//! Curse affliction ticks.
//!
//! A player carrying cursed items gets a discomfort message on every tick.
//! Carrying two or more raises a chance of fumbling a random non-displayed
//! item onto the floor. The tick stops itself once nothing cursed is
//! carried.

use ballast_types::ItemId;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Curse tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurseRules {
    /// Cursed items needed before drops can happen.
    #[serde(default = "default_drop_threshold")]
    pub drop_threshold: usize,
    /// Chance of a drop per tick, in percent.
    #[serde(default = "default_drop_percent")]
    pub drop_percent: u32,
}

const fn default_drop_threshold() -> usize {
    2
}

const fn default_drop_percent() -> u32 {
    20
}

impl Default for CurseRules {
    fn default() -> Self {
        Self {
            drop_threshold: default_drop_threshold(),
            drop_percent: default_drop_percent(),
        }
    }
}

const DISCOMFORT: &[&str] = &[
    "A chill runs through you. Something you carry feels wrong.",
    "The hair on the back of your neck stands up.",
    "You feel a weight on your shoulders that has nothing to do with gravity.",
    "Something whispers at the edge of hearing. You can't make out the words.",
    "Your hands tremble for a moment. A cold sweat breaks out.",
];

/// Result of one curse tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurseTick {
    /// Nothing cursed is carried; cancel the tick.
    Lifted,
    /// The curse is still active.
    Afflicted {
        /// Message for the afflicted player.
        message: &'static str,
        /// Item fumbled into the room, if any.
        dropped: Option<ItemId>,
    },
}

/// Run one tick for a player carrying `cursed` cursed items, with
/// `droppable` listing the items that can be fumbled.
pub fn tick(
    cursed: usize,
    droppable: &[ItemId],
    rules: &CurseRules,
    rng: &mut dyn RngCore,
) -> CurseTick {
    if cursed == 0 {
        return CurseTick::Lifted;
    }
    let message = DISCOMFORT.choose(rng).copied().unwrap_or("You feel uneasy.");
    let dropped = if cursed >= rules.drop_threshold
        && rng.random_range(0..100) < rules.drop_percent
    {
        droppable.choose(rng).copied()
    } else {
        None
    };
    CurseTick::Afflicted { message, dropped }
}
