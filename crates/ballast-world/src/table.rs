//! Static weighted tables.
//!
//! Each entry is `(value, weight)`. Weights are summed and a random value
//! in `[0, total_weight)` walks the cumulative sum to select an entry.
//! Tables are `const` so every station and shop kind can own one without
//! allocation.

use rand::{Rng, RngCore};

/// A weighted list of outcomes.
#[derive(Debug, Clone, Copy)]
pub struct WeightedTable<T: 'static> {
    entries: &'static [(T, u32)],
}

impl<T: Copy> WeightedTable<T> {
    /// Wrap a static entry list.
    pub const fn new(entries: &'static [(T, u32)]) -> Self {
        Self { entries }
    }

    /// Every entry, in declaration order.
    pub const fn entries(&self) -> &'static [(T, u32)] {
        self.entries
    }

    /// Sum of all entry weights.
    pub fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |total, &(_, weight)| total.saturating_add(weight))
    }

    /// Select the entry covering `random_value`.
    ///
    /// Values past the end of the cumulative range fall back to the last
    /// entry. Returns `None` only for an empty table.
    pub fn select(&self, random_value: u32) -> Option<T> {
        let mut cumulative: u32 = 0;
        for &(value, weight) in self.entries {
            cumulative = cumulative.saturating_add(weight);
            if random_value < cumulative {
                return Some(value);
            }
        }
        self.entries.last().map(|&(value, _)| value)
    }

    /// Roll against the table.
    pub fn roll(&self, rng: &mut dyn RngCore) -> Option<T> {
        let total = self.total_weight();
        if total == 0 {
            return self.entries.first().map(|&(value, _)| value);
        }
        self.select(rng.random_range(0..total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: WeightedTable<char> = WeightedTable::new(&[('a', 75), ('b', 15), ('c', 10)]);

    #[test]
    fn select_walks_cumulative_weights() {
        assert_eq!(TABLE.total_weight(), 100);
        assert_eq!(TABLE.select(0), Some('a'));
        assert_eq!(TABLE.select(74), Some('a'));
        assert_eq!(TABLE.select(75), Some('b'));
        assert_eq!(TABLE.select(89), Some('b'));
        assert_eq!(TABLE.select(90), Some('c'));
        assert_eq!(TABLE.select(500), Some('c'));
    }

    #[test]
    fn empty_table_selects_nothing() {
        let empty: WeightedTable<char> = WeightedTable::new(&[]);
        assert_eq!(empty.select(0), None);
    }
}
