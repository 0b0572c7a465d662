//! The feedstock pool: the zone's bounded communal ash reserve.
//!
//! Every economic participant (shops, itemators, the incinerator, the
//! hoarding fine collector, the reporter reward payout) moves ash through
//! [`FeedstockPool::credit`] and [`FeedstockPool::debit`]. There is no other
//! path that mutates the balance.
//!
//! # Design
//!
//! - **Bounded**: `0 <= balance <= cap` holds after every operation.
//! - **Credit clamps**: a credit that would pass the cap keeps only what
//!   fits and reports the rest as discarded. Many fines landing at once can
//!   never overflow the pool.
//! - **Debit refuses**: a debit larger than the balance fails with
//!   [`PoolError::InsufficientFunds`] and changes nothing.

use ballast_types::PoolStatus;

use crate::PoolError;

/// Lower bound of the pool balance.
pub const POOL_FLOOR: u64 = 0;

/// Outcome of a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditReceipt {
    /// Ash actually added.
    pub credited: u64,
    /// Ash lost to the cap.
    pub discarded: u64,
    /// Balance after the credit.
    pub balance: u64,
}

/// Bounded server-wide ash counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedstockPool {
    balance: u64,
    cap: u64,
    recharge_rate: u64,
}

impl FeedstockPool {
    /// Create a pool. A starting balance above `cap` is clamped.
    pub fn new(start: u64, cap: u64, recharge_rate: u64) -> Self {
        Self {
            balance: start.min(cap),
            cap,
            recharge_rate,
        }
    }

    /// Current balance.
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    /// Upper bound.
    pub const fn cap(&self) -> u64 {
        self.cap
    }

    /// Ash added by each passive recharge.
    pub const fn recharge_rate(&self) -> u64 {
        self.recharge_rate
    }

    /// Read-only view for counter signs.
    pub const fn status(&self) -> PoolStatus {
        PoolStatus {
            balance: self.balance,
            cap: self.cap,
            floor: POOL_FLOOR,
        }
    }

    /// Add ash, clamping at the cap. Excess is discarded, not an error.
    pub fn credit(&mut self, amount: u64) -> CreditReceipt {
        let room = self.cap.saturating_sub(self.balance);
        let credited = amount.min(room);
        self.balance = self.balance.saturating_add(credited);
        CreditReceipt {
            credited,
            discarded: amount.saturating_sub(credited),
            balance: self.balance,
        }
    }

    /// Remove ash. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InsufficientFunds`] if `amount` exceeds the
    /// balance. The balance is unchanged.
    pub fn debit(&mut self, amount: u64) -> Result<u64, PoolError> {
        let remaining = self
            .balance
            .checked_sub(amount)
            .ok_or(PoolError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            })?;
        self.balance = remaining;
        Ok(remaining)
    }

    /// Passive recharge applied once per monitor tick.
    pub fn passive_recharge(&mut self) -> CreditReceipt {
        self.credit(self.recharge_rate)
    }

    /// Overwrite the balance from a snapshot, clamped to the cap.
    pub fn restore_balance(&mut self, balance: u64) {
        self.balance = balance.min(self.cap);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn start_is_clamped_to_cap() {
        let pool = FeedstockPool::new(5000, 2000, 5);
        assert_eq!(pool.balance(), 2000);
    }

    #[test]
    fn credit_clamps_at_cap() {
        let mut pool = FeedstockPool::new(1995, 2000, 5);
        let receipt = pool.credit(15);
        assert_eq!(pool.balance(), 2000);
        assert_eq!(receipt.credited, 5);
        assert_eq!(receipt.discarded, 10);
    }

    #[test]
    fn debit_beyond_balance_is_refused() {
        let mut pool = FeedstockPool::new(10, 2000, 5);
        let result = pool.debit(11);
        assert!(matches!(
            result,
            Err(PoolError::InsufficientFunds {
                requested: 11,
                available: 10
            })
        ));
        assert_eq!(pool.balance(), 10);
    }

    #[test]
    fn debit_to_exactly_zero() {
        let mut pool = FeedstockPool::new(10, 2000, 5);
        assert_eq!(pool.debit(10).unwrap(), 0);
        assert_eq!(pool.status().balance, POOL_FLOOR);
    }

    #[test]
    fn recharge_respects_cap() {
        let mut pool = FeedstockPool::new(1998, 2000, 5);
        pool.passive_recharge();
        assert_eq!(pool.balance(), 2000);
        let receipt = pool.passive_recharge();
        assert_eq!(receipt.credited, 0);
        assert_eq!(pool.balance(), 2000);
    }

    #[test]
    fn balance_stays_in_bounds_under_mixed_traffic() {
        let mut pool = FeedstockPool::new(500, 2000, 5);
        for i in 0_u64..500 {
            if i % 3 == 0 {
                let _ = pool.debit(i % 40);
            } else {
                pool.credit(i % 17);
            }
            assert!(pool.balance() <= pool.cap());
        }
    }
}
