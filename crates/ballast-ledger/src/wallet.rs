//! Personal ash balances.
//!
//! Wallets are the players' side of every exchange with the feedstock pool.
//! Unlike the pool they are signed: an escort leaves the offender owing a
//! fixed debt, which is shown as a negative balance until earned back.

use std::collections::BTreeMap;

use ballast_types::PlayerId;

use crate::WalletError;

/// Signed ash balance per player. Missing players have a balance of zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Wallets {
    balances: BTreeMap<PlayerId, i64>,
}

impl Wallets {
    /// Create an empty set of wallets.
    pub const fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
        }
    }

    /// Current balance of a player.
    pub fn balance(&self, player: PlayerId) -> i64 {
        self.balances.get(&player).copied().unwrap_or(0)
    }

    /// Add ash. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Overflow`] if the balance would overflow.
    pub fn deposit(&mut self, player: PlayerId, amount: u64) -> Result<i64, WalletError> {
        let amount = i64::try_from(amount).map_err(|_source| WalletError::Overflow { player })?;
        let next = self
            .balance(player)
            .checked_add(amount)
            .ok_or(WalletError::Overflow { player })?;
        self.balances.insert(player, next);
        Ok(next)
    }

    /// Spend ash the player has. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InsufficientFunds`] if the balance is lower
    /// than `amount` (including any negative balance).
    pub fn withdraw(&mut self, player: PlayerId, amount: u64) -> Result<i64, WalletError> {
        let available = self.balance(player);
        let wanted = i64::try_from(amount).map_err(|_source| WalletError::Overflow { player })?;
        if available < wanted {
            return Err(WalletError::InsufficientFunds {
                player,
                requested: amount,
                available,
            });
        }
        let next = available
            .checked_sub(wanted)
            .ok_or(WalletError::Overflow { player })?;
        self.balances.insert(player, next);
        Ok(next)
    }

    /// Take ash if the player can cover it; returns the amount taken
    /// (`amount` or zero).
    pub fn try_take(&mut self, player: PlayerId, amount: u64) -> u64 {
        if self.withdraw(player, amount).is_ok() {
            amount
        } else {
            0
        }
    }

    /// Overwrite a balance (escort debt, snapshot restore).
    pub fn set(&mut self, player: PlayerId, balance: i64) {
        self.balances.insert(player, balance);
    }

    /// Iterate every non-default wallet.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, i64)> + '_ {
        self.balances.iter().map(|(p, b)| (*p, *b))
    }
}

impl FromIterator<(PlayerId, i64)> for Wallets {
    fn from_iter<T: IntoIterator<Item = (PlayerId, i64)>>(iter: T) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_player_has_zero() {
        let wallets = Wallets::new();
        assert_eq!(wallets.balance(PlayerId::new()), 0);
    }

    #[test]
    fn withdraw_requires_funds() {
        let mut wallets = Wallets::new();
        let player = PlayerId::new();
        wallets.deposit(player, 3).unwrap();
        assert!(matches!(
            wallets.withdraw(player, 4),
            Err(WalletError::InsufficientFunds { available: 3, .. })
        ));
        assert_eq!(wallets.withdraw(player, 3).unwrap(), 0);
    }

    #[test]
    fn negative_balance_blocks_spending() {
        let mut wallets = Wallets::new();
        let player = PlayerId::new();
        wallets.set(player, -50);
        assert!(wallets.withdraw(player, 1).is_err());
        assert_eq!(wallets.try_take(player, 5), 0);
        wallets.deposit(player, 60).unwrap();
        assert_eq!(wallets.balance(player), 10);
    }
}
