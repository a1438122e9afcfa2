//! Wallet and currency handling.
//!
//! Five fixed denominations with gold-piece conversion ratios. All arithmetic
//! runs in integer copper units so spending and change-making can never
//! create or destroy value.

use crate::num;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Copper pieces per gold piece.
pub const COPPER_PER_GP: i64 = 100;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Not enough coin: need {needed_gp} gp, have {available_gp} gp")]
    InsufficientFunds { needed_gp: f64, available_gp: f64 },
    #[error("Cannot spend a negative amount")]
    NegativeAmount,
}

/// Coin denominations, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Denomination {
    Platinum,
    Electrum,
    Gold,
    Silver,
    Copper,
}

impl Denomination {
    /// Value of one coin in copper pieces.
    pub fn copper_value(&self) -> i64 {
        match self {
            Denomination::Platinum => 1000,
            Denomination::Electrum => 500,
            Denomination::Gold => 100,
            Denomination::Silver => 10,
            Denomination::Copper => 1,
        }
    }

    /// Value of one coin in gold pieces.
    pub fn gp_value(&self) -> f64 {
        self.copper_value() as f64 / COPPER_PER_GP as f64
    }

    /// All denominations from largest to smallest.
    pub fn descending() -> [Denomination; 5] {
        [
            Denomination::Platinum,
            Denomination::Electrum,
            Denomination::Gold,
            Denomination::Silver,
            Denomination::Copper,
        ]
    }

    /// All denominations from smallest to largest.
    pub fn ascending() -> [Denomination; 5] {
        [
            Denomination::Copper,
            Denomination::Silver,
            Denomination::Gold,
            Denomination::Electrum,
            Denomination::Platinum,
        ]
    }
}

/// Per-denomination coin counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default, deserialize_with = "num::u64_or_zero")]
    pub platinum: u64,
    #[serde(default, deserialize_with = "num::u64_or_zero")]
    pub gold: u64,
    #[serde(default, deserialize_with = "num::u64_or_zero")]
    pub electrum: u64,
    #[serde(default, deserialize_with = "num::u64_or_zero")]
    pub silver: u64,
    #[serde(default, deserialize_with = "num::u64_or_zero")]
    pub copper: u64,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, denom: Denomination) -> u64 {
        match denom {
            Denomination::Platinum => self.platinum,
            Denomination::Electrum => self.electrum,
            Denomination::Gold => self.gold,
            Denomination::Silver => self.silver,
            Denomination::Copper => self.copper,
        }
    }

    fn count_mut(&mut self, denom: Denomination) -> &mut u64 {
        match denom {
            Denomination::Platinum => &mut self.platinum,
            Denomination::Electrum => &mut self.electrum,
            Denomination::Gold => &mut self.gold,
            Denomination::Silver => &mut self.silver,
            Denomination::Copper => &mut self.copper,
        }
    }

    pub fn add(&mut self, denom: Denomination, count: u64) {
        *self.count_mut(denom) += count;
    }

    pub fn is_empty(&self) -> bool {
        Denomination::descending().iter().all(|d| self.count(*d) == 0)
    }

    /// Total number of physical coins (for weight/EV accounting).
    pub fn coin_count(&self) -> u64 {
        Denomination::descending()
            .iter()
            .map(|d| self.count(*d))
            .sum()
    }

    /// Total value in copper pieces.
    pub fn total_copper(&self) -> i64 {
        Denomination::descending()
            .iter()
            .map(|d| self.count(*d) as i64 * d.copper_value())
            .sum()
    }

    /// Total value in gold pieces.
    pub fn total_gp(&self) -> f64 {
        self.total_copper() as f64 / COPPER_PER_GP as f64
    }

    /// Distribute a copper amount into coins, largest denomination first.
    pub fn from_copper(mut copper: i64) -> Self {
        let mut wallet = Wallet::new();
        for denom in Denomination::descending() {
            let coins = copper / denom.copper_value();
            if coins > 0 {
                wallet.add(denom, coins as u64);
                copper -= coins * denom.copper_value();
            }
        }
        wallet
    }

    /// Distribute a change amount into gold, silver, and copper. Change
    /// made while spending never contains platinum or electrum coins.
    fn change_for(mut copper: i64) -> Self {
        let mut wallet = Wallet::new();
        for denom in [Denomination::Gold, Denomination::Silver, Denomination::Copper] {
            let coins = copper / denom.copper_value();
            if coins > 0 {
                wallet.add(denom, coins as u64);
                copper -= coins * denom.copper_value();
            }
        }
        wallet
    }

    /// Migrate a legacy flat gold figure: whole gold stays gold, the
    /// fraction becomes silver and copper. Never mints platinum or electrum.
    pub fn from_legacy_gp(gp: f64) -> Self {
        let copper = (gp.max(0.0) * COPPER_PER_GP as f64).round() as i64;
        let mut wallet = Wallet::from_copper(copper % COPPER_PER_GP);
        wallet.gold = (copper / COPPER_PER_GP) as u64;
        wallet
    }

    /// Spend a gold-piece amount, consuming the smallest denominations first
    /// and making change when a consumed coin overshoots the remaining cost.
    ///
    /// Fails atomically: on insufficient funds the wallet is unchanged.
    pub fn spend_gp(&mut self, amount_gp: f64) -> Result<SpendReceipt, WalletError> {
        if amount_gp < 0.0 {
            return Err(WalletError::NegativeAmount);
        }
        let cost = (amount_gp * COPPER_PER_GP as f64).round() as i64;
        self.spend_copper(cost)
    }

    /// Spend a copper amount. See [`Wallet::spend_gp`].
    pub fn spend_copper(&mut self, cost: i64) -> Result<SpendReceipt, WalletError> {
        if cost < 0 {
            return Err(WalletError::NegativeAmount);
        }
        let available = self.total_copper();
        if available < cost {
            return Err(WalletError::InsufficientFunds {
                needed_gp: cost as f64 / COPPER_PER_GP as f64,
                available_gp: available as f64 / COPPER_PER_GP as f64,
            });
        }

        let mut working = self.clone();
        let mut spent = Wallet::new();
        let mut paid: i64 = 0;

        'outer: for denom in Denomination::ascending() {
            while working.count(denom) > 0 {
                if paid >= cost {
                    break 'outer;
                }
                *working.count_mut(denom) -= 1;
                spent.add(denom, 1);
                paid += denom.copper_value();
            }
        }

        // Overshoot comes back as gold, silver, and copper change.
        let change = Wallet::change_for(paid - cost);
        for denom in Denomination::descending() {
            working.add(denom, change.count(denom));
        }

        *self = working;
        Ok(SpendReceipt {
            cost_copper: cost,
            spent,
            change,
        })
    }
}

/// What a successful spend consumed and returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendReceipt {
    pub cost_copper: i64,
    /// Coins removed from the wallet.
    pub spent: Wallet,
    /// Coins returned as change.
    pub change: Wallet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gp_values() {
        assert_eq!(Denomination::Platinum.gp_value(), 10.0);
        assert_eq!(Denomination::Electrum.gp_value(), 5.0);
        assert_eq!(Denomination::Gold.gp_value(), 1.0);
        assert_eq!(Denomination::Silver.gp_value(), 0.1);
        assert_eq!(Denomination::Copper.gp_value(), 0.01);
    }

    #[test]
    fn test_from_legacy_gp_keeps_gold_as_gold() {
        let wallet = Wallet::from_legacy_gp(1234.56);
        assert_eq!(wallet.platinum, 0);
        assert_eq!(wallet.electrum, 0);
        assert_eq!(wallet.gold, 1234);
        assert_eq!(wallet.silver, 5);
        assert_eq!(wallet.copper, 6);
    }

    #[test]
    fn test_total_gp() {
        let wallet = Wallet {
            platinum: 1,
            gold: 2,
            electrum: 0,
            silver: 3,
            copper: 4,
        };
        assert_eq!(wallet.total_copper(), 1000 + 200 + 30 + 4);
        assert!((wallet.total_gp() - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_spend_exact_smallest_first() {
        let mut wallet = Wallet {
            copper: 5,
            silver: 2,
            gold: 1,
            ..Wallet::default()
        };
        let receipt = wallet.spend_copper(25).unwrap();
        // 5 copper + 2 silver pays 25 exactly.
        assert_eq!(receipt.spent.copper, 5);
        assert_eq!(receipt.spent.silver, 2);
        assert_eq!(receipt.change.total_copper(), 0);
        assert_eq!(wallet.total_copper(), 100);
    }

    #[test]
    fn test_spend_breaks_large_coin_for_change() {
        let mut wallet = Wallet {
            platinum: 1,
            ..Wallet::default()
        };
        let receipt = wallet.spend_gp(1.0).unwrap();
        assert_eq!(receipt.spent.platinum, 1);
        // 9 gp of change, as gold rather than electrum.
        assert_eq!(receipt.change.total_copper(), 900);
        assert_eq!(receipt.change.platinum, 0);
        assert_eq!(receipt.change.electrum, 0);
        assert_eq!(receipt.change.gold, 9);
        assert_eq!(wallet.total_copper(), 900);
    }

    #[test]
    fn test_change_never_mints_electrum() {
        // An electrum coin overshoots by up to 499 copper, which still
        // comes back as gold, silver, and copper.
        let mut wallet = Wallet {
            electrum: 1,
            ..Wallet::default()
        };
        let receipt = wallet.spend_copper(123).unwrap();
        assert_eq!(receipt.change.electrum, 0);
        assert_eq!(receipt.change.gold, 3);
        assert_eq!(receipt.change.silver, 7);
        assert_eq!(receipt.change.copper, 7);
        assert_eq!(wallet.total_copper(), 377);
    }

    #[test]
    fn test_spend_insufficient_is_atomic() {
        let mut wallet = Wallet {
            gold: 3,
            ..Wallet::default()
        };
        let before = wallet.clone();
        let err = wallet.spend_gp(5.0).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds { .. }));
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_spend_conserves_value() {
        let mut wallet = Wallet {
            platinum: 2,
            electrum: 1,
            gold: 7,
            silver: 13,
            copper: 41,
        };
        let start = wallet.total_copper();
        let mut spent_total = 0i64;
        for cost in [37, 1200, 505, 99] {
            let receipt = wallet.spend_copper(cost).unwrap();
            spent_total += receipt.cost_copper;
            assert_eq!(
                receipt.spent.total_copper() - receipt.change.total_copper(),
                cost
            );
        }
        assert_eq!(wallet.total_copper(), start - spent_total);
    }

    #[test]
    fn test_from_copper_greedy() {
        let wallet = Wallet::from_copper(1234);
        assert_eq!(wallet.platinum, 1);
        assert_eq!(wallet.electrum, 0);
        assert_eq!(wallet.gold, 2);
        assert_eq!(wallet.silver, 3);
        assert_eq!(wallet.copper, 4);
    }
}
