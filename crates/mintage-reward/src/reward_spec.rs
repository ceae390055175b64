//! Computed balance deltas for one block.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mintage_types::{Address, Amount};

use crate::math;
use crate::sources::BalanceAdder;
use crate::Result;

/// Minting, fee and per-recipient reward totals for one block.
///
/// Component totals (`proposer`, `stakers`, `fund_a`, `fund_b`) are kept
/// alongside the per-address map; when one address receives several
/// components (e.g. the proposer is also a stake rewardee) the map holds
/// the sum.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSpec {
    /// Newly created currency.
    pub minted: Amount,
    /// Total transaction fee of the block.
    pub total_fee: Amount,
    /// Portion of the fee removed from circulation.
    pub burnt_fee: Amount,
    /// Credited to the proposer.
    pub proposer: Amount,
    /// Credited to stake rewardees in total.
    pub stakers: Amount,
    /// Credited to fund A.
    pub fund_a: Amount,
    /// Credited to fund B.
    pub fund_b: Amount,
    /// Per-address credits.
    pub rewards: BTreeMap<Address, Amount>,
}

impl RewardSpec {
    /// Add `amount` to the credit of `addr`.
    ///
    /// # Errors
    ///
    /// - [`crate::RewardError::ArithmeticOverflow`] if the credit exceeds 256 bits
    pub fn credit(&mut self, addr: Address, amount: Amount) -> Result<()> {
        let entry = self.rewards.entry(addr).or_default();
        *entry = math::add(*entry, amount)?;
        Ok(())
    }

    /// Sum of all per-address credits.
    ///
    /// # Errors
    ///
    /// - [`crate::RewardError::ArithmeticOverflow`] if the sum exceeds 256 bits
    pub fn total_rewards(&self) -> Result<Amount> {
        self.rewards
            .values()
            .try_fold(Amount::zero(), |acc, v| math::add(acc, *v))
    }

    /// Credit every non-zero reward, one call per address in address order.
    pub fn apply(&self, balances: &mut dyn BalanceAdder) {
        for (addr, amount) in &self.rewards {
            if !amount.is_zero() {
                balances.add_balance(*addr, *amount);
            }
        }
    }
}
