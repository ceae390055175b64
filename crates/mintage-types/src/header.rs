//! Header facts read at block finalization.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount};

/// The subset of a finalized block header the reward core consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height.
    pub number: u64,
    /// Reward address of the block proposer.
    pub rewardbase: Address,
    /// Total gas consumed by the block's transactions.
    pub gas_used: u64,
    /// Dynamic base fee. Present only once the fee market is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee: Option<Amount>,
}

impl BlockHeader {
    /// Create a header without a base fee (pre fee market).
    pub fn new(number: u64, rewardbase: Address, gas_used: u64) -> Self {
        Self {
            number,
            rewardbase,
            gas_used,
            base_fee: None,
        }
    }

    /// Attach a dynamic base fee.
    pub fn with_base_fee(mut self, base_fee: Amount) -> Self {
        self.base_fee = Some(base_fee);
        self
    }

    /// Whether the block was produced under the dynamic fee market.
    pub fn is_fee_market(&self) -> bool {
        self.base_fee.is_some()
    }
}
