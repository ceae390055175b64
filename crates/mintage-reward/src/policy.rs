//! Fork-selected reward policy.

use serde::{Deserialize, Serialize};

use mintage_types::header::BlockHeader;
use mintage_types::staking::StakingInfo;
use mintage_types::Address;

use crate::config::RewardConfig;
use crate::fee::FeeBreakdown;
use crate::reward_spec::RewardSpec;
use crate::sources::ForkRules;
use crate::{legacy, stake, Result, RewardError};

/// Reward policy in force at a block height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPolicy {
    /// Three-way ratio split of minted amount plus fee.
    Legacy,
    /// Ratio split of the minted amount with a stake-weighted council pool.
    StakeWeighted,
}

/// Everything a policy needs to compute one block's rewards.
#[derive(Clone, Copy, Debug)]
pub struct PolicyInput<'a> {
    /// The finalized header.
    pub header: &'a BlockHeader,
    /// Config for the header's epoch.
    pub config: &'a RewardConfig,
    /// Fee totals after burning.
    pub fee: &'a FeeBreakdown,
    /// Fund A address supplied by the caller (legacy policy).
    pub fund_a: Address,
    /// Fund B address supplied by the caller (legacy policy).
    pub fund_b: Address,
    /// Staking snapshot (stake-weighted policy).
    pub staking: Option<&'a StakingInfo>,
}

impl RewardPolicy {
    /// Select the policy for `height`.
    pub fn select(forks: &dyn ForkRules, height: u64) -> Self {
        if forks.is_stake_weighted_active(height) {
            RewardPolicy::StakeWeighted
        } else {
            RewardPolicy::Legacy
        }
    }

    /// Whether the policy reads the staking snapshot.
    pub fn needs_staking_info(&self) -> bool {
        matches!(self, RewardPolicy::StakeWeighted)
    }

    /// Compute the block's reward spec under this policy.
    ///
    /// # Errors
    ///
    /// - [`RewardError::StakingInfoUnavailable`] if the stake-weighted policy
    ///   is given no snapshot
    /// - Distributor errors from [`legacy::reward_spec`] or [`stake::reward_spec`]
    pub fn compute_rewards(&self, input: &PolicyInput<'_>) -> Result<RewardSpec> {
        match self {
            RewardPolicy::Legacy => legacy::reward_spec(
                input.header,
                input.fee,
                input.config,
                input.fund_a,
                input.fund_b,
            ),
            RewardPolicy::StakeWeighted => {
                let staking = input
                    .staking
                    .ok_or_else(|| RewardError::StakingInfoUnavailable {
                        height: input.header.number,
                        reason: "no staking snapshot supplied".to_string(),
                    })?;
                stake::reward_spec(input.header, input.fee, input.config, staking)
            }
        }
    }
}

/// Activation heights of reward-related hard forks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkSchedule {
    /// First block using stake-weighted rewards; `None` if never activated.
    #[serde(default)]
    pub stake_weighted_block: Option<u64>,
}

impl ForkSchedule {
    /// Schedule activating stake-weighted rewards at `height`.
    pub fn stake_weighted_from(height: u64) -> Self {
        Self {
            stake_weighted_block: Some(height),
        }
    }
}

impl ForkRules for ForkSchedule {
    fn is_stake_weighted_active(&self, height: u64) -> bool {
        self.stake_weighted_block
            .is_some_and(|activation| height >= activation)
    }
}
