//! Per-block reward dispatcher.
//!
//! Resolves the epoch config, settles the fee, selects the policy for the
//! block height and computes the full [`RewardSpec`] before any balance is
//! touched. A failure at any step leaves the balance sink untouched.

use std::sync::Arc;

use mintage_types::header::BlockHeader;
use mintage_types::params::GovParamSet;
use mintage_types::{Address, Amount};
use tracing::{debug, warn};

use crate::cache::{CacheStats, RewardConfigCache};
use crate::config::RewardConfig;
use crate::fee;
use crate::policy::{PolicyInput, RewardPolicy};
use crate::reward_spec::RewardSpec;
use crate::settings::EngineSettings;
use crate::sources::{
    BalanceAdder, ChainHead, ForkRules, GovernanceSource, SourceError, StakingSource,
};
use crate::{Result, RewardError};

/// Governance view that never asks beyond the block after the head.
struct HeadClamped<'a> {
    inner: &'a dyn GovernanceSource,
    head: u64,
}

impl HeadClamped<'_> {
    fn clamp(&self, height: u64) -> u64 {
        if height > self.head {
            self.head.saturating_add(1)
        } else {
            height
        }
    }
}

impl GovernanceSource for HeadClamped<'_> {
    fn params_at(&self, height: u64) -> std::result::Result<GovParamSet, SourceError> {
        self.inner.params_at(self.clamp(height))
    }

    fn epoch_length_at(&self, height: u64) -> std::result::Result<u64, SourceError> {
        self.inner.epoch_length_at(self.clamp(height))
    }
}

/// Block reward engine.
pub struct RewardEngine {
    governance: Arc<dyn GovernanceSource>,
    staking: Arc<dyn StakingSource>,
    forks: Arc<dyn ForkRules>,
    head: Option<Arc<dyn ChainHead>>,
    configs: RewardConfigCache,
}

impl RewardEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        governance: Arc<dyn GovernanceSource>,
        staking: Arc<dyn StakingSource>,
        forks: Arc<dyn ForkRules>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            governance,
            staking,
            forks,
            head: None,
            configs: RewardConfigCache::new(settings.cache.capacity),
        }
    }

    /// Create an engine whose fork activation comes from `settings.forks`.
    pub fn from_settings(
        governance: Arc<dyn GovernanceSource>,
        staking: Arc<dyn StakingSource>,
        settings: &EngineSettings,
    ) -> Self {
        Self::new(governance, staking, Arc::new(settings.forks), settings)
    }

    /// Clamp governance queries to the block after `head`.
    pub fn with_chain_head(mut self, head: Arc<dyn ChainHead>) -> Self {
        self.head = Some(head);
        self
    }

    /// Reward config for the epoch containing `block_number`.
    ///
    /// With a chain head attached, a block beyond `head + 1` is resolved from
    /// parameters read at `head + 1` and is not cached, so later blocks of
    /// that epoch fetch again once the head has caught up.
    ///
    /// # Errors
    ///
    /// See [`RewardConfigCache::get`].
    pub fn config_at(&self, block_number: u64) -> Result<Arc<RewardConfig>> {
        match &self.head {
            Some(head) => {
                let clamped = HeadClamped {
                    inner: self.governance.as_ref(),
                    head: head.head_number(),
                };
                let cacheable = block_number <= clamped.head.saturating_add(1);
                self.configs.resolve(block_number, &clamped, cacheable)
            }
            None => self.configs.get(block_number, self.governance.as_ref()),
        }
    }

    /// Policy in force at `height`.
    pub fn policy_at(&self, height: u64) -> RewardPolicy {
        RewardPolicy::select(self.forks.as_ref(), height)
    }

    /// Compute the rewards of `header` without touching any balance.
    ///
    /// `fund_a` and `fund_b` are used by the legacy policy; the
    /// stake-weighted policy credits the funds named in the staking snapshot.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigUnavailable`] / [`RewardError::ConfigParse`] /
    ///   [`RewardError::ConfigInvariantViolation`] from config resolution
    /// - [`RewardError::StakingInfoUnavailable`] if the stake-weighted policy
    ///   applies and no snapshot is available
    /// - [`RewardError::ArithmeticOverflow`] from the calculation
    pub fn compute_rewards(
        &self,
        header: &BlockHeader,
        fund_a: Address,
        fund_b: Address,
    ) -> Result<RewardSpec> {
        let config = self.config_at(header.number)?;

        if !config.deferred_tx_fee {
            return mint_native(header, &config);
        }

        let fee = fee::settle_fee(header, &config)?;
        let policy = self.policy_at(header.number);

        let staking = if policy.needs_staking_info() {
            let info = self.staking.staking_info_at(header.number).map_err(|e| {
                warn!(number = header.number, err = %e, "staking info lookup failed");
                RewardError::StakingInfoUnavailable {
                    height: header.number,
                    reason: e.to_string(),
                }
            })?;
            Some(info)
        } else {
            None
        };

        debug!(
            number = header.number,
            ?policy,
            total_fee = %fee.total,
            burnt = %fee.burnt,
            "computing block reward"
        );

        policy.compute_rewards(&PolicyInput {
            header,
            config: &config,
            fee: &fee,
            fund_a,
            fund_b,
            staking: staking.as_deref(),
        })
    }

    /// Compute the rewards of `header` and credit them to `balances`.
    ///
    /// Balances are only touched once the whole computation has succeeded.
    ///
    /// # Errors
    ///
    /// See [`RewardEngine::compute_rewards`].
    pub fn distribute_block_reward(
        &self,
        balances: &mut dyn BalanceAdder,
        header: &BlockHeader,
        fund_a: Address,
        fund_b: Address,
    ) -> Result<RewardSpec> {
        let spec = self.compute_rewards(header, fund_a, fund_b)?;
        spec.apply(balances);
        Ok(spec)
    }

    /// Config cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.configs.stats()
    }
}

/// Mint the block reward to the proposer alone.
///
/// Used when fees are paid out during transaction execution rather than
/// folded into the block reward.
///
/// # Errors
///
/// - [`RewardError::ArithmeticOverflow`] if the credit exceeds 256 bits
pub fn mint_native(header: &BlockHeader, config: &RewardConfig) -> Result<RewardSpec> {
    let mut spec = RewardSpec {
        minted: config.minting_amount,
        total_fee: Amount::zero(),
        burnt_fee: Amount::zero(),
        proposer: config.minting_amount,
        ..Default::default()
    };
    spec.credit(header.rewardbase, config.minting_amount)?;
    Ok(spec)
}
