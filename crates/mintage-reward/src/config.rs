//! Typed reward configuration.
//!
//! Governance publishes reward parameters as an untyped map. They are decoded
//! here, once per epoch, into a [`RewardConfig`]; the distributors never see
//! the raw map.
//!
//! ## Ratio strings
//!
//! ```text
//! reward.ratio       "cn/poc/kir"    e.g. "34/54/12"
//! reward.stakeratio  "basic/stake"   e.g. "20/80"
//! ```
//!
//! Each component is a non-negative decimal integer. The total of a ratio is
//! the sum of its components and must be non-zero.

use serde::{Deserialize, Serialize};

use mintage_types::params::GovParamSet;
use mintage_types::Amount;

use crate::{Result, RewardError};

/// Split of the proposer (cn) share into a basic part and a stake pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeSplit {
    /// Share kept by the proposer.
    pub basic_ratio: u64,
    /// Share distributed by stake.
    pub stake_ratio: u64,
    /// `basic_ratio + stake_ratio`.
    pub total_ratio: u64,
}

impl StakeSplit {
    /// Build a split whose total is the sum of its parts.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigInvariantViolation`] if the total is zero or overflows
    pub fn new(basic_ratio: u64, stake_ratio: u64) -> Result<Self> {
        let total_ratio = basic_ratio.checked_add(stake_ratio).ok_or_else(|| {
            RewardError::ConfigInvariantViolation("stake split total overflows".to_string())
        })?;
        let split = Self {
            basic_ratio,
            stake_ratio,
            total_ratio,
        };
        split.validate()?;
        Ok(split)
    }

    /// Check that the parts add up to a non-zero total.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigInvariantViolation`] on a zero or mismatched total
    pub fn validate(&self) -> Result<()> {
        if self.total_ratio == 0 {
            return Err(RewardError::ConfigInvariantViolation(
                "stake split total ratio is zero".to_string(),
            ));
        }
        if self.basic_ratio.checked_add(self.stake_ratio) != Some(self.total_ratio) {
            return Err(RewardError::ConfigInvariantViolation(format!(
                "stake split {}/{} does not sum to {}",
                self.basic_ratio, self.stake_ratio, self.total_ratio
            )));
        }
        Ok(())
    }
}

/// Reward parameters for one epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Epoch-start block the config was resolved for.
    pub block_num: u64,
    /// Amount minted per block.
    pub minting_amount: Amount,
    /// Proposer (council) share.
    pub cn_ratio: u64,
    /// Fund A (PoC) share.
    pub poc_ratio: u64,
    /// Fund B (KIR) share.
    pub kir_ratio: u64,
    /// `cn_ratio + poc_ratio + kir_ratio`.
    pub total_ratio: u64,
    /// Static gas price used when a header has no base fee.
    pub unit_price: Amount,
    /// Split of the cn share, present once stake-weighted rewards are configured.
    pub stake_split: Option<StakeSplit>,
    /// Threshold above which stake earns a share of the stake pool.
    pub min_staking: Option<u64>,
    /// Whether fees are folded into the block reward.
    pub deferred_tx_fee: bool,
}

impl RewardConfig {
    /// Build a config from a ratio triple; the total is the sum of the parts.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigInvariantViolation`] if the total is zero or overflows
    pub fn new(minting_amount: Amount, ratio: (u64, u64, u64), unit_price: Amount) -> Result<Self> {
        let (cn_ratio, poc_ratio, kir_ratio) = ratio;
        let config = Self {
            block_num: 0,
            minting_amount,
            cn_ratio,
            poc_ratio,
            kir_ratio,
            total_ratio: ratio_total(&[cn_ratio, poc_ratio, kir_ratio])?,
            unit_price,
            stake_split: None,
            min_staking: None,
            deferred_tx_fee: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// Attach a stake split and the minimum stake.
    pub fn with_stake_split(mut self, split: StakeSplit, min_staking: u64) -> Self {
        self.stake_split = Some(split);
        self.min_staking = Some(min_staking);
        self
    }

    /// Decode governance parameters effective at `block_num`.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigParse`] for missing, mistyped or malformed parameters
    /// - [`RewardError::ConfigInvariantViolation`] for a zero ratio total
    pub fn from_params(block_num: u64, params: &GovParamSet) -> Result<Self> {
        let minting_amount = params.minting_amount()?;
        let (cn_ratio, poc_ratio, kir_ratio) = parse_reward_ratio(params.ratio()?)?;
        let unit_price = params.unit_price()?;

        let stake_split = match params.stake_ratio()? {
            Some(raw) => {
                let (basic, stake) = parse_stake_ratio(raw)?;
                Some(StakeSplit::new(basic, stake)?)
            }
            None => None,
        };

        let config = Self {
            block_num,
            minting_amount,
            cn_ratio,
            poc_ratio,
            kir_ratio,
            total_ratio: ratio_total(&[cn_ratio, poc_ratio, kir_ratio])?,
            unit_price,
            stake_split,
            min_staking: params.minimum_stake()?,
            deferred_tx_fee: params.deferred_tx_fee()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ratio invariants.
    ///
    /// # Errors
    ///
    /// - [`RewardError::ConfigInvariantViolation`] if a total is zero or the
    ///   parts do not add up to it
    pub fn validate(&self) -> Result<()> {
        if self.total_ratio == 0 {
            return Err(RewardError::ConfigInvariantViolation(
                "total ratio is zero".to_string(),
            ));
        }
        let sum = self
            .cn_ratio
            .checked_add(self.poc_ratio)
            .and_then(|s| s.checked_add(self.kir_ratio));
        if sum != Some(self.total_ratio) {
            return Err(RewardError::ConfigInvariantViolation(format!(
                "ratio {}/{}/{} does not sum to {}",
                self.cn_ratio, self.poc_ratio, self.kir_ratio, self.total_ratio
            )));
        }
        if let Some(split) = &self.stake_split {
            split.validate()?;
        }
        Ok(())
    }

    /// Render the ratio triple in governance form.
    pub fn ratio_string(&self) -> String {
        format!("{}/{}/{}", self.cn_ratio, self.poc_ratio, self.kir_ratio)
    }
}

/// Parse a `"cn/poc/kir"` ratio string.
///
/// # Errors
///
/// - [`RewardError::ConfigParse`] unless the string is exactly three
///   `/`-separated decimal integers
pub fn parse_reward_ratio(ratio: &str) -> Result<(u64, u64, u64)> {
    let parts = parse_components(ratio, 3)?;
    Ok((parts[0], parts[1], parts[2]))
}

/// Parse a `"basic/stake"` split string.
///
/// # Errors
///
/// - [`RewardError::ConfigParse`] unless the string is exactly two
///   `/`-separated decimal integers
pub fn parse_stake_ratio(ratio: &str) -> Result<(u64, u64)> {
    let parts = parse_components(ratio, 2)?;
    Ok((parts[0], parts[1]))
}

fn parse_components(ratio: &str, expected: usize) -> Result<Vec<u64>> {
    let parts: Vec<&str> = ratio.split('/').collect();
    if parts.len() != expected {
        return Err(RewardError::ConfigParse(format!(
            "invalid ratio format {ratio:?}: expected {expected} components"
        )));
    }

    parts
        .iter()
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RewardError::ConfigParse(format!(
                    "invalid ratio component {part:?} in {ratio:?}"
                )));
            }
            part.parse::<u64>().map_err(|e| {
                RewardError::ConfigParse(format!("invalid ratio component {part:?}: {e}"))
            })
        })
        .collect()
}

fn ratio_total(parts: &[u64]) -> Result<u64> {
    parts.iter().try_fold(0u64, |acc, part| {
        acc.checked_add(*part).ok_or_else(|| {
            RewardError::ConfigInvariantViolation("ratio total overflows".to_string())
        })
    })
}
