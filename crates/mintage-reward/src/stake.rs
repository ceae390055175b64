//! Stake-weighted reward distribution.
//!
//! The minted amount is split by the ratio triple; the proposer (cn) share
//! is then split into a basic part kept by the proposer and a stake pool
//! shared among council members in proportion to their stake above the
//! minimum:
//!
//! ```text
//! cn     = minted * cn  / total        basic = cn * basic_ratio / split_total
//! fund_a = minted * poc / total        stake = cn * stake_ratio / split_total
//! fund_b = minted * kir / total
//!
//! share_i = stake * excess_i / sum(excess)    excess_i = amount_i - min_staking
//! ```
//!
//! Every floor-division residue ends up in fund A, so the credits add up to
//! exactly `minted`. The one exception is the proposer floor: when the
//! block's net fee exceeds `basic`, the proposer receives the fee instead.

use std::collections::BTreeMap;

use tracing::debug;

use mintage_types::header::BlockHeader;
use mintage_types::staking::StakingInfo;
use mintage_types::{Address, Amount};

use crate::config::RewardConfig;
use crate::fee::FeeBreakdown;
use crate::math;
use crate::reward_spec::RewardSpec;
use crate::sources::BalanceAdder;
use crate::{Result, RewardError};

/// First-stage split of the minted amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitReward {
    /// Proposer's basic part, after the proposer floor.
    pub basic: Amount,
    /// Pool shared by stake.
    pub stake: Amount,
    /// Fund A share before residues are added.
    pub fund_a: Amount,
    /// Fund B share.
    pub fund_b: Amount,
    /// `minted - basic - stake - fund_a - fund_b`, computed before the proposer floor.
    pub remainder: Amount,
}

/// Second-stage division of the stake pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeShares {
    /// Share per reward address.
    pub shares: BTreeMap<Address, Amount>,
    /// Part of the pool not assigned to any rewardee.
    pub remainder: Amount,
}

/// Split the minted amount into basic, stake and fund shares.
///
/// `fee` is the block's distributable fee; when it exceeds `basic` it
/// replaces `basic` (it is not added).
///
/// # Errors
///
/// - [`RewardError::ConfigInvariantViolation`] if no stake split is configured
///   or a ratio total is zero
pub fn split_reward(config: &RewardConfig, fee: Amount) -> Result<SplitReward> {
    let split = config.stake_split.ok_or_else(|| {
        RewardError::ConfigInvariantViolation(
            "stake-weighted rewards require a stake split".to_string(),
        )
    })?;
    let minted = config.minting_amount;

    let cn = math::mul_div(minted, config.cn_ratio, config.total_ratio)?;
    let fund_a = math::mul_div(minted, config.poc_ratio, config.total_ratio)?;
    let fund_b = math::mul_div(minted, config.kir_ratio, config.total_ratio)?;

    let mut basic = math::mul_div(cn, split.basic_ratio, split.total_ratio)?;
    let stake = math::mul_div(cn, split.stake_ratio, split.total_ratio)?;

    let mut remainder = math::sub(minted, basic)?;
    remainder = math::sub(remainder, stake)?;
    remainder = math::sub(remainder, fund_a)?;
    remainder = math::sub(remainder, fund_b)?;

    if fee > basic {
        basic = fee;
    }

    debug!(
        basic = %basic,
        stake = %stake,
        fund_a = %fund_a,
        fund_b = %fund_b,
        remainder = %remainder,
        "split stake-weighted reward"
    );

    Ok(SplitReward {
        basic,
        stake,
        fund_a,
        fund_b,
        remainder,
    })
}

/// Divide `stake` among council members staking more than `min_staking`.
///
/// Members are taken from the snapshot consolidated by reward address. Each
/// share is floored independently; the residues, or the whole pool when no
/// member qualifies, are returned as the remainder.
///
/// # Errors
///
/// - [`RewardError::ArithmeticOverflow`] on a share that exceeds 256 bits
pub fn calc_stake_shares(
    stake: Amount,
    min_staking: u64,
    staking: &StakingInfo,
) -> Result<StakeShares> {
    let min = Amount::from(min_staking);
    let excesses: Vec<(Address, Amount)> = staking
        .consolidated_nodes()
        .into_iter()
        .filter(|node| node.staking_amount > min)
        .map(|node| (node.reward_addr, node.staking_amount - min))
        .collect();

    let total_excess = excesses
        .iter()
        .try_fold(Amount::zero(), |acc, (_, excess)| math::add(acc, *excess))?;

    if total_excess.is_zero() {
        debug!(min_staking, stake = %stake, "no council member above minimum stake");
        return Ok(StakeShares {
            shares: BTreeMap::new(),
            remainder: stake,
        });
    }

    let mut shares = BTreeMap::new();
    let mut remainder = stake;
    for (reward_addr, excess) in excesses {
        let reward = math::mul_div_amount(stake, excess, total_excess)?;
        remainder = math::sub(remainder, reward)?;
        let entry: &mut Amount = shares.entry(reward_addr).or_default();
        *entry = math::add(*entry, reward)?;
    }

    debug!(
        min_staking,
        stake = %stake,
        remainder = %remainder,
        rewardees = shares.len(),
        "calculated stake shares"
    );

    Ok(StakeShares { shares, remainder })
}

/// Build the stake-weighted [`RewardSpec`] for a block.
///
/// Fund addresses come from the staking snapshot.
///
/// # Errors
///
/// - [`RewardError::ConfigInvariantViolation`] if the config has no stake
///   split or no minimum stake
/// - [`RewardError::ArithmeticOverflow`] on overflowing credits
pub fn reward_spec(
    header: &BlockHeader,
    fee: &FeeBreakdown,
    config: &RewardConfig,
    staking: &StakingInfo,
) -> Result<RewardSpec> {
    let min_staking = config.min_staking.ok_or_else(|| {
        RewardError::ConfigInvariantViolation(
            "stake-weighted rewards require a minimum stake".to_string(),
        )
    })?;

    let split = split_reward(config, fee.distributable)?;
    let stake_shares = calc_stake_shares(split.stake, min_staking, staking)?;

    let fund_a = math::add(
        math::add(split.fund_a, split.remainder)?,
        stake_shares.remainder,
    )?;
    let stakers = stake_shares
        .shares
        .values()
        .try_fold(Amount::zero(), |acc, v| math::add(acc, *v))?;

    let mut spec = RewardSpec {
        minted: config.minting_amount,
        total_fee: fee.total,
        burnt_fee: fee.burnt,
        proposer: split.basic,
        stakers,
        fund_a,
        fund_b: split.fund_b,
        ..Default::default()
    };
    spec.credit(header.rewardbase, split.basic)?;
    spec.credit(staking.fund_a, fund_a)?;
    spec.credit(staking.fund_b, split.fund_b)?;
    for (rewardee, amount) in &stake_shares.shares {
        spec.credit(*rewardee, *amount)?;
    }

    debug!(
        number = header.number,
        proposer = %spec.proposer,
        stakers = %spec.stakers,
        fund_a = %spec.fund_a,
        fund_b = %spec.fund_b,
        "stake-weighted reward assembled"
    );

    Ok(spec)
}

/// Credit the stake-weighted reward of a block.
///
/// `fee` is the distributable fee, after any burning.
///
/// # Errors
///
/// Propagates [`reward_spec`] errors; nothing is credited on error.
pub fn distribute(
    balances: &mut dyn BalanceAdder,
    header: &BlockHeader,
    fee: Amount,
    config: &RewardConfig,
    staking: &StakingInfo,
) -> Result<()> {
    let breakdown = FeeBreakdown {
        total: fee,
        burnt: Amount::zero(),
        distributable: fee,
    };
    reward_spec(header, &breakdown, config, staking)?.apply(balances);
    Ok(())
}
