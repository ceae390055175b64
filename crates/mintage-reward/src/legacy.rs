//! Ratio-only reward distribution, in force before the stake-weighted fork.
//!
//! ```text
//! pool     = minted + fee
//! proposer = pool * cn  / total
//! fund_a   = pool * poc / total
//! fund_b   = pool * kir / total
//! ```
//!
//! Each share is floored independently and the residue is not reassigned,
//! so up to `total - 1` minimal units per share go uncredited. Historical
//! blocks depend on this exact behavior.

use mintage_types::header::BlockHeader;
use mintage_types::{Address, Amount};

use crate::config::RewardConfig;
use crate::fee::FeeBreakdown;
use crate::math;
use crate::reward_spec::RewardSpec;
use crate::sources::BalanceAdder;
use crate::Result;

/// The three legacy shares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyShares {
    /// Proposer share.
    pub proposer: Amount,
    /// Fund A share.
    pub fund_a: Amount,
    /// Fund B share.
    pub fund_b: Amount,
}

/// Split `minting_amount + fee` by the config's ratio triple.
///
/// # Errors
///
/// - [`crate::RewardError::ConfigInvariantViolation`] if the total ratio is zero
/// - [`crate::RewardError::ArithmeticOverflow`] if the pool exceeds 256 bits
pub fn split(config: &RewardConfig, fee: Amount) -> Result<LegacyShares> {
    let pool = math::add(config.minting_amount, fee)?;
    Ok(LegacyShares {
        proposer: math::mul_div(pool, config.cn_ratio, config.total_ratio)?,
        fund_a: math::mul_div(pool, config.poc_ratio, config.total_ratio)?,
        fund_b: math::mul_div(pool, config.kir_ratio, config.total_ratio)?,
    })
}

/// Build the legacy [`RewardSpec`] for a block.
///
/// # Errors
///
/// Propagates [`split`] errors.
pub fn reward_spec(
    header: &BlockHeader,
    fee: &FeeBreakdown,
    config: &RewardConfig,
    fund_a: Address,
    fund_b: Address,
) -> Result<RewardSpec> {
    let shares = split(config, fee.distributable)?;

    tracing::debug!(
        number = header.number,
        proposer = %shares.proposer,
        fund_a = %shares.fund_a,
        fund_b = %shares.fund_b,
        "legacy reward split"
    );

    let mut spec = RewardSpec {
        minted: config.minting_amount,
        total_fee: fee.total,
        burnt_fee: fee.burnt,
        proposer: shares.proposer,
        stakers: Amount::zero(),
        fund_a: shares.fund_a,
        fund_b: shares.fund_b,
        ..Default::default()
    };
    spec.credit(header.rewardbase, shares.proposer)?;
    spec.credit(fund_a, shares.fund_a)?;
    spec.credit(fund_b, shares.fund_b)?;
    Ok(spec)
}

/// Credit the legacy shares of `minting_amount + fee` to the proposer and funds.
///
/// `fee` is the distributable fee, after any burning.
///
/// # Errors
///
/// Propagates [`split`] errors; nothing is credited on error.
pub fn distribute(
    balances: &mut dyn BalanceAdder,
    header: &BlockHeader,
    fee: Amount,
    config: &RewardConfig,
    fund_a: Address,
    fund_b: Address,
) -> Result<()> {
    let breakdown = FeeBreakdown {
        total: fee,
        burnt: Amount::zero(),
        distributable: fee,
    };
    reward_spec(header, &breakdown, config, fund_a, fund_b)?.apply(balances);
    Ok(())
}
