//! Transaction fee and fee burning.
//!
//! ```text
//! total_fee = gas_used * base_fee      (fee market active)
//!           = gas_used * unit_price    (otherwise)
//! burnt     = total_fee / 2            (floor, fee market only)
//! remaining = total_fee - burnt        (ceiling half)
//! ```

use serde::{Deserialize, Serialize};

use mintage_types::header::BlockHeader;
use mintage_types::Amount;

use crate::config::RewardConfig;
use crate::{Result, RewardError};

/// Fee totals for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Gas used times the effective price.
    pub total: Amount,
    /// Portion removed from circulation.
    pub burnt: Amount,
    /// Portion left for distribution.
    pub distributable: Amount,
}

/// Total transaction fee of a block.
///
/// # Errors
///
/// - [`RewardError::ArithmeticOverflow`] if the product exceeds 256 bits
pub fn total_fee(header: &BlockHeader, config: &RewardConfig) -> Result<Amount> {
    let price = header.base_fee.unwrap_or(config.unit_price);
    Amount::from(header.gas_used)
        .checked_mul(price)
        .ok_or(RewardError::ArithmeticOverflow)
}

/// Burn half of a fee, returning what remains.
///
/// The burnt half is rounded down, so the remainder is the ceiling half.
pub fn burn_fee(amount: Amount) -> Amount {
    amount - burnt_portion(amount)
}

/// The half of a fee that is burnt.
pub fn burnt_portion(amount: Amount) -> Amount {
    amount / 2
}

/// Compute the block fee and apply burning when the header carries a base fee.
///
/// # Errors
///
/// - [`RewardError::ArithmeticOverflow`] if the fee exceeds 256 bits
pub fn settle_fee(header: &BlockHeader, config: &RewardConfig) -> Result<FeeBreakdown> {
    let total = total_fee(header, config)?;
    let burnt = if header.is_fee_market() {
        burnt_portion(total)
    } else {
        Amount::zero()
    };
    Ok(FeeBreakdown {
        total,
        burnt,
        distributable: total - burnt,
    })
}
