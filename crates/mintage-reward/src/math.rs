//! Ratio arithmetic.

use mintage_types::{Amount, U512};

use crate::{Result, RewardError};

/// `value * numerator / denominator`, floor division, with a 512-bit
/// intermediate product.
///
/// # Errors
///
/// - [`RewardError::ConfigInvariantViolation`] if `denominator` is zero
/// - [`RewardError::ArithmeticOverflow`] if the quotient exceeds 256 bits
pub(crate) fn mul_div(value: Amount, numerator: u64, denominator: u64) -> Result<Amount> {
    if denominator == 0 {
        return Err(RewardError::ConfigInvariantViolation(
            "ratio denominator is zero".to_string(),
        ));
    }
    mul_div_amount(value, Amount::from(numerator), Amount::from(denominator))
}

/// [`mul_div`] with amount-sized numerator and denominator.
pub(crate) fn mul_div_amount(value: Amount, numerator: Amount, denominator: Amount) -> Result<Amount> {
    if denominator.is_zero() {
        return Err(RewardError::ConfigInvariantViolation(
            "ratio denominator is zero".to_string(),
        ));
    }
    let product = value.full_mul(numerator);
    let quotient = product / U512::from(denominator);
    Amount::try_from(quotient).map_err(|_| RewardError::ArithmeticOverflow)
}

/// Checked subtraction.
pub(crate) fn sub(lhs: Amount, rhs: Amount) -> Result<Amount> {
    lhs.checked_sub(rhs).ok_or(RewardError::ArithmeticOverflow)
}

/// Checked addition.
pub(crate) fn add(lhs: Amount, rhs: Amount) -> Result<Amount> {
    lhs.checked_add(rhs).ok_or(RewardError::ArithmeticOverflow)
}
