//! # mintage-types
//!
//! Shared domain types consumed by the block-reward core.
//!
//! ## Modules
//!
//! - [`header`] - Header facts read at block finalization
//! - [`params`] - Raw governance parameter map and its keys
//! - [`staking`] - Council staking snapshot and reward-address consolidation

pub mod header;
pub mod params;
pub mod staking;

pub use primitive_types::{H160, U256, U512};

/// A 20-byte account address.
pub type Address = H160;

/// An amount of native currency in its minimal unit.
pub type Amount = U256;

/// Error types for domain type decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// A required governance parameter is absent.
    #[error("missing governance parameter {0}")]
    MissingParam(String),

    /// A governance parameter holds a value of the wrong shape.
    #[error("governance parameter {key} has invalid value: {reason}")]
    InvalidParam {
        /// The parameter key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An address string could not be decoded.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Convenience result type for domain type decoding.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Decode a hex address, with or without the `0x` prefix.
///
/// # Errors
///
/// - [`TypesError::InvalidAddress`] if the string is not 40 hex characters
pub fn address_from_hex(s: &str) -> Result<Address> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| TypesError::InvalidAddress(e.to_string()))?;
    if bytes.len() != Address::len_bytes() {
        return Err(TypesError::InvalidAddress(format!(
            "expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

/// Lowercase `0x`-prefixed hex rendering of an address.
pub fn address_to_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr.as_bytes()))
}
