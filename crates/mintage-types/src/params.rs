//! Raw governance parameters.
//!
//! Governance hands the reward core a weakly-typed key/value map. The typed
//! accessors here are the only way values leave the map; the reward crate
//! decodes everything it needs into its own config type at the resolver
//! boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Amount, Result, TypesError};

/// Governance parameter keys read by the reward core.
pub mod keys {
    /// Epoch length in blocks.
    pub const EPOCH: &str = "istanbul.epoch";
    /// Minted amount per block, decimal string.
    pub const MINTING_AMOUNT: &str = "reward.mintingamount";
    /// Three-way ratio `"cn/poc/kir"`.
    pub const RATIO: &str = "reward.ratio";
    /// Stake split `"basic/stake"` of the proposer share.
    pub const STAKE_RATIO: &str = "reward.stakeratio";
    /// Minimum staking amount for stake shares.
    pub const MINIMUM_STAKE: &str = "reward.minimumstake";
    /// Whether transaction fees are folded into the block reward.
    pub const DEFERRED_TX_FEE: &str = "reward.deferredtxfee";
    /// Static gas unit price used before the fee market.
    pub const UNIT_PRICE: &str = "governance.unitprice";
}

/// A governance parameter set effective at one block height.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GovParamSet {
    items: BTreeMap<String, Value>,
}

impl GovParamSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.items.insert(key.to_string(), value.into());
    }

    /// Raw access to a parameter.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    /// Iterate all parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.items.iter()
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.items
            .get(key)
            .ok_or_else(|| TypesError::MissingParam(key.to_string()))
    }

    /// Read an unsigned integer stored as a JSON number or a decimal string.
    pub fn u64(&self, key: &str) -> Result<u64> {
        match self.require(key)? {
            Value::Number(n) => n.as_u64().ok_or_else(|| invalid(key, "not an unsigned integer")),
            Value::String(s) => s
                .parse::<u64>()
                .map_err(|e| invalid(key, &e.to_string())),
            other => Err(invalid(key, &format!("unexpected type {}", type_name(other)))),
        }
    }

    /// Read a boolean.
    pub fn bool(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(invalid(key, &format!("unexpected type {}", type_name(other)))),
        }
    }

    /// Read a string.
    pub fn str(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            Value::String(s) => Ok(s.as_str()),
            other => Err(invalid(key, &format!("unexpected type {}", type_name(other)))),
        }
    }

    /// Read an amount stored as a decimal string or a JSON number.
    pub fn amount(&self, key: &str) -> Result<Amount> {
        match self.require(key)? {
            Value::Number(n) => n
                .as_u64()
                .map(Amount::from)
                .ok_or_else(|| invalid(key, "not an unsigned integer")),
            Value::String(s) => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid(key, "not a decimal integer"));
                }
                Amount::from_dec_str(s).map_err(|e| invalid(key, &format!("{e:?}")))
            }
            other => Err(invalid(key, &format!("unexpected type {}", type_name(other)))),
        }
    }

    /// Epoch length in blocks.
    pub fn epoch(&self) -> Result<u64> {
        self.u64(keys::EPOCH)
    }

    /// Minted amount per block.
    pub fn minting_amount(&self) -> Result<Amount> {
        self.amount(keys::MINTING_AMOUNT)
    }

    /// The raw `"cn/poc/kir"` ratio string.
    pub fn ratio(&self) -> Result<&str> {
        self.str(keys::RATIO)
    }

    /// The raw `"basic/stake"` split, if governance has set one.
    pub fn stake_ratio(&self) -> Result<Option<&str>> {
        match self.items.get(keys::STAKE_RATIO) {
            None => Ok(None),
            Some(_) => self.str(keys::STAKE_RATIO).map(Some),
        }
    }

    /// Minimum staking amount, if governance has set one.
    pub fn minimum_stake(&self) -> Result<Option<u64>> {
        match self.items.get(keys::MINIMUM_STAKE) {
            None => Ok(None),
            Some(_) => self.u64(keys::MINIMUM_STAKE).map(Some),
        }
    }

    /// Static gas unit price.
    pub fn unit_price(&self) -> Result<Amount> {
        self.amount(keys::UNIT_PRICE)
    }

    /// Whether fees are folded into the block reward. Defaults to `true`.
    pub fn deferred_tx_fee(&self) -> Result<bool> {
        match self.items.get(keys::DEFERRED_TX_FEE) {
            None => Ok(true),
            Some(_) => self.bool(keys::DEFERRED_TX_FEE),
        }
    }
}

fn invalid(key: &str, reason: &str) -> TypesError {
    TypesError::InvalidParam {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GovParamSet {
        GovParamSet::new()
            .with(keys::EPOCH, 604_800u64)
            .with(keys::MINTING_AMOUNT, "9600000000000000000")
            .with(keys::RATIO, "34/54/12")
            .with(keys::UNIT_PRICE, 25_000_000_000u64)
            .with(keys::DEFERRED_TX_FEE, true)
    }

    #[test]
    fn test_typed_accessors() {
        let params = sample();
        assert_eq!(params.epoch().expect("epoch"), 604_800);
        assert_eq!(
            params.minting_amount().expect("minting"),
            Amount::from(9_600_000_000_000_000_000u64)
        );
        assert_eq!(params.ratio().expect("ratio"), "34/54/12");
        assert_eq!(
            params.unit_price().expect("unit price"),
            Amount::from(25_000_000_000u64)
        );
        assert!(params.deferred_tx_fee().expect("deferred"));
        assert_eq!(params.stake_ratio().expect("stake ratio"), None);
        assert_eq!(params.minimum_stake().expect("min stake"), None);
    }

    #[test]
    fn test_missing_param() {
        let params = GovParamSet::new();
        assert!(matches!(params.epoch(), Err(TypesError::MissingParam(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let params = GovParamSet::new()
            .with(keys::EPOCH, "thirty")
            .with(keys::RATIO, 34u64)
            .with(keys::DEFERRED_TX_FEE, "yes");
        assert!(params.epoch().is_err());
        assert!(params.ratio().is_err());
        assert!(params.deferred_tx_fee().is_err());
    }

    #[test]
    fn test_amount_rejects_hex_and_signs() {
        let params = GovParamSet::new()
            .with(keys::MINTING_AMOUNT, "0x10")
            .with(keys::UNIT_PRICE, "-5");
        assert!(params.minting_amount().is_err());
        assert!(params.unit_price().is_err());
    }

    #[test]
    fn test_amount_beyond_u64() {
        let params = GovParamSet::new().with(keys::MINTING_AMOUNT, "100000000000000000000000");
        let expected = Amount::from(100_000u64) * Amount::from(1_000_000_000_000_000_000u64);
        assert_eq!(params.minting_amount().expect("minting"), expected);
    }

    #[test]
    fn test_json_is_flat_map() {
        let params = sample();
        let json = serde_json::to_value(&params).expect("serialize");
        assert_eq!(json["reward.ratio"], "34/54/12");
        let parsed: GovParamSet = serde_json::from_value(json).expect("parse");
        assert_eq!(parsed, params);
    }
}
