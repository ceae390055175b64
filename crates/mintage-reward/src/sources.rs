//! External collaborators.
//!
//! The reward core reads governance parameters, staking snapshots, fork
//! activation and the chain head through these traits, and writes its
//! output through [`BalanceAdder`]. Their storage and concurrency are the
//! implementor's concern; every call is synchronous.

use std::sync::Arc;

use mintage_types::params::GovParamSet;
use mintage_types::staking::StakingInfo;
use mintage_types::{Address, Amount, TypesError};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The requested state is not available (yet); the caller may retry.
    #[error("{0}")]
    Unavailable(String),

    /// The state is available but a value in it does not decode.
    #[error(transparent)]
    Decode(#[from] TypesError),
}

impl SourceError {
    /// An [`SourceError::Unavailable`] error from any message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Governance parameter source.
pub trait GovernanceSource: Send + Sync {
    /// Full parameter set effective at `height`.
    ///
    /// Fails when the node has not processed the governance state at that
    /// height yet.
    fn params_at(&self, height: u64) -> Result<GovParamSet, SourceError>;

    /// Epoch length effective at `height`.
    ///
    /// Called on every config lookup to find the cache key, so sources with
    /// an expensive `params_at` should override it. A missing or malformed
    /// epoch length is a [`SourceError::Decode`].
    fn epoch_length_at(&self, height: u64) -> Result<u64, SourceError> {
        Ok(self.params_at(height)?.epoch()?)
    }
}

/// Staking snapshot source.
pub trait StakingSource: Send + Sync {
    /// Snapshot in effect for the block at `height`.
    fn staking_info_at(&self, height: u64) -> Result<Arc<StakingInfo>, SourceError>;
}

/// Hard-fork activation predicate.
pub trait ForkRules: Send + Sync {
    /// Whether the stake-weighted reward policy applies at `height`.
    fn is_stake_weighted_active(&self, height: u64) -> bool;
}

/// Current chain head, used to clamp forward-looking governance queries.
pub trait ChainHead: Send + Sync {
    /// Number of the latest processed block.
    fn head_number(&self) -> u64;
}

/// Balance mutation sink. Must commit atomically with the block.
pub trait BalanceAdder {
    /// Credit `amount` to `addr`.
    fn add_balance(&mut self, addr: Address, amount: Amount);
}
