//! # mintage-reward
//!
//! Deterministic block-reward computation.
//!
//! Given a finalized header, the governance parameters effective at its
//! height and the council staking snapshot, computes how much native
//! currency is minted and how the block's fees are burnt and distributed
//! between the proposer, stake-weighted council rewardees and two funds.
//! Every validating node must reproduce the same result bit for bit, so all
//! arithmetic is integer floor division over 256-bit amounts.
//!
//! ## Modules
//!
//! - [`config`] - Typed reward config decoded from governance parameters
//! - [`cache`] - Epoch-keyed config cache
//! - [`fee`] - Transaction fee and fee burning
//! - [`legacy`] - Ratio-only distribution (before the stake-weighted fork)
//! - [`stake`] - Stake-weighted distribution
//! - [`policy`] - Fork-selected reward policy
//! - [`engine`] - Per-block dispatcher
//! - [`reward_spec`] - Computed balance deltas
//! - [`sources`] - External collaborator interfaces
//! - [`settings`] - Engine settings (TOML)

pub mod cache;
pub mod config;
pub mod engine;
pub mod fee;
pub mod legacy;
pub mod policy;
pub mod reward_spec;
pub mod settings;
pub mod sources;
pub mod stake;

mod math;

pub use config::{RewardConfig, StakeSplit};
pub use engine::RewardEngine;
pub use policy::{ForkSchedule, RewardPolicy};
pub use reward_spec::RewardSpec;
pub use settings::EngineSettings;

/// Error types for reward computation.
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    /// A governance parameter could not be decoded.
    #[error("reward config parse error: {0}")]
    ConfigParse(String),

    /// Decoded parameters violate a reward config invariant.
    #[error("reward config invariant violated: {0}")]
    ConfigInvariantViolation(String),

    /// Governance parameters are not available at the requested height.
    #[error("reward config unavailable at block {height}: {reason}")]
    ConfigUnavailable {
        /// The requested height.
        height: u64,
        /// Reason reported by the governance source.
        reason: String,
    },

    /// The staking snapshot is not available at the requested height.
    #[error("staking info unavailable at block {height}: {reason}")]
    StakingInfoUnavailable {
        /// The requested height.
        height: u64,
        /// Reason reported by the staking source.
        reason: String,
    },

    /// An amount does not fit in 256 bits.
    #[error("arithmetic overflow in reward calculation")]
    ArithmeticOverflow,

    /// Engine settings could not be loaded.
    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),
}

impl From<mintage_types::TypesError> for RewardError {
    fn from(err: mintage_types::TypesError) -> Self {
        RewardError::ConfigParse(err.to_string())
    }
}

/// Convenience result type for reward computation.
pub type Result<T> = std::result::Result<T, RewardError>;
