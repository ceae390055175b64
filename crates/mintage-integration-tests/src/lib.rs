//! Integration tests for the mintage reward core.
//!
//! The tests under `tests/` drive [`mintage_reward::RewardEngine`] end to end
//! against the in-memory collaborators defined here.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p mintage-integration-tests
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use mintage_reward::sources::{
    BalanceAdder, ChainHead, GovernanceSource, SourceError, StakingSource,
};
use mintage_types::params::GovParamSet;
use mintage_types::staking::StakingInfo;
use mintage_types::{Address, Amount};
use parking_lot::Mutex;

/// Governance store holding parameter sets by activation height.
///
/// `params_at(h)` answers with the set registered at the greatest height
/// not above `h`. Heights above `ready_up_to` are reported as not yet
/// processed.
pub struct InMemoryGovernance {
    sets: BTreeMap<u64, GovParamSet>,
    ready_up_to: Option<u64>,
    queried: Mutex<Vec<u64>>,
    full_fetches: AtomicUsize,
}

impl InMemoryGovernance {
    /// Governance with a single parameter set effective from genesis.
    pub fn new(params: GovParamSet) -> Self {
        Self {
            sets: BTreeMap::from([(0, params)]),
            ready_up_to: None,
            queried: Mutex::new(Vec::new()),
            full_fetches: AtomicUsize::new(0),
        }
    }

    /// Register a parameter set effective from `height`.
    pub fn with_change(mut self, height: u64, params: GovParamSet) -> Self {
        self.sets.insert(height, params);
        self
    }

    /// Refuse queries above `height`.
    pub fn ready_up_to(mut self, height: u64) -> Self {
        self.ready_up_to = Some(height);
        self
    }

    /// Number of full parameter fetches.
    pub fn full_fetches(&self) -> usize {
        self.full_fetches.load(Ordering::SeqCst)
    }

    /// Every height queried so far, full fetches and epoch probes alike.
    pub fn queried_heights(&self) -> Vec<u64> {
        self.queried.lock().clone()
    }

    fn lookup(&self, height: u64) -> Result<&GovParamSet, SourceError> {
        self.queried.lock().push(height);
        if self.ready_up_to.is_some_and(|ready| height > ready) {
            return Err(SourceError::new(format!(
                "governance state at {height} not yet processed"
            )));
        }
        self.sets
            .range(..=height)
            .next_back()
            .map(|(_, params)| params)
            .ok_or_else(|| SourceError::new(format!("no parameters at {height}")))
    }
}

impl GovernanceSource for InMemoryGovernance {
    fn params_at(&self, height: u64) -> Result<GovParamSet, SourceError> {
        self.full_fetches.fetch_add(1, Ordering::SeqCst);
        self.lookup(height).cloned()
    }

    fn epoch_length_at(&self, height: u64) -> Result<u64, SourceError> {
        Ok(self.lookup(height)?.epoch()?)
    }
}

/// Staking snapshots by block height; a missing entry is an error.
#[derive(Default)]
pub struct InMemoryStaking {
    snapshots: BTreeMap<u64, Arc<StakingInfo>>,
    fallback: Option<Arc<StakingInfo>>,
    calls: AtomicUsize,
}

impl InMemoryStaking {
    /// A source with no snapshots.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A source answering every height with `info`.
    pub fn always(info: StakingInfo) -> Self {
        Self {
            fallback: Some(Arc::new(info)),
            ..Self::default()
        }
    }

    /// Register a snapshot for exactly `height`.
    pub fn with_snapshot(mut self, height: u64, info: StakingInfo) -> Self {
        self.snapshots.insert(height, Arc::new(info));
        self
    }

    /// Number of snapshot requests.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StakingSource for InMemoryStaking {
    fn staking_info_at(&self, height: u64) -> Result<Arc<StakingInfo>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .get(&height)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| SourceError::new(format!("no staking snapshot at {height}")))
    }
}

/// Adjustable chain head.
#[derive(Default)]
pub struct FixedHead(AtomicU64);

impl FixedHead {
    /// Head at `number`.
    pub fn at(number: u64) -> Self {
        Self(AtomicU64::new(number))
    }

    /// Move the head.
    pub fn set(&self, number: u64) {
        self.0.store(number, Ordering::SeqCst);
    }
}

impl ChainHead for FixedHead {
    fn head_number(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Balance sink recording every credit in call order.
#[derive(Default, Debug)]
pub struct RecordingBalances {
    /// Credits in the order they were applied.
    pub credits: Vec<(Address, Amount)>,
}

impl RecordingBalances {
    /// Current balance of `addr`.
    pub fn balance_of(&self, addr: &Address) -> Amount {
        self.credits
            .iter()
            .filter(|(a, _)| a == addr)
            .fold(Amount::zero(), |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Sum of all credits.
    pub fn total(&self) -> Amount {
        self.credits
            .iter()
            .fold(Amount::zero(), |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

impl BalanceAdder for RecordingBalances {
    fn add_balance(&mut self, addr: Address, amount: Amount) {
        self.credits.push((addr, amount));
    }
}
