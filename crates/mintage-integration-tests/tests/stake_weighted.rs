//! Integration test: stake-weighted block rewards and the fork switch.
//!
//! Exercises the dispatcher after the stake-weighted fork:
//! 1. Council consolidation by reward address
//! 2. Pro-rata stake shares above the minimum stake
//! 3. Fee floor on the proposer's basic reward
//! 4. Policy switch at the activation height
//! 5. All-or-nothing behavior when the staking snapshot is missing
//! 6. Conservation of the minted amount

use std::sync::Arc;

use mintage_integration_tests::{InMemoryGovernance, InMemoryStaking, RecordingBalances};
use mintage_reward::{EngineSettings, ForkSchedule, RewardEngine, RewardError, RewardPolicy};
use mintage_types::header::BlockHeader;
use mintage_types::params::{keys, GovParamSet};
use mintage_types::staking::{CouncilNode, StakingInfo};
use mintage_types::{Address, Amount};
use proptest::prelude::*;

const MIN_STAKING: u64 = 2_000_000;

fn params() -> GovParamSet {
    GovParamSet::new()
        .with(keys::EPOCH, 30u64)
        .with(keys::MINTING_AMOUNT, "10000")
        .with(keys::RATIO, "34/54/12")
        .with(keys::STAKE_RATIO, "20/80")
        .with(keys::MINIMUM_STAKE, MIN_STAKING)
        .with(keys::UNIT_PRICE, 5u64)
}

fn proposer() -> Address {
    Address::from_low_u64_be(0x700)
}

fn fund_a() -> Address {
    Address::from_low_u64_be(0x2000)
}

fn fund_b() -> Address {
    Address::from_low_u64_be(0x1000)
}

fn node(i: u64, reward_addr: Address, staking_amount: u64) -> CouncilNode {
    CouncilNode {
        node_addr: Address::from_low_u64_be(0x100 + i),
        staking_addr: Address::from_low_u64_be(0x200 + i),
        reward_addr,
        staking_amount,
    }
}

fn engine(staking: InMemoryStaking, forks: ForkSchedule) -> (RewardEngine, Arc<InMemoryStaking>) {
    let staking = Arc::new(staking);
    let engine = RewardEngine::new(
        Arc::new(InMemoryGovernance::new(params())),
        staking.clone(),
        Arc::new(forks),
        &EngineSettings::default(),
    );
    (engine, staking)
}

#[test]
fn shared_reward_address_is_consolidated() {
    let info = StakingInfo::new(0, fund_a(), fund_b())
        .with_node(node(0, proposer(), MIN_STAKING))
        .with_node(node(1, proposer(), MIN_STAKING));
    let (engine, _) = engine(InMemoryStaking::always(info), ForkSchedule::stake_weighted_from(0));
    // 100 gas at base fee 10: 1000 total, 500 burnt, 500 distributable
    let header = BlockHeader::new(31, proposer(), 100).with_base_fee(Amount::from(10u64));
    let mut balances = RecordingBalances::default();

    let spec = engine
        .distribute_block_reward(&mut balances, &header, Address::zero(), Address::zero())
        .expect("distribute");

    assert_eq!(spec.total_fee, Amount::from(1_000u64));
    assert_eq!(spec.burnt_fee, Amount::from(500u64));
    assert_eq!(balances.balance_of(&proposer()), Amount::from(3_400u64));
    assert_eq!(balances.balance_of(&fund_b()), Amount::from(1_200u64));
    assert_eq!(balances.balance_of(&fund_a()), Amount::from(5_400u64));
    assert_eq!(balances.credits.len(), 3);
}

#[test]
fn equal_excess_groups_split_the_pool() {
    let other = Address::from_low_u64_be(0x702);
    let info = StakingInfo::new(0, fund_a(), fund_b())
        .with_node(node(0, proposer(), MIN_STAKING))
        .with_node(node(1, proposer(), MIN_STAKING))
        .with_node(node(2, other, MIN_STAKING * 2));
    let (engine, _) = engine(InMemoryStaking::always(info), ForkSchedule::stake_weighted_from(0));
    // unit price 5 over 100 gas: 500 distributable, below the basic reward
    let header = BlockHeader::new(31, proposer(), 100);
    let mut balances = RecordingBalances::default();

    let spec = engine
        .distribute_block_reward(&mut balances, &header, Address::zero(), Address::zero())
        .expect("distribute");

    assert_eq!(spec.proposer, Amount::from(680u64));
    assert_eq!(spec.stakers, Amount::from(2_720u64));
    assert_eq!(balances.balance_of(&proposer()), Amount::from(2_040u64));
    assert_eq!(balances.balance_of(&other), Amount::from(1_360u64));
    assert_eq!(balances.balance_of(&fund_b()), Amount::from(1_200u64));
    assert_eq!(balances.balance_of(&fund_a()), Amount::from(5_400u64));
}

#[test]
fn fee_above_basic_replaces_it() {
    let info = StakingInfo::new(0, fund_a(), fund_b())
        .with_node(node(0, Address::from_low_u64_be(0x701), MIN_STAKING * 2));
    let (engine, _) = engine(InMemoryStaking::always(info), ForkSchedule::stake_weighted_from(0));
    // 400 gas at unit price 5: 2000 distributable
    let header = BlockHeader::new(31, proposer(), 400);

    let spec = engine
        .compute_rewards(&header, Address::zero(), Address::zero())
        .expect("rewards");

    assert_eq!(spec.proposer, Amount::from(2_000u64));
    assert_eq!(spec.rewards[&proposer()], Amount::from(2_000u64));
    assert_eq!(
        spec.total_rewards().expect("sum"),
        Amount::from(10_000u64 - 680 + 2_000)
    );
}

#[test]
fn no_member_above_minimum_folds_pool_into_fund_a() {
    let info = StakingInfo::new(0, fund_a(), fund_b())
        .with_node(node(0, Address::from_low_u64_be(0x701), MIN_STAKING))
        .with_node(node(1, Address::from_low_u64_be(0x702), MIN_STAKING - 1));
    let (engine, _) = engine(InMemoryStaking::always(info), ForkSchedule::stake_weighted_from(0));
    let header = BlockHeader::new(31, proposer(), 0);

    let spec = engine
        .compute_rewards(&header, Address::zero(), Address::zero())
        .expect("rewards");

    assert_eq!(spec.stakers, Amount::zero());
    assert_eq!(spec.rewards[&fund_a()], Amount::from(5_400u64 + 2_720));
    assert_eq!(spec.total_rewards().expect("sum"), Amount::from(10_000u64));
}

#[test]
fn policy_switches_at_activation_height() {
    let info = StakingInfo::new(0, fund_a(), fund_b())
        .with_node(node(0, Address::from_low_u64_be(0x701), MIN_STAKING * 2));
    let (engine, staking) =
        engine(InMemoryStaking::always(info), ForkSchedule::stake_weighted_from(60));
    let (caller_fund_a, caller_fund_b) = (Address::from_low_u64_be(0xa), Address::from_low_u64_be(0xb));

    assert_eq!(engine.policy_at(59), RewardPolicy::Legacy);
    let before = engine
        .compute_rewards(&BlockHeader::new(59, proposer(), 0), caller_fund_a, caller_fund_b)
        .expect("legacy");
    assert_eq!(before.rewards[&proposer()], Amount::from(3_400u64));
    assert_eq!(before.rewards[&caller_fund_a], Amount::from(5_400u64));
    assert_eq!(staking.calls(), 0);

    assert_eq!(engine.policy_at(60), RewardPolicy::StakeWeighted);
    let after = engine
        .compute_rewards(&BlockHeader::new(60, proposer(), 0), caller_fund_a, caller_fund_b)
        .expect("stake-weighted");
    assert_eq!(after.rewards[&proposer()], Amount::from(680u64));
    assert_eq!(after.rewards[&fund_a()], Amount::from(5_400u64));
    assert!(!after.rewards.contains_key(&caller_fund_a));
    assert_eq!(staking.calls(), 1);
}

#[test]
fn activation_height_read_from_settings() {
    let settings =
        EngineSettings::from_toml_str("[forks]\nstake_weighted_block = 90").expect("settings");
    let engine = RewardEngine::from_settings(
        Arc::new(InMemoryGovernance::new(params())),
        Arc::new(InMemoryStaking::empty()),
        &settings,
    );

    assert_eq!(engine.policy_at(89), RewardPolicy::Legacy);
    assert_eq!(engine.policy_at(90), RewardPolicy::StakeWeighted);
}

#[test]
fn missing_snapshot_credits_nothing() {
    let (engine, staking) = engine(InMemoryStaking::empty(), ForkSchedule::stake_weighted_from(0));
    let header = BlockHeader::new(31, proposer(), 100);
    let mut balances = RecordingBalances::default();

    let result =
        engine.distribute_block_reward(&mut balances, &header, Address::zero(), Address::zero());

    assert!(matches!(
        result,
        Err(RewardError::StakingInfoUnavailable { height: 31, .. })
    ));
    assert!(balances.credits.is_empty());
    assert_eq!(staking.calls(), 1);
}

#[test]
fn snapshot_is_looked_up_at_block_height() {
    let info = StakingInfo::new(0, fund_a(), fund_b())
        .with_node(node(0, Address::from_low_u64_be(0x701), MIN_STAKING * 2));
    let staking = InMemoryStaking::empty().with_snapshot(40, info);
    let (engine, _) = engine(staking, ForkSchedule::stake_weighted_from(0));

    assert!(engine
        .compute_rewards(&BlockHeader::new(40, proposer(), 0), Address::zero(), Address::zero())
        .is_ok());
    assert!(matches!(
        engine.compute_rewards(&BlockHeader::new(41, proposer(), 0), Address::zero(), Address::zero()),
        Err(RewardError::StakingInfoUnavailable { height: 41, .. })
    ));
}

proptest! {
    #[test]
    fn minted_amount_is_conserved(
        minted in 0u64..1_000_000_000_000,
        cn in 1u64..100,
        poc in 0u64..100,
        kir in 0u64..100,
        basic in 0u64..=100,
        stakes in proptest::collection::vec(0u64..10_000_000, 1..8),
    ) {
        let governance = InMemoryGovernance::new(
            GovParamSet::new()
                .with(keys::EPOCH, 30u64)
                .with(keys::MINTING_AMOUNT, minted.to_string())
                .with(keys::RATIO, format!("{cn}/{poc}/{kir}"))
                .with(keys::STAKE_RATIO, format!("{basic}/{}", 100 - basic))
                .with(keys::MINIMUM_STAKE, MIN_STAKING)
                .with(keys::UNIT_PRICE, 0u64),
        );
        let info = stakes
            .iter()
            .enumerate()
            .fold(StakingInfo::new(0, fund_a(), fund_b()), |info, (i, amount)| {
                let i = i as u64;
                info.with_node(node(i, Address::from_low_u64_be(0x800 + i % 3), *amount))
            });
        let engine = RewardEngine::new(
            Arc::new(governance),
            Arc::new(InMemoryStaking::always(info)),
            Arc::new(ForkSchedule::stake_weighted_from(0)),
            &EngineSettings::default(),
        );
        let mut balances = RecordingBalances::default();

        let spec = engine
            .distribute_block_reward(&mut balances, &BlockHeader::new(31, proposer(), 0), Address::zero(), Address::zero())
            .expect("distribute");

        prop_assert_eq!(balances.total(), Amount::from(minted));
        prop_assert_eq!(spec.proposer + spec.stakers + spec.fund_a + spec.fund_b, Amount::from(minted));
    }
}
