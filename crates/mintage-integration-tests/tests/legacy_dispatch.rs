//! Integration test: legacy block rewards through the engine.
//!
//! Exercises the dispatcher before the stake-weighted fork:
//! 1. Fee settlement with and without a base fee
//! 2. Ratio split of minted amount plus distributable fee
//! 3. Minting to the proposer alone when fees are not deferred
//! 4. One credit per address, in address order, with no zero credits
//! 5. Failures leave the balance sink untouched

use std::sync::Arc;

use mintage_integration_tests::{InMemoryGovernance, InMemoryStaking, RecordingBalances};
use mintage_reward::{EngineSettings, ForkSchedule, RewardEngine, RewardError};
use mintage_types::header::BlockHeader;
use mintage_types::params::{keys, GovParamSet};
use mintage_types::{Address, Amount};

fn params() -> GovParamSet {
    GovParamSet::new()
        .with(keys::EPOCH, 30u64)
        .with(keys::MINTING_AMOUNT, "50000")
        .with(keys::RATIO, "40/50/10")
        .with(keys::UNIT_PRICE, 25_000_000_000u64)
}

fn engine(governance: InMemoryGovernance) -> RewardEngine {
    RewardEngine::new(
        Arc::new(governance),
        Arc::new(InMemoryStaking::empty()),
        Arc::new(ForkSchedule::default()),
        &EngineSettings::default(),
    )
}

fn addresses() -> (Address, Address, Address) {
    (
        Address::from_low_u64_be(0x30),
        Address::from_low_u64_be(0x10),
        Address::from_low_u64_be(0x20),
    )
}

#[test]
fn legacy_block_with_base_fee_burns_half() {
    let engine = engine(InMemoryGovernance::new(params()));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 100).with_base_fee(Amount::from(500u64));
    let mut balances = RecordingBalances::default();

    let spec = engine
        .distribute_block_reward(&mut balances, &header, fund_a, fund_b)
        .expect("distribute");

    assert_eq!(spec.minted, Amount::from(50_000u64));
    assert_eq!(spec.total_fee, Amount::from(50_000u64));
    assert_eq!(spec.burnt_fee, Amount::from(25_000u64));
    assert_eq!(balances.balance_of(&proposer), Amount::from(30_000u64));
    assert_eq!(balances.balance_of(&fund_a), Amount::from(37_500u64));
    assert_eq!(balances.balance_of(&fund_b), Amount::from(7_500u64));
    assert_eq!(balances.total(), Amount::from(75_000u64));
}

#[test]
fn legacy_block_without_base_fee_uses_unit_price() {
    let engine = engine(InMemoryGovernance::new(params()));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 100);
    let mut balances = RecordingBalances::default();

    let spec = engine
        .distribute_block_reward(&mut balances, &header, fund_a, fund_b)
        .expect("distribute");

    assert_eq!(spec.total_fee, Amount::from(2_500_000_000_000u64));
    assert_eq!(spec.burnt_fee, Amount::zero());
    assert_eq!(balances.balance_of(&proposer), Amount::from(1_000_000_020_000u64));
    assert_eq!(balances.balance_of(&fund_a), Amount::from(1_250_000_025_000u64));
    assert_eq!(balances.balance_of(&fund_b), Amount::from(250_000_005_000u64));
}

#[test]
fn credits_are_applied_once_per_address_in_order() {
    let engine = engine(InMemoryGovernance::new(params()));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 0);
    let mut balances = RecordingBalances::default();

    engine
        .distribute_block_reward(&mut balances, &header, fund_a, fund_b)
        .expect("distribute");

    let order: Vec<Address> = balances.credits.iter().map(|(addr, _)| *addr).collect();
    assert_eq!(order, vec![fund_a, fund_b, proposer]);
}

#[test]
fn proposer_sharing_fund_address_gets_one_summed_credit() {
    let engine = engine(InMemoryGovernance::new(params()));
    let (proposer, _, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 0);
    let mut balances = RecordingBalances::default();

    engine
        .distribute_block_reward(&mut balances, &header, proposer, fund_b)
        .expect("distribute");

    assert_eq!(balances.credits.len(), 2);
    assert_eq!(balances.balance_of(&proposer), Amount::from(45_000u64));
}

#[test]
fn zero_minting_and_no_gas_credits_nothing() {
    let engine = engine(InMemoryGovernance::new(
        params().with(keys::MINTING_AMOUNT, "0"),
    ));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 0);
    let mut balances = RecordingBalances::default();

    let spec = engine
        .distribute_block_reward(&mut balances, &header, fund_a, fund_b)
        .expect("distribute");

    assert!(balances.credits.is_empty());
    assert_eq!(spec.total_rewards().expect("sum"), Amount::zero());
}

#[test]
fn undeferred_fees_mint_to_proposer_only() {
    let engine = engine(InMemoryGovernance::new(
        params().with(keys::DEFERRED_TX_FEE, false),
    ));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 100).with_base_fee(Amount::from(500u64));
    let mut balances = RecordingBalances::default();

    let spec = engine
        .distribute_block_reward(&mut balances, &header, fund_a, fund_b)
        .expect("distribute");

    assert_eq!(spec.total_fee, Amount::zero());
    assert_eq!(
        balances.credits,
        vec![(proposer, Amount::from(50_000u64))]
    );
}

#[test]
fn malformed_parameters_credit_nothing() {
    let engine = engine(InMemoryGovernance::new(
        params().with(keys::MINTING_AMOUNT, "1e18"),
    ));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 100);
    let mut balances = RecordingBalances::default();

    let result = engine.distribute_block_reward(&mut balances, &header, fund_a, fund_b);

    assert!(matches!(result, Err(RewardError::ConfigParse(_))));
    assert!(balances.credits.is_empty());
}

#[test]
fn zero_ratio_total_is_an_invariant_violation() {
    let engine = engine(InMemoryGovernance::new(params().with(keys::RATIO, "0/0/0")));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, 0);

    assert!(matches!(
        engine.compute_rewards(&header, fund_a, fund_b),
        Err(RewardError::ConfigInvariantViolation(_))
    ));
}

#[test]
fn fee_overflow_is_reported() {
    let engine = engine(InMemoryGovernance::new(params()));
    let (proposer, fund_a, fund_b) = addresses();
    let header = BlockHeader::new(31, proposer, u64::MAX).with_base_fee(Amount::MAX);
    let mut balances = RecordingBalances::default();

    let result = engine.distribute_block_reward(&mut balances, &header, fund_a, fund_b);

    assert!(matches!(result, Err(RewardError::ArithmeticOverflow)));
    assert!(balances.credits.is_empty());
}
