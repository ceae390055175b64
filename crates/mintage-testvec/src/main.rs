//! Reward test vector generator.
//!
//! Generates `reward_vectors.json` covering fee settlement, epoch keys and
//! both distribution policies. Every validating node must reproduce these
//! amounts exactly.
//!
//! Usage:
//!   mintage-testvec              # Generate tests/fixtures/reward_vectors.json
//!   mintage-testvec --verify     # Verify stored vectors against a fresh run

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use mintage_reward::cache::epoch_start;
use mintage_reward::sources::{BalanceAdder, GovernanceSource, SourceError, StakingSource};
use mintage_reward::{fee, legacy, stake, EngineSettings, RewardConfig, RewardEngine, StakeSplit};
use mintage_types::header::BlockHeader;
use mintage_types::params::{keys, GovParamSet};
use mintage_types::staking::{CouncilNode, StakingInfo};
use mintage_types::{address_to_hex, Address, Amount};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const VECTORS_PATH: &str = "tests/fixtures/reward_vectors.json";
const SETTINGS_PATH: &str = "mintage.toml";
const MIN_STAKING: u64 = 2_000_000;

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
}

fn entries<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn rewards_outputs(rewards: &BTreeMap<Address, Amount>) -> BTreeMap<String, String> {
    rewards
        .iter()
        .map(|(addr, amount)| (address_to_hex(addr), amount.to_string()))
        .collect()
}

/// Balances credited by a distributor run.
#[derive(Default)]
struct Ledger {
    balances: BTreeMap<Address, Amount>,
    overflowed: bool,
}

impl Ledger {
    fn into_outputs(self) -> anyhow::Result<BTreeMap<String, String>> {
        anyhow::ensure!(!self.overflowed, "balance overflow while crediting rewards");
        Ok(rewards_outputs(&self.balances))
    }
}

impl BalanceAdder for Ledger {
    fn add_balance(&mut self, addr: Address, amount: Amount) {
        let balance = self.balances.entry(addr).or_default();
        match balance.checked_add(amount) {
            Some(sum) => *balance = sum,
            None => self.overflowed = true,
        }
    }
}

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn generate_fee_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    let config = RewardConfig::new(
        Amount::from(9_600_000_000_000_000_000u64),
        (34, 54, 12),
        Amount::from(25_000_000_000u64),
    )?;

    for (name, gas, base_fee) in [
        ("fee_unit_price", 10u64, None),
        ("fee_base_fee_burnt", 100u64, Some(500u64)),
        ("fee_base_fee_odd_burnt", 3u64, Some(7u64)),
    ] {
        let mut header = BlockHeader::new(1, addr(1), gas);
        if let Some(price) = base_fee {
            header = header.with_base_fee(Amount::from(price));
        }
        let settled = fee::settle_fee(&header, &config)?;
        vectors.insert(
            name.to_string(),
            TestVector {
                description: "gas_used * (base_fee or unit_price); half burnt under base fee"
                    .to_string(),
                inputs: entries([
                    ("gas_used", gas.to_string()),
                    ("unit_price", config.unit_price.to_string()),
                    ("base_fee", base_fee.map(|p| p.to_string()).unwrap_or_default()),
                ]),
                outputs: entries([
                    ("total", settled.total.to_string()),
                    ("burnt", settled.burnt.to_string()),
                    ("distributable", settled.distributable.to_string()),
                ]),
            },
        );
    }

    Ok(vectors)
}

fn generate_epoch_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    for block in [0u64, 1, 30, 31, 59, 60, 61] {
        vectors.insert(
            format!("epoch_key_30_{block}"),
            TestVector {
                description: "config cache key for epoch length 30".to_string(),
                inputs: entries([("block", block.to_string()), ("epoch", "30".to_string())]),
                outputs: entries([("key", epoch_start(block, 30)?.to_string())]),
            },
        );
    }
    Ok(vectors)
}

fn generate_legacy_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    let (proposer, fund_a, fund_b) = (addr(0x1552), addr(0x4bcd), addr(0xd38a));

    for (name, minted, ratio, fee) in [
        ("legacy_no_fee", 9_600_000_000_000_000_000u64, (34u64, 54u64, 12u64), 0u64),
        ("legacy_with_fee", 10_000_000_000, (60, 30, 10), 1_000_000),
        ("legacy_residue_dropped", 10, (1, 1, 1), 0),
    ] {
        let config = RewardConfig::new(Amount::from(minted), ratio, Amount::zero())?;
        let header = BlockHeader::new(0, proposer, 0);
        let mut ledger = Ledger::default();
        legacy::distribute(&mut ledger, &header, Amount::from(fee), &config, fund_a, fund_b)?;

        vectors.insert(
            name.to_string(),
            TestVector {
                description: "ratio split of minted + fee, each share floored".to_string(),
                inputs: entries([
                    ("minted", minted.to_string()),
                    ("ratio", config.ratio_string()),
                    ("fee", fee.to_string()),
                    ("proposer", address_to_hex(&proposer)),
                    ("fund_a", address_to_hex(&fund_a)),
                    ("fund_b", address_to_hex(&fund_b)),
                ]),
                outputs: ledger.into_outputs()?,
            },
        );
    }

    Ok(vectors)
}

fn council_node(i: u64, reward_addr: Address, staking_amount: u64) -> CouncilNode {
    CouncilNode {
        node_addr: addr(100 + i),
        staking_addr: addr(200 + i),
        reward_addr,
        staking_amount,
    }
}

fn generate_stake_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    let proposer = addr(700);
    let config = RewardConfig::new(Amount::from(10_000u64), (34, 54, 12), Amount::zero())?
        .with_stake_split(StakeSplit::new(20, 80)?, MIN_STAKING);
    let snapshot = || StakingInfo::new(0, addr(0x2000), addr(0x1000));

    let scenarios = [
        (
            "stake_shared_reward_address",
            "two threshold nodes sharing the proposer's reward address",
            snapshot()
                .with_node(council_node(0, proposer, MIN_STAKING))
                .with_node(council_node(1, proposer, MIN_STAKING)),
            500u64,
        ),
        (
            "stake_two_groups",
            "two consolidated groups with equal excess",
            snapshot()
                .with_node(council_node(0, proposer, MIN_STAKING))
                .with_node(council_node(1, proposer, MIN_STAKING))
                .with_node(council_node(2, addr(702), MIN_STAKING * 2)),
            500,
        ),
        (
            "stake_fee_floor",
            "fee above the basic reward replaces it",
            snapshot().with_node(council_node(0, proposer, MIN_STAKING * 2)),
            1_000,
        ),
        (
            "stake_no_qualifying_member",
            "stake pool folded into fund A",
            snapshot().with_node(council_node(0, proposer, MIN_STAKING)),
            0,
        ),
    ];

    for (name, description, staking, fee) in scenarios {
        let header = BlockHeader::new(0, proposer, 0);
        let mut ledger = Ledger::default();
        stake::distribute(&mut ledger, &header, Amount::from(fee), &config, &staking)?;

        let mut inputs = entries([
            ("minted", config.minting_amount.to_string()),
            ("ratio", config.ratio_string()),
            ("stake_ratio", "20/80".to_string()),
            ("min_staking", MIN_STAKING.to_string()),
            ("fee", fee.to_string()),
        ]);
        for node in &staking.council {
            inputs.insert(
                format!("stake:{}", address_to_hex(&node.node_addr)),
                format!("{}@{}", node.staking_amount, address_to_hex(&node.reward_addr)),
            );
        }

        vectors.insert(
            name.to_string(),
            TestVector {
                description: description.to_string(),
                inputs,
                outputs: ledger.into_outputs()?,
            },
        );
    }

    Ok(vectors)
}

struct FixedGovernance(GovParamSet);

impl GovernanceSource for FixedGovernance {
    fn params_at(&self, _height: u64) -> Result<GovParamSet, SourceError> {
        Ok(self.0.clone())
    }
}

struct NoStaking;

impl StakingSource for NoStaking {
    fn staking_info_at(&self, height: u64) -> Result<Arc<StakingInfo>, SourceError> {
        Err(SourceError::new(format!("no staking snapshot at {height}")))
    }
}

fn generate_dispatch_vectors(settings: &EngineSettings) -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    let params = GovParamSet::new()
        .with(keys::EPOCH, 30u64)
        .with(keys::MINTING_AMOUNT, "50000")
        .with(keys::RATIO, "40/50/10")
        .with(keys::UNIT_PRICE, 25_000_000_000u64);
    let engine = RewardEngine::new(
        Arc::new(FixedGovernance(params)),
        Arc::new(NoStaking),
        Arc::new(mintage_reward::ForkSchedule::default()),
        settings,
    );
    let (proposer, fund_a, fund_b) = (addr(1), addr(2), addr(3));

    for (name, base_fee) in [("dispatch_base_fee", Some(500u64)), ("dispatch_unit_price", None)] {
        let mut header = BlockHeader::new(31, proposer, 100);
        if let Some(price) = base_fee {
            header = header.with_base_fee(Amount::from(price));
        }
        let spec = engine.compute_rewards(&header, fund_a, fund_b)?;

        let mut outputs = rewards_outputs(&spec.rewards);
        outputs.insert("total_fee".to_string(), spec.total_fee.to_string());
        outputs.insert("burnt_fee".to_string(), spec.burnt_fee.to_string());
        vectors.insert(
            name.to_string(),
            TestVector {
                description: "legacy block, epoch 30, minted 50000, ratio 40/50/10, gas 100"
                    .to_string(),
                inputs: entries([
                    ("block", header.number.to_string()),
                    ("base_fee", base_fee.map(|p| p.to_string()).unwrap_or_default()),
                ]),
                outputs,
            },
        );
    }

    Ok(vectors)
}

fn generate_all_vectors(settings: &EngineSettings) -> anyhow::Result<TestVectors> {
    let mut all_vectors = BTreeMap::new();

    all_vectors.extend(generate_fee_vectors()?);
    all_vectors.extend(generate_epoch_vectors()?);
    all_vectors.extend(generate_legacy_vectors()?);
    all_vectors.extend(generate_stake_vectors()?);
    all_vectors.extend(generate_dispatch_vectors(settings)?);

    Ok(TestVectors {
        version: "1.0".to_string(),
        generated_by: "mintage-testvec".to_string(),
        vectors: all_vectors,
    })
}

fn verify_vectors(vectors: &TestVectors, settings: &EngineSettings) -> anyhow::Result<bool> {
    let regenerated = generate_all_vectors(settings)?;
    let mut all_pass = true;

    for (name, expected) in &vectors.vectors {
        match regenerated.vectors.get(name) {
            Some(actual) if actual.outputs == expected.outputs => {
                info!(vector = %name, "pass");
            }
            Some(actual) => {
                error!(
                    vector = %name,
                    expected = ?expected.outputs,
                    actual = ?actual.outputs,
                    "mismatch"
                );
                all_pass = false;
            }
            None => {
                error!(vector = %name, "missing from regenerated set");
                all_pass = false;
            }
        }
    }

    Ok(all_pass)
}

fn write_vectors(path: &Path, vectors: &TestVectors) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(vectors)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let settings = EngineSettings::load(Path::new(SETTINGS_PATH))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("mintage={}", settings.logging.level).parse()?),
        )
        .init();

    let path = Path::new(VECTORS_PATH);
    let verify = std::env::args().any(|a| a == "--verify");

    let vectors = if verify && path.exists() {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    } else {
        let vectors = generate_all_vectors(&settings)?;
        write_vectors(path, &vectors)?;
        info!(count = vectors.vectors.len(), path = %path.display(), "generated reward vectors");
        vectors
    };

    if verify_vectors(&vectors, &settings)? {
        info!("all reward vectors verified");
        Ok(())
    } else {
        anyhow::bail!("reward vector verification failed")
    }
}
