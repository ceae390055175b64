//! Council staking snapshot.
//!
//! Built once per epoch outside the reward core and passed in read-only.
//! Several council nodes may share one reward address; stake-weighted
//! rewards are computed over the snapshot consolidated by reward address.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount};

/// One council member as recorded in the staking snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilNode {
    /// Consensus node address.
    pub node_addr: Address,
    /// Address holding the stake.
    pub staking_addr: Address,
    /// Address receiving rewards.
    pub reward_addr: Address,
    /// Staked amount.
    pub staking_amount: u64,
}

/// A group of council nodes sharing one reward address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedNode {
    /// Node addresses in the group, in snapshot order.
    pub node_addrs: Vec<Address>,
    /// Staking addresses in the group, in snapshot order.
    pub staking_addrs: Vec<Address>,
    /// Shared reward address.
    pub reward_addr: Address,
    /// Sum of the group's staked amounts.
    pub staking_amount: Amount,
}

/// Staking snapshot for one epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingInfo {
    /// Block at which the snapshot was taken.
    pub block_num: u64,
    /// Council members in registration order.
    pub council: Vec<CouncilNode>,
    /// Fund A (PoC) address.
    pub fund_a: Address,
    /// Fund B (KIR) address.
    pub fund_b: Address,
    /// Set when amounts were already consolidated upstream (e.g. Gini weighted).
    #[serde(default)]
    pub consolidated: bool,
}

impl StakingInfo {
    /// Create a snapshot with no council members.
    pub fn new(block_num: u64, fund_a: Address, fund_b: Address) -> Self {
        Self {
            block_num,
            council: Vec::new(),
            fund_a,
            fund_b,
            consolidated: false,
        }
    }

    /// Builder-style append of a council member.
    pub fn with_node(mut self, node: CouncilNode) -> Self {
        self.council.push(node);
        self
    }

    /// Group council members by reward address.
    ///
    /// Groups keep the order in which their reward address first appears.
    /// A snapshot flagged as `consolidated` is returned one entry per node.
    pub fn consolidated_nodes(&self) -> Vec<ConsolidatedNode> {
        let mut groups: Vec<ConsolidatedNode> = Vec::with_capacity(self.council.len());

        for node in &self.council {
            let existing = if self.consolidated {
                None
            } else {
                groups.iter().position(|g| g.reward_addr == node.reward_addr)
            };

            match existing {
                Some(idx) => {
                    let group = &mut groups[idx];
                    group.node_addrs.push(node.node_addr);
                    group.staking_addrs.push(node.staking_addr);
                    group.staking_amount += Amount::from(node.staking_amount);
                }
                None => groups.push(ConsolidatedNode {
                    node_addrs: vec![node.node_addr],
                    staking_addrs: vec![node.staking_addr],
                    reward_addr: node.reward_addr,
                    staking_amount: Amount::from(node.staking_amount),
                }),
            }
        }

        groups
    }
}
