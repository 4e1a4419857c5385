mod health;
mod provisioner;

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use health::{HealthAwaiter, HealthError, HttpHealthAwaiter};
pub use provisioner::NetworkProvisioner;

use crate::constants::MAX_NODE_COUNT;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Derives the subnets of a network from its nodes.
pub type SubnetFactory = dyn Fn(&[NodeSpec]) -> Vec<SubnetSpec> + Send + Sync;

const NODE_ID_LEN: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeCreationError {
    #[error("node count must be non-zero")]
    ZeroNodes,
    #[error("node count {requested} exceeds the maximum of {max}")]
    TooManyNodes { requested: usize, max: usize },
}

/// A node the provisioner is asked to start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub node_id: String,
}

impl NodeSpec {
    /// Synthesize `count` nodes with random identities.
    pub fn generate(count: usize) -> Result<Vec<Self>, NodeCreationError> {
        if count == 0 {
            return Err(NodeCreationError::ZeroNodes);
        }
        if count > MAX_NODE_COUNT {
            return Err(NodeCreationError::TooManyNodes {
                requested: count,
                max: MAX_NODE_COUNT,
            });
        }

        let mut rng = rand::thread_rng();
        Ok((0..count)
            .map(|index| {
                let mut id = [0u8; NODE_ID_LEN];
                rng.fill(&mut id);
                Self {
                    name: format!("node-{index}"),
                    node_id: format!("NodeID-{}", hex::encode(id)),
                }
            })
            .collect())
    }
}

/// A subnet the provisioner is asked to create.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub name: String,
    /// Node ids validating the subnet.
    pub validator_ids: Vec<String>,
    /// VM names, one chain per entry.
    pub chains: Vec<String>,
}

/// Template describing a network to bootstrap. Empty `nodes` or `subnets`
/// mean "not defined yet".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub owner: String,
    pub nodes: Vec<NodeSpec>,
    pub subnets: Vec<SubnetSpec>,
}

impl NetworkDescriptor {
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    #[must_use]
    pub fn has_subnets(&self) -> bool {
        !self.subnets.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedNode {
    pub node_id: String,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedChain {
    pub vm_name: String,
    pub chain_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedSubnet {
    pub name: String,
    pub subnet_id: String,
    pub chains: Vec<ProvisionedChain>,
}

/// A running network as reported by the provisioner. Node and subnet order is
/// the provisioner's and is preserved by everything downstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedNetwork {
    pub network_id: String,
    pub nodes: Vec<ProvisionedNode>,
    #[serde(default)]
    pub subnets: Vec<ProvisionedSubnet>,
}

impl ProvisionedNetwork {
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.uri.as_str())
    }
}
