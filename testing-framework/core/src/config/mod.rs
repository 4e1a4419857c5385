mod resolver;

use std::time::Duration;

pub use resolver::{ConfigResolver, Resolution, ResolveError};

use crate::constants::DEFAULT_NODE_COUNT;

/// Resolved view of the network a workload run targets.
///
/// `uris` is never empty; `chain_ids` may be, and its length is unrelated to
/// the number of URIs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    uris: Vec<String>,
    chain_ids: Vec<String>,
    reuse_network: bool,
    shutdown_delay: Duration,
}

impl Config {
    pub(crate) fn new(
        uris: Vec<String>,
        chain_ids: Vec<String>,
        policy: &BootstrapPolicy,
    ) -> Result<Self, ResolveError> {
        if uris.is_empty() {
            return Err(ResolveError::NoEndpoints {
                reason: "resolved uri list is empty".to_owned(),
                source: None,
            });
        }

        Ok(Self {
            uris,
            chain_ids,
            reuse_network: policy.reuse_network,
            shutdown_delay: policy.shutdown_delay,
        })
    }

    #[must_use]
    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    #[must_use]
    pub fn chain_ids(&self) -> &[String] {
        &self.chain_ids
    }

    /// Whether a bootstrapped network should be left running after the run.
    #[must_use]
    pub const fn reuse_network(&self) -> bool {
        self.reuse_network
    }

    #[must_use]
    pub const fn shutdown_delay(&self) -> Duration {
        self.shutdown_delay
    }
}

/// Provisioning policy for the bootstrap path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapPolicy {
    pub node_count: usize,
    pub reuse_network: bool,
    pub shutdown_delay: Duration,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            node_count: DEFAULT_NODE_COUNT,
            reuse_network: false,
            shutdown_delay: Duration::ZERO,
        }
    }
}

/// Whether externally supplied endpoints are probed before use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HealthCheck {
    #[default]
    Skip,
    Await { timeout: Duration },
}
