use thiserror::Error;
use tracing::{debug, info, warn};

use super::{BootstrapPolicy, Config, HealthCheck};
use crate::{
    adjust_timeout,
    csv::Csv,
    network::{
        DynError, HealthAwaiter, HealthError, NetworkDescriptor, NetworkProvisioner,
        NodeCreationError, NodeSpec, ProvisionedNetwork, SubnetFactory,
    },
};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no endpoints available: {reason}")]
    NoEndpoints {
        reason: String,
        #[source]
        source: Option<DynError>,
    },
    #[error("supplied endpoints did not become healthy: {source}")]
    NetworkUnhealthy {
        #[source]
        source: HealthError,
    },
    #[error("failed to create nodes for ephemeral network: {source}")]
    NodeCreation {
        #[source]
        source: NodeCreationError,
    },
    #[error("provisioned subnet '{subnet}' has no chains")]
    SubnetWithoutChains { subnet: String },
}

/// Outcome of a resolution. `network` is set only when a fresh network was
/// bootstrapped; the caller owns its teardown.
#[derive(Debug)]
pub struct Resolution {
    pub config: Config,
    pub network: Option<ProvisionedNetwork>,
}

impl Resolution {
    #[must_use]
    pub const fn bootstrapped(&self) -> bool {
        self.network.is_some()
    }
}

/// Decides between attaching to supplied endpoints and bootstrapping a new
/// network.
pub struct ConfigResolver<'a> {
    provisioner: &'a dyn NetworkProvisioner,
    health: &'a dyn HealthAwaiter,
    health_check: HealthCheck,
    subnet_factory: Option<&'a SubnetFactory>,
}

impl<'a> ConfigResolver<'a> {
    #[must_use]
    pub fn new(provisioner: &'a dyn NetworkProvisioner, health: &'a dyn HealthAwaiter) -> Self {
        Self {
            provisioner,
            health,
            health_check: HealthCheck::Skip,
            subnet_factory: None,
        }
    }

    #[must_use]
    pub const fn with_health_check(mut self, health_check: HealthCheck) -> Self {
        self.health_check = health_check;
        self
    }

    /// Derive subnets from synthesized nodes when the descriptor has none.
    #[must_use]
    pub fn with_subnet_factory(mut self, factory: &'a SubnetFactory) -> Self {
        self.subnet_factory = Some(factory);
        self
    }

    /// Resolve the run configuration.
    ///
    /// Non-empty `uris` are used as-is together with `chain_ids`. Otherwise
    /// `network` is completed (nodes, then subnets) and handed to the
    /// provisioner; chain ids then come from the first chain of each
    /// provisioned subnet. Additional chains on a subnet are not reported.
    pub async fn resolve(
        &self,
        uris: Csv,
        chain_ids: Csv,
        network: &mut NetworkDescriptor,
        policy: &BootstrapPolicy,
    ) -> Result<Resolution, ResolveError> {
        if uris.is_empty() {
            self.bootstrap(network, policy).await
        } else {
            self.attach(uris, chain_ids, policy).await
        }
    }

    async fn attach(
        &self,
        uris: Csv,
        chain_ids: Csv,
        policy: &BootstrapPolicy,
    ) -> Result<Resolution, ResolveError> {
        info!(
            uris = %uris,
            chain_ids = %chain_ids,
            "using supplied endpoints"
        );

        if let HealthCheck::Await { timeout } = self.health_check {
            self.health
                .await_healthy(&uris, adjust_timeout(timeout))
                .await
                .map_err(|source| {
                    warn!(error = %source, "supplied endpoints are unhealthy");
                    ResolveError::NetworkUnhealthy { source }
                })?;
            debug!("supplied endpoints are healthy");
        }

        let config = Config::new(uris.into_inner(), chain_ids.into_inner(), policy)?;
        Ok(Resolution {
            config,
            network: None,
        })
    }

    async fn bootstrap(
        &self,
        network: &mut NetworkDescriptor,
        policy: &BootstrapPolicy,
    ) -> Result<Resolution, ResolveError> {
        info!(
            owner = %network.owner,
            node_count = policy.node_count,
            "no endpoints supplied; bootstrapping ephemeral network"
        );

        if !network.has_nodes() {
            network.nodes = NodeSpec::generate(policy.node_count)
                .map_err(|source| ResolveError::NodeCreation { source })?;
        }

        if !network.has_subnets() {
            if let Some(factory) = self.subnet_factory {
                network.subnets = factory(&network.nodes);
                debug!(subnets = network.subnets.len(), "derived subnets from nodes");
            }
        }

        let provisioned = self
            .provisioner
            .provision(network)
            .await
            .map_err(|source| ResolveError::NoEndpoints {
                reason: "network bootstrap failed".to_owned(),
                source: Some(source),
            })?;

        let uris: Vec<String> = provisioned.uris().map(str::to_owned).collect();
        if uris.is_empty() {
            self.release(&provisioned).await;
            return Err(ResolveError::NoEndpoints {
                reason: format!(
                    "bootstrapped network {} reported no nodes",
                    provisioned.network_id
                ),
                source: None,
            });
        }

        let chain_ids = match first_chain_ids(&provisioned) {
            Ok(chain_ids) => chain_ids,
            Err(err) => {
                self.release(&provisioned).await;
                return Err(err);
            }
        };

        info!(
            network_id = %provisioned.network_id,
            nodes = uris.len(),
            chains = chain_ids.len(),
            reuse_network = policy.reuse_network,
            "ephemeral network ready"
        );

        let config = Config::new(uris, chain_ids, policy)?;
        Ok(Resolution {
            config,
            network: Some(provisioned),
        })
    }

    /// Stop a network that was provisioned but cannot be handed to the caller.
    async fn release(&self, network: &ProvisionedNetwork) {
        warn!(network_id = %network.network_id, "stopping unusable bootstrapped network");
        if let Err(err) = self.provisioner.shutdown(network).await {
            warn!(
                network_id = %network.network_id,
                error = %err,
                "failed to stop unusable bootstrapped network"
            );
        }
    }
}

fn first_chain_ids(network: &ProvisionedNetwork) -> Result<Vec<String>, ResolveError> {
    network
        .subnets
        .iter()
        .map(|subnet| {
            if subnet.chains.len() > 1 {
                debug!(
                    subnet = %subnet.name,
                    chains = subnet.chains.len(),
                    "subnet has multiple chains; only the first is targeted"
                );
            }
            subnet
                .chains
                .first()
                .map(|chain| chain.chain_id.clone())
                .ok_or_else(|| ResolveError::SubnetWithoutChains {
                    subnet: subnet.name.clone(),
                })
        })
        .collect()
}
