use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser};
use workload_core::{
    BootstrapPolicy, Csv, HealthCheck, adjust_timeout,
    constants::{DEFAULT_NODE_COUNT, NETWORK_SHUTDOWN_DELAY, health_timeout},
};

/// Command line for a workload run.
///
/// Every flag may also be set through the `WORKLOAD_*` variable named in its
/// help text. An explicit flag wins over the environment.
#[derive(Debug, Parser)]
#[command(
    name = "workload",
    about = "Drive a workload against an existing or freshly bootstrapped network"
)]
pub struct WorkloadFlags {
    /// Comma-separated node URIs. Empty bootstraps a new network.
    #[arg(long, env = "WORKLOAD_URIS", value_name = "URI,...")]
    uris: Option<Csv>,

    /// Comma-separated chain ids to target. Ignored when bootstrapping.
    #[arg(long, env = "WORKLOAD_CHAIN_IDS", value_name = "ID,...")]
    chain_ids: Option<Csv>,

    #[command(flatten)]
    pub network: NetworkFlags,
}

impl WorkloadFlags {
    #[must_use]
    pub fn uris(&self) -> Csv {
        self.uris.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn chain_ids(&self) -> Csv {
        self.chain_ids.clone().unwrap_or_default()
    }
}

/// Flags controlling a bootstrapped network.
#[derive(Clone, Debug, Args)]
pub struct NetworkFlags {
    /// Number of nodes to start when bootstrapping.
    #[arg(long, env = "WORKLOAD_NODE_COUNT", default_value_t = DEFAULT_NODE_COUNT)]
    pub node_count: usize,

    /// Leave a bootstrapped network running after the workload finishes.
    #[arg(long, env = "WORKLOAD_REUSE_NETWORK")]
    pub reuse_network: bool,

    /// Wait before stopping a bootstrapped network.
    #[arg(long, env = "WORKLOAD_DELAY_NETWORK_SHUTDOWN")]
    pub delay_network_shutdown: bool,

    /// Probe supplied URIs for health before using them.
    #[arg(long, env = "WORKLOAD_CHECK_HEALTH")]
    pub check_health: bool,

    /// Program that starts and stops networks.
    #[arg(long, env = "WORKLOAD_PROVISIONER", value_name = "PATH")]
    pub provisioner: Option<PathBuf>,

    /// Argument passed to the provisioner before its verb. Repeatable.
    #[arg(long = "provisioner-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub provisioner_args: Vec<String>,

    /// Comma-separated VM names; each gets a subnet with one chain.
    #[arg(long, env = "WORKLOAD_SUBNET_VMS", value_name = "VM,...")]
    subnet_vms: Option<Csv>,
}

impl NetworkFlags {
    #[must_use]
    pub fn subnet_vms(&self) -> Csv {
        self.subnet_vms.clone().unwrap_or_default()
    }

    #[must_use]
    pub const fn network_shutdown_delay(&self) -> Duration {
        if self.delay_network_shutdown {
            NETWORK_SHUTDOWN_DELAY
        } else {
            Duration::ZERO
        }
    }

    #[must_use]
    pub const fn bootstrap_policy(&self) -> BootstrapPolicy {
        BootstrapPolicy {
            node_count: self.node_count,
            reuse_network: self.reuse_network,
            shutdown_delay: self.network_shutdown_delay(),
        }
    }

    #[must_use]
    pub fn health_check(&self) -> HealthCheck {
        if self.check_health {
            HealthCheck::Await {
                timeout: adjust_timeout(health_timeout()),
            }
        } else {
            HealthCheck::Skip
        }
    }
}
