use std::{sync::Arc, thread};

use tokio::runtime::Runtime;
use tracing::info;
use workload_core::{Config, NetworkProvisioner, ProvisionedNetwork, TestContext};

/// Register the shutdown of a bootstrapped network with `tc`.
///
/// With `reuse_network` set nothing is registered and the network is left
/// running. Otherwise the action waits out the configured shutdown delay and
/// then drives the provisioner's shutdown to completion on `runtime`. The
/// owning thread must not be inside that runtime when teardown runs.
pub fn register_network_teardown(
    tc: &TestContext,
    runtime: Arc<Runtime>,
    provisioner: Arc<dyn NetworkProvisioner>,
    network: ProvisionedNetwork,
    config: &Config,
) {
    if config.reuse_network() {
        info!(network_id = %network.network_id, "reusing network; skipping shutdown");
        return;
    }

    let delay = config.shutdown_delay();
    tc.defer_fallible_cleanup(move || {
        if !delay.is_zero() {
            info!(delay_secs = delay.as_secs(), "waiting before network shutdown");
            thread::sleep(delay);
        }
        info!(network_id = %network.network_id, "shutting down network");
        runtime.block_on(provisioner.shutdown(&network))
    });
}
