use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use workload_core::{DynError, NetworkDescriptor, NetworkProvisioner, ProvisionedNetwork};
use workload_runner_command::CommandProvisioner;

use crate::flags::NetworkFlags;

/// Stand-in used when no provisioner program was configured. Any bootstrap
/// attempt fails with a message pointing at the missing flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct MissingProvisioner;

#[async_trait]
impl NetworkProvisioner for MissingProvisioner {
    async fn provision(&self, _network: &NetworkDescriptor) -> Result<ProvisionedNetwork, DynError> {
        Err("no provisioner configured; pass --uris or --provisioner".into())
    }

    async fn shutdown(&self, network: &ProvisionedNetwork) -> Result<(), DynError> {
        Err(format!(
            "no provisioner configured to stop network {}",
            network.network_id
        )
        .into())
    }
}

#[must_use]
pub fn provisioner_from_flags(flags: &NetworkFlags) -> Arc<dyn NetworkProvisioner> {
    match &flags.provisioner {
        Some(program) => {
            debug!(program = %program.display(), args = ?flags.provisioner_args, "using command provisioner");
            Arc::new(CommandProvisioner::new(program).with_args(flags.provisioner_args.iter().cloned()))
        }
        None => Arc::new(MissingProvisioner),
    }
}
