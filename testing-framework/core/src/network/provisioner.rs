use async_trait::async_trait;

use super::{DynError, NetworkDescriptor, ProvisionedNetwork};

/// Materializes ephemeral networks from a descriptor.
#[async_trait]
pub trait NetworkProvisioner: Send + Sync {
    /// Start the described network and report its live endpoints.
    async fn provision(&self, network: &NetworkDescriptor) -> Result<ProvisionedNetwork, DynError>;

    /// Stop a network previously returned by [`Self::provision`].
    async fn shutdown(&self, network: &ProvisionedNetwork) -> Result<(), DynError>;
}
