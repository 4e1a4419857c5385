mod commands;
mod errors;
mod provisioner;

pub use errors::CommandProvisionerError;
pub use provisioner::CommandProvisioner;
