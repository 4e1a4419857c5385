use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;
use workload_core::{
    DynError, NetworkDescriptor, NetworkProvisioner, ProvisionedNetwork, adjust_timeout,
    constants::provision_timeout,
};

use crate::{commands::run_command, errors::CommandProvisionerError};

const START_VERB: &str = "start";
const STOP_VERB: &str = "stop";

/// Provisions networks through an external bootstrap command.
///
/// `<program> [args…] start` receives the descriptor as JSON on stdin and must
/// print the resulting [`ProvisionedNetwork`] as JSON on stdout.
/// `<program> [args…] stop <network-id>` tears it down again.
#[derive(Clone, Debug)]
pub struct CommandProvisioner {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProvisioner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: adjust_timeout(provision_timeout()),
        }
    }

    /// Arguments placed before the verb.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn start(
        &self,
        network: &NetworkDescriptor,
    ) -> Result<ProvisionedNetwork, CommandProvisionerError> {
        let payload = serde_json::to_vec(network)
            .map_err(|source| CommandProvisionerError::Encode { source })?;
        let description = self.describe(&[START_VERB]);

        info!(
            command = %description,
            nodes = network.nodes.len(),
            subnets = network.subnets.len(),
            "starting network"
        );

        let stdout = run_command(
            self.command(&[START_VERB]),
            Some(payload),
            self.timeout,
            &description,
        )
        .await?;

        let provisioned: ProvisionedNetwork = serde_json::from_slice(&stdout).map_err(|source| {
            CommandProvisionerError::Decode {
                command: description.clone(),
                source,
            }
        })?;

        info!(
            network_id = %provisioned.network_id,
            nodes = provisioned.nodes.len(),
            "network started"
        );
        Ok(provisioned)
    }

    pub async fn stop(&self, network: &ProvisionedNetwork) -> Result<(), CommandProvisionerError> {
        let verb = [STOP_VERB, network.network_id.as_str()];
        let description = self.describe(&verb);
        info!(network_id = %network.network_id, "stopping network");

        run_command(self.command(&verb), None, self.timeout, &description).await?;

        info!(network_id = %network.network_id, "network stopped");
        Ok(())
    }

    fn command(&self, verb: &[&str]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).args(verb);
        command
    }

    fn describe(&self, verb: &[&str]) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .chain(verb.iter().map(|part| (*part).to_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl NetworkProvisioner for CommandProvisioner {
    async fn provision(&self, network: &NetworkDescriptor) -> Result<ProvisionedNetwork, DynError> {
        self.start(network).await.map_err(Into::into)
    }

    async fn shutdown(&self, network: &ProvisionedNetwork) -> Result<(), DynError> {
        self.stop(network).await.map_err(Into::into)
    }
}
