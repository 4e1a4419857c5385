use std::{io, process::ExitStatus, time::Duration};

use thiserror::Error;

/// Errors raised while driving the external bootstrap command.
#[derive(Debug, Error)]
pub enum CommandProvisionerError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("failed to encode network descriptor: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("`{command}` printed an unreadable network report: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}
