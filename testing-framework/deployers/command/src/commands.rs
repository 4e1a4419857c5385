use std::{io::ErrorKind, process::Stdio, time::Duration};

use tokio::{
    io::AsyncWriteExt as _,
    process::{ChildStdin, Command},
    time::timeout,
};
use tracing::{debug, warn};

use crate::errors::CommandProvisionerError;

/// Runs `command` to completion, feeding `stdin` when given, and returns its
/// stdout. Writing stdin and collecting output share one deadline; the child
/// is killed if it outlives `timeout_duration`.
pub(crate) async fn run_command(
    mut command: Command,
    stdin: Option<Vec<u8>>,
    timeout_duration: Duration,
    description: &str,
) -> Result<Vec<u8>, CommandProvisionerError> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = description, "spawning provisioner command");
    let mut child = command
        .spawn()
        .map_err(|source| CommandProvisionerError::Spawn {
            command: description.to_owned(),
            source,
        })?;

    let feed = feed_stdin(child.stdin.take(), stdin, description);
    let (fed, output) = timeout(timeout_duration, async move {
        tokio::join!(feed, child.wait_with_output())
    })
    .await
    .map_err(|_| {
        warn!(
            command = description,
            timeout = ?timeout_duration,
            "provisioner command timed out"
        );
        CommandProvisionerError::Timeout {
            command: description.to_owned(),
            timeout: timeout_duration,
        }
    })?;

    fed?;
    let output = output.map_err(|source| CommandProvisionerError::Spawn {
        command: description.to_owned(),
        source,
    })?;

    if output.status.success() {
        return Ok(output.stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    warn!(
        command = description,
        status = ?output.status,
        %stderr,
        "provisioner command failed"
    );
    Err(CommandProvisionerError::Failed {
        command: description.to_owned(),
        status: output.status,
        stderr,
    })
}

/// Writes `input` to the child's stdin and closes it.
async fn feed_stdin(
    pipe: Option<ChildStdin>,
    input: Option<Vec<u8>>,
    description: &str,
) -> Result<(), CommandProvisionerError> {
    let (Some(mut pipe), Some(input)) = (pipe, input) else {
        return Ok(());
    };

    match pipe.write_all(&input).await {
        Ok(()) => Ok(()),
        // The command exited without reading its input; its status decides.
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {
            debug!(command = description, "provisioner command closed stdin early");
            Ok(())
        }
        Err(source) => Err(CommandProvisionerError::Spawn {
            command: description.to_owned(),
            source,
        }),
    }
}
