use std::time::Duration;

use workload_env as tf_env;

/// Default timeout for operations that do not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Default number of nodes synthesized for an ephemeral network.
pub const DEFAULT_NODE_COUNT: usize = 5;

/// Upper bound on synthesized nodes.
pub const MAX_NODE_COUNT: usize = 256;

/// Delay applied before network shutdown when delayed shutdown is requested.
/// Leaves collectors one more scrape of the network before it goes away.
pub const NETWORK_SHUTDOWN_DELAY: Duration = Duration::from_secs(12);

/// Default time budget for endpoints to report healthy.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between health probes.
pub const DEFAULT_HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default time budget for an external provisioner invocation.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Path probed on every node to decide health.
pub const HEALTH_PATH: &str = "/ext/health";

/// Resolve the default timeout from `WORKLOAD_DEFAULT_TIMEOUT_SECS`, falling
/// back to [`DEFAULT_TIMEOUT`].
pub fn default_timeout() -> Duration {
    env_secs(tf_env::workload_default_timeout_secs(), DEFAULT_TIMEOUT)
}

pub fn health_timeout() -> Duration {
    env_secs(tf_env::workload_health_timeout_secs(), DEFAULT_HEALTH_TIMEOUT)
}

pub fn health_poll_interval() -> Duration {
    tf_env::workload_health_poll_ms()
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_HEALTH_POLL_INTERVAL)
}

pub fn provision_timeout() -> Duration {
    env_secs(
        tf_env::workload_provision_timeout_secs(),
        DEFAULT_PROVISION_TIMEOUT,
    )
}

fn env_secs(value: Option<u64>, default: Duration) -> Duration {
    value.map(Duration::from_secs).unwrap_or(default)
}
