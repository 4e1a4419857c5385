use tracing_subscriber::{EnvFilter, fmt};
use workload_core::NetworkDescriptor;
use workload_env as tf_env;

/// Owner recorded on networks this binary bootstraps.
pub const NETWORK_OWNER: &str = "workload";

pub fn init_tracing() {
    let filter = tf_env::rust_log()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[must_use]
pub fn default_network() -> NetworkDescriptor {
    NetworkDescriptor::new(NETWORK_OWNER)
}
