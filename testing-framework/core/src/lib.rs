pub mod config;
pub mod constants;
pub mod context;
pub mod csv;
pub mod network;

use std::{sync::LazyLock, time::Duration};

pub use config::{
    BootstrapPolicy, Config, ConfigResolver, HealthCheck, Resolution, ResolveError,
};
pub use context::{
    CleanupActionError, CleanupState, Failure, RunOutcome, ScopeEnd, ScopeError, TestContext,
    TestReporter, TimeoutScope, eventually, require_eventually,
};
pub use csv::Csv;
pub use network::{
    DynError, HealthAwaiter, HealthError, HttpHealthAwaiter, NetworkDescriptor,
    NetworkProvisioner, NodeCreationError, NodeSpec, ProvisionedChain, ProvisionedNetwork,
    ProvisionedNode, ProvisionedSubnet, SubnetFactory, SubnetSpec,
};

static IS_SLOW_TEST_ENV: LazyLock<bool> = LazyLock::new(workload_env::slow_test_env);

/// In slow test environments like Codecov, use 2x timeout.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if *IS_SLOW_TEST_ENV { d.saturating_mul(2) } else { d }
}
