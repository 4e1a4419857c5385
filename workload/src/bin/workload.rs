use std::{process::ExitCode, sync::Arc};

use anyhow::Context as _;
use clap::Parser as _;
use futures::future::join_all;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};
use workload::{
    WorkloadFlags, defaults, provisioner_from_flags, register_network_teardown, subnets_for_vms,
};
use workload_core::{
    ConfigResolver, HttpHealthAwaiter, TestContext, TestReporter as _,
    constants::health_poll_interval,
};

fn main() -> ExitCode {
    defaults::init_tracing();
    let flags = WorkloadFlags::parse();

    let runtime = match build_runtime() {
        Ok(runtime) => Arc::new(runtime),
        Err(err) => {
            error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let tc = TestContext::new();
    let outcome = tc.run(|tc| run_workload(tc, &runtime, &flags));
    outcome.exit_code()
}

fn build_runtime() -> anyhow::Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
}

fn run_workload(tc: &TestContext, runtime: &Arc<Runtime>, flags: &WorkloadFlags) {
    let provisioner = provisioner_from_flags(&flags.network);
    let health = HttpHealthAwaiter::new();
    let subnet_factory = subnets_for_vms(flags.network.subnet_vms());
    let resolver = ConfigResolver::new(provisioner.as_ref(), &health)
        .with_health_check(flags.network.health_check())
        .with_subnet_factory(&subnet_factory);

    tc.by("resolving workload configuration");
    let mut network = defaults::default_network();
    let resolved = runtime.block_on(resolver.resolve(
        flags.uris(),
        flags.chain_ids(),
        &mut network,
        &flags.network.bootstrap_policy(),
    ));
    let resolution = match resolved {
        Ok(resolution) => resolution,
        Err(err) => {
            tc.errorf(format_args!("failed to resolve workload config: {err}"));
            tc.fail_now();
        }
    };

    if let Some(provisioned) = resolution.network {
        register_network_teardown(
            tc,
            Arc::clone(runtime),
            Arc::clone(&provisioner),
            provisioned,
            &resolution.config,
        );
    }

    let config = resolution.config;
    info!(
        uris = ?config.uris(),
        chain_ids = ?config.chain_ids(),
        reuse_network = config.reuse_network(),
        "workload configuration resolved"
    );

    tc.by("waiting for every endpoint to report healthy");
    let scope = tc.with_default_timeout();
    tc.require_eventually(
        || {
            let probes = join_all(config.uris().iter().map(|uri| health.is_healthy(uri)));
            runtime
                .block_on(scope.run(probes))
                .is_ok_and(|results| results.into_iter().all(|healthy| healthy))
        },
        scope.remaining(),
        health_poll_interval(),
        "endpoints did not report healthy",
    );
    tc.outf(format_args!(
        "{} endpoints healthy across {} chains",
        config.uris().len(),
        config.chain_ids().len()
    ));
}
