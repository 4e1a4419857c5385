use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use workload_core::{
    BootstrapPolicy, ConfigResolver, Csv, DynError, HealthAwaiter, HealthCheck, HealthError,
    NetworkDescriptor, NetworkProvisioner, NodeSpec, ProvisionedChain, ProvisionedNetwork,
    ProvisionedNode, ProvisionedSubnet, ResolveError, SubnetSpec,
};

#[derive(Default)]
struct FakeProvisioner {
    calls: AtomicUsize,
    seen: Mutex<Option<NetworkDescriptor>>,
    stopped: Mutex<Vec<String>>,
    chains_per_subnet: usize,
    fail: bool,
}

impl FakeProvisioner {
    fn with_chains(chains_per_subnet: usize) -> Self {
        Self {
            chains_per_subnet,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkProvisioner for FakeProvisioner {
    async fn provision(&self, network: &NetworkDescriptor) -> Result<ProvisionedNetwork, DynError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock().unwrap() = Some(network.clone());
        if self.fail {
            return Err("bootstrap engine unavailable".into());
        }

        let nodes = network
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| ProvisionedNode {
                node_id: node.node_id.clone(),
                uri: format!("http://127.0.0.1:{}", 9650 + index * 2),
            })
            .collect();

        let subnets = network
            .subnets
            .iter()
            .map(|subnet| ProvisionedSubnet {
                name: subnet.name.clone(),
                subnet_id: format!("{}-id", subnet.name),
                chains: (0..self.chains_per_subnet)
                    .map(|index| ProvisionedChain {
                        vm_name: subnet.name.clone(),
                        chain_id: format!("{}-chain-{index}", subnet.name),
                    })
                    .collect(),
            })
            .collect();

        Ok(ProvisionedNetwork {
            network_id: "net-1".to_owned(),
            nodes,
            subnets,
        })
    }

    async fn shutdown(&self, network: &ProvisionedNetwork) -> Result<(), DynError> {
        self.stopped.lock().unwrap().push(network.network_id.clone());
        Ok(())
    }
}

struct FakeHealth {
    healthy: bool,
    probed: Mutex<Vec<String>>,
}

impl FakeHealth {
    fn new(healthy: bool) -> Self {
        Self {
            healthy,
            probed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HealthAwaiter for FakeHealth {
    async fn await_healthy(&self, uris: &[String], timeout: Duration) -> Result<(), HealthError> {
        self.probed.lock().unwrap().extend(uris.iter().cloned());
        if self.healthy {
            Ok(())
        } else {
            Err(HealthError::Timeout {
                uri: uris[0].clone(),
                timeout,
            })
        }
    }
}

fn two_subnets(nodes: &[NodeSpec]) -> Vec<SubnetSpec> {
    let validator_ids: Vec<String> = nodes.iter().map(|node| node.node_id.clone()).collect();
    ["xsvm-a", "xsvm-b"]
        .into_iter()
        .map(|name| SubnetSpec {
            name: name.to_owned(),
            validator_ids: validator_ids.clone(),
            chains: vec!["xsvm".to_owned()],
        })
        .collect()
}

fn policy(node_count: usize) -> BootstrapPolicy {
    BootstrapPolicy {
        node_count,
        reuse_network: true,
        shutdown_delay: Duration::from_secs(12),
    }
}

#[tokio::test]
async fn supplied_uris_are_used_verbatim_without_bootstrap() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health);
    let mut network = NetworkDescriptor::new("workload");

    let resolution = resolver
        .resolve(
            Csv::parse("http://10.0.0.2:9650,http://10.0.0.1:9650"),
            Csv::parse("chain-b,chain-a,chain-c"),
            &mut network,
            &policy(5),
        )
        .await
        .unwrap();

    assert!(!resolution.bootstrapped());
    assert_eq!(provisioner.calls(), 0);
    assert!(!network.has_nodes());
    assert!(health.probed.lock().unwrap().is_empty());

    let config = resolution.config;
    assert_eq!(
        config.uris(),
        ["http://10.0.0.2:9650", "http://10.0.0.1:9650"]
    );
    assert_eq!(config.chain_ids(), ["chain-b", "chain-a", "chain-c"]);
    assert!(config.reuse_network());
    assert_eq!(config.shutdown_delay(), Duration::from_secs(12));
}

#[tokio::test]
async fn supplied_uris_are_probed_when_health_check_enabled() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health).with_health_check(
        HealthCheck::Await {
            timeout: Duration::from_secs(1),
        },
    );

    let resolution = resolver
        .resolve(
            Csv::parse("http://10.0.0.1:9650"),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &BootstrapPolicy::default(),
        )
        .await
        .unwrap();

    assert_eq!(*health.probed.lock().unwrap(), ["http://10.0.0.1:9650"]);
    assert!(resolution.config.chain_ids().is_empty());
}

#[tokio::test]
async fn unhealthy_supplied_uris_fail_resolution() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(false);
    let resolver = ConfigResolver::new(&provisioner, &health).with_health_check(
        HealthCheck::Await {
            timeout: Duration::from_secs(1),
        },
    );

    let err = resolver
        .resolve(
            Csv::parse("http://10.0.0.1:9650"),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &BootstrapPolicy::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NetworkUnhealthy { .. }));
    assert_eq!(provisioner.calls(), 0);
}

#[tokio::test]
async fn empty_uris_bootstrap_a_network() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health).with_subnet_factory(&two_subnets);
    let mut network = NetworkDescriptor::new("workload");

    let resolution = resolver
        .resolve(
            Csv::default(),
            Csv::parse("ignored"),
            &mut network,
            &policy(4),
        )
        .await
        .unwrap();

    assert!(resolution.bootstrapped());
    assert_eq!(provisioner.calls(), 1);
    assert!(
        provisioner.stopped.lock().unwrap().is_empty(),
        "a usable network is left to the caller"
    );

    assert_eq!(network.nodes.len(), 4);
    assert_eq!(network.subnets.len(), 2);
    assert_eq!(
        provisioner.seen.lock().unwrap().as_ref(),
        Some(&network),
        "provisioner must see the completed descriptor"
    );

    let config = &resolution.config;
    assert_eq!(
        config.uris(),
        [
            "http://127.0.0.1:9650",
            "http://127.0.0.1:9652",
            "http://127.0.0.1:9654",
            "http://127.0.0.1:9656",
        ]
    );
    assert_eq!(config.chain_ids(), ["xsvm-a-chain-0", "xsvm-b-chain-0"]);
    assert!(config.reuse_network());
    assert_eq!(config.shutdown_delay(), Duration::from_secs(12));
}

#[tokio::test]
async fn only_the_first_chain_of_each_subnet_is_targeted() {
    let provisioner = FakeProvisioner::with_chains(3);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health).with_subnet_factory(&two_subnets);

    let resolution = resolver
        .resolve(
            Csv::default(),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &policy(2),
        )
        .await
        .unwrap();

    assert_eq!(
        resolution.config.chain_ids(),
        ["xsvm-a-chain-0", "xsvm-b-chain-0"]
    );
}

#[tokio::test]
async fn predefined_nodes_and_subnets_are_kept() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health).with_subnet_factory(&two_subnets);

    let nodes = NodeSpec::generate(2).unwrap();
    let subnet = SubnetSpec {
        name: "custom".to_owned(),
        validator_ids: vec![nodes[0].node_id.clone()],
        chains: vec!["custom-vm".to_owned()],
    };
    let mut network = NetworkDescriptor {
        owner: "workload".to_owned(),
        nodes: nodes.clone(),
        subnets: vec![subnet.clone()],
    };

    let resolution = resolver
        .resolve(Csv::default(), Csv::default(), &mut network, &policy(7))
        .await
        .unwrap();

    assert_eq!(network.nodes, nodes);
    assert_eq!(network.subnets, vec![subnet]);
    assert_eq!(resolution.config.uris().len(), 2);
    assert_eq!(resolution.config.chain_ids(), ["custom-chain-0"]);
}

#[tokio::test]
async fn no_subnet_factory_means_no_chain_ids() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health);

    let resolution = resolver
        .resolve(
            Csv::default(),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &policy(3),
        )
        .await
        .unwrap();

    assert_eq!(resolution.config.uris().len(), 3);
    assert!(resolution.config.chain_ids().is_empty());
}

#[tokio::test]
async fn node_synthesis_failure_is_fatal() {
    let provisioner = FakeProvisioner::with_chains(1);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health);

    let err = resolver
        .resolve(
            Csv::default(),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &policy(0),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NodeCreation { .. }));
    assert_eq!(provisioner.calls(), 0);
}

#[tokio::test]
async fn bootstrap_failure_reports_no_endpoints() {
    let provisioner = FakeProvisioner::failing();
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health);

    let err = resolver
        .resolve(
            Csv::default(),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &policy(1),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NoEndpoints { source: Some(_), .. }));
}

#[tokio::test]
async fn subnet_without_chains_is_rejected() {
    let provisioner = FakeProvisioner::with_chains(0);
    let health = FakeHealth::new(true);
    let resolver = ConfigResolver::new(&provisioner, &health).with_subnet_factory(&two_subnets);

    let err = resolver
        .resolve(
            Csv::default(),
            Csv::default(),
            &mut NetworkDescriptor::default(),
            &policy(1),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::SubnetWithoutChains { ref subnet } if subnet == "xsvm-a"));
    assert_eq!(*provisioner.stopped.lock().unwrap(), ["net-1"]);
}
