#![cfg(unix)]

use std::{fs, path::Path, time::Duration};

use tempfile::TempDir;
use workload_core::{
    NetworkDescriptor, NetworkProvisioner as _, NodeSpec, ProvisionedNetwork, SubnetSpec,
};
use workload_runner_command::{CommandProvisioner, CommandProvisionerError};

const REPORT: &str = r#"{
  "network_id": "net-42",
  "nodes": [
    {"node_id": "NodeID-a", "uri": "http://127.0.0.1:9650"},
    {"node_id": "NodeID-b", "uri": "http://127.0.0.1:9652"}
  ],
  "subnets": [
    {"name": "xsvm", "subnet_id": "s-1", "chains": [{"vm_name": "xsvm", "chain_id": "c-1"}]}
  ]
}"#;

fn write_script(dir: &Path, body: &str) -> String {
    let path = dir.join("provision.sh");
    fs::write(&path, body).unwrap();
    path.display().to_string()
}

fn provisioner(script: String) -> CommandProvisioner {
    CommandProvisioner::new("sh")
        .with_args([script])
        .with_timeout(Duration::from_secs(10))
}

#[tokio::test]
async fn start_sends_descriptor_and_parses_report() {
    let dir = TempDir::new().unwrap();
    let captured = dir.path().join("descriptor.json");
    let script = write_script(
        dir.path(),
        &format!(
            "[ \"$1\" = start ] || exit 3\ncat > {}\ncat <<'EOF'\n{REPORT}\nEOF\n",
            captured.display()
        ),
    );

    let mut network = NetworkDescriptor::new("workload");
    network.nodes = NodeSpec::generate(2).unwrap();

    let provisioned = provisioner(script).provision(&network).await.unwrap();

    assert_eq!(provisioned.network_id, "net-42");
    assert_eq!(
        provisioned.uris().collect::<Vec<_>>(),
        ["http://127.0.0.1:9650", "http://127.0.0.1:9652"]
    );
    assert_eq!(provisioned.subnets[0].chains[0].chain_id, "c-1");

    let sent: serde_json::Value =
        serde_json::from_slice(&fs::read(&captured).unwrap()).unwrap();
    assert_eq!(sent["owner"], "workload");
    assert_eq!(sent["nodes"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn stop_passes_network_id() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("stopped");
    let script = write_script(
        dir.path(),
        &format!(
            "[ \"$1\" = stop ] || exit 3\nprintf '%s' \"$2\" > {}\n",
            marker.display()
        ),
    );

    let network = ProvisionedNetwork {
        network_id: "net-42".to_owned(),
        nodes: Vec::new(),
        subnets: Vec::new(),
    };
    provisioner(script).shutdown(&network).await.unwrap();

    assert_eq!(fs::read_to_string(marker).unwrap(), "net-42");
}

#[tokio::test]
async fn non_zero_exit_carries_stderr() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "echo 'no free ports' >&2\nexit 7\n");

    let err = provisioner(script)
        .start(&NetworkDescriptor::default())
        .await
        .unwrap_err();

    match err {
        CommandProvisionerError::Failed { status, stderr, .. } => {
            assert_eq!(status.code(), Some(7));
            assert_eq!(stderr, "no free ports");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_report_is_a_decode_error() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "cat > /dev/null\necho 'not json'\n");

    let err = provisioner(script)
        .start(&NetworkDescriptor::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CommandProvisionerError::Decode { .. }));
}

#[tokio::test]
async fn slow_command_times_out() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "sleep 5\n");

    let err = provisioner(script)
        .with_timeout(Duration::from_millis(100))
        .start(&NetworkDescriptor::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CommandProvisionerError::Timeout { .. }));
}

#[tokio::test]
async fn timeout_covers_unread_stdin() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "exec sleep 30\n");

    let mut network = NetworkDescriptor::new("workload");
    network.nodes = NodeSpec::generate(256).unwrap();
    let validator_ids: Vec<String> = network.nodes.iter().map(|node| node.node_id.clone()).collect();
    network.subnets = (0..8)
        .map(|index| SubnetSpec {
            name: format!("subnet-{index}"),
            validator_ids: validator_ids.clone(),
            chains: vec!["xsvm".to_owned()],
        })
        .collect();
    assert!(serde_json::to_vec(&network).unwrap().len() > 100_000);

    let provisioner = provisioner(script).with_timeout(Duration::from_millis(500));
    let start = provisioner.start(&network);
    let err = tokio::time::timeout(Duration::from_secs(5), start)
        .await
        .expect("provisioner timeout did not fire")
        .unwrap_err();

    assert!(matches!(err, CommandProvisionerError::Timeout { .. }));
}

#[tokio::test]
async fn missing_program_fails_to_spawn() {
    let err = CommandProvisioner::new("/nonexistent/bootstrap-network")
        .start(&NetworkDescriptor::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CommandProvisionerError::Spawn { .. }));
}
