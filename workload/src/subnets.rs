use workload_core::{Csv, NodeSpec, SubnetSpec};

/// Subnet layout with one subnet per VM name, validated by every node and
/// running a single chain of that VM.
pub fn subnets_for_vms(vms: Csv) -> impl Fn(&[NodeSpec]) -> Vec<SubnetSpec> + Send + Sync {
    let vms = vms.into_inner();
    move |nodes: &[NodeSpec]| {
        let validator_ids: Vec<String> = nodes.iter().map(|node| node.node_id.clone()).collect();
        vms.iter()
            .map(|vm| SubnetSpec {
                name: vm.clone(),
                validator_ids: validator_ids.clone(),
                chains: vec![vm.clone()],
            })
            .collect()
    }
}
