pub mod defaults;
pub mod flags;
pub mod provisioner;
pub mod subnets;
pub mod teardown;

pub use flags::{NetworkFlags, WorkloadFlags};
pub use provisioner::provisioner_from_flags;
pub use subnets::subnets_for_vms;
pub use teardown::register_network_teardown;
