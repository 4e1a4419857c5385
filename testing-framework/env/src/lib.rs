use std::env;

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}

#[must_use]
pub fn workload_default_timeout_secs() -> Option<u64> {
    parse_var("WORKLOAD_DEFAULT_TIMEOUT_SECS")
}

#[must_use]
pub fn workload_health_timeout_secs() -> Option<u64> {
    parse_var("WORKLOAD_HEALTH_TIMEOUT_SECS")
}

#[must_use]
pub fn workload_health_poll_ms() -> Option<u64> {
    parse_var("WORKLOAD_HEALTH_POLL_MS")
}

#[must_use]
pub fn workload_provision_timeout_secs() -> Option<u64> {
    parse_var("WORKLOAD_PROVISION_TIMEOUT_SECS")
}

fn parse_var(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}
