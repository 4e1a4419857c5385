use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client as ReqwestClient;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::constants::{HEALTH_PATH, health_poll_interval};

/// Error raised when endpoints fail to report healthy.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HealthError {
    #[error("timeout waiting for {uri} to report healthy after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },
    #[error("endpoint uri must not be empty")]
    EmptyUri,
}

/// Blocks until every endpoint is confirmed healthy.
#[async_trait]
pub trait HealthAwaiter: Send + Sync {
    async fn await_healthy(&self, uris: &[String], timeout: Duration) -> Result<(), HealthError>;
}

/// Probes `<uri>/ext/health` on every endpoint until it answers with a
/// success status.
#[derive(Clone)]
pub struct HttpHealthAwaiter {
    client: ReqwestClient,
    poll_interval: Duration,
}

impl HttpHealthAwaiter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_poll_interval(health_poll_interval())
    }

    #[must_use]
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            client: ReqwestClient::new(),
            poll_interval,
        }
    }

    /// Single probe against one endpoint.
    pub async fn is_healthy(&self, uri: &str) -> bool {
        let url = health_url(uri);
        self.client
            .get(&url)
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }

    async fn wait_for_single(&self, uri: &str, timeout_duration: Duration) -> Result<(), HealthError> {
        if uri.trim().is_empty() {
            return Err(HealthError::EmptyUri);
        }

        debug!(uri, "probing health endpoint");
        let probe = async {
            loop {
                if self.is_healthy(uri).await {
                    return;
                }

                sleep(self.poll_interval).await;
            }
        };

        timeout(timeout_duration, probe)
            .await
            .map_err(|_| HealthError::Timeout {
                uri: uri.to_owned(),
                timeout: timeout_duration,
            })
    }
}

impl Default for HttpHealthAwaiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthAwaiter for HttpHealthAwaiter {
    async fn await_healthy(
        &self,
        uris: &[String],
        timeout_duration: Duration,
    ) -> Result<(), HealthError> {
        if uris.is_empty() {
            return Ok(());
        }

        info!(
            ?uris,
            timeout_secs = timeout_duration.as_secs_f32(),
            poll_ms = self.poll_interval.as_millis(),
            "waiting for endpoints to report healthy"
        );

        let probes = uris
            .iter()
            .map(|uri| self.wait_for_single(uri, timeout_duration));

        try_join_all(probes).await.map(|_| ())
    }
}

fn health_url(uri: &str) -> String {
    format!("{}{HEALTH_PATH}", uri.trim_end_matches('/'))
}
