//! Target reachability
//!
//! The harness only needs to know whether the target answers before a run
//! starts. Starting and stopping a server lives with the caller.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Timeout for a single reachability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Checks whether a target answers
#[async_trait]
pub trait ServerProbe: Send + Sync {
    /// Check if the base URL answers with a 2xx or 3xx status
    async fn is_reachable(&self, base_url: &str) -> bool;

    /// Poll until reachable or `timeout` elapses
    async fn wait_until_reachable(&self, base_url: &str, timeout: Duration, interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_reachable(base_url).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(interval).await;
        }
    }
}

/// Probe issuing `GET /` without following redirects
#[derive(Debug, Clone)]
pub struct HttpServerProbe {
    client: reqwest::Client,
}

impl HttpServerProbe {
    /// Create probe
    ///
    /// # Errors
    /// Returns the reqwest builder error if the client cannot be built
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ServerProbe for HttpServerProbe {
    async fn is_reachable(&self, base_url: &str) -> bool {
        let url = format!("{}/", base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(url = %url, status = status.as_u16(), "probe answered");
                status.is_success() || status.is_redirection()
            }
            Err(e) => {
                debug!(url = %url, error = %e, "probe failed");
                false
            }
        }
    }
}
