use super::SharedSecret;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub const HEALTH_PATH: &str = "/api/health/detailed";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Decides whether a server can take traffic. Never fails: anything that
/// is not a positive answer counts as unhealthy.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, base_url: &str) -> bool;
}

pub struct HttpHealthProbe {
    client: Client,
    secret: SharedSecret,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(client: Client, secret: SharedSecret) -> Self {
        Self {
            client,
            secret,
            timeout: PROBE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, base_url: &str) -> bool {
        let url = format!("{}{}", base_url, HEALTH_PATH);
        let resp = match self
            .client
            .get(&url)
            .header(super::SECRET_HEADER, self.secret.get())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                info!("Health check failed for {}: {}", base_url, e);
                return false;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            info!("Health check failed for {}: status {}", base_url, status);
            return false;
        }

        match resp.json::<Value>().await {
            Ok(body) => {
                let healthy = body["overall"]["healthy"].as_bool() == Some(true);
                if healthy {
                    debug!("Health check passed for {}", base_url);
                } else {
                    info!("Server {} reports unhealthy", base_url);
                }
                healthy
            }
            Err(e) => {
                info!("Health check failed for {}: invalid body: {}", base_url, e);
                false
            }
        }
    }
}
