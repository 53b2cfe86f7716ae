use super::pool::{ServerHealth, ServerPool};
use super::probe::HttpHealthProbe;
use super::{SECRET_HEADER, SharedSecret};
use crate::errors::{BridgeError, FailureCause};
use crate::models::ApiError;
use crate::utils::http::{DEFAULT_MAX_BODY_BYTES, limited_text};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const WHATSAPP_PREFIX: &str = "/api/whatsapp";
pub const YOUTUBE_PREFIX: &str = "/api/youtube";

/// One call against the backing API. The full URL is
/// `{active server}{prefix}{endpoint}`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub prefix: &'static str,
    pub endpoint: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(prefix: &'static str, endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            prefix,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    pub fn post(prefix: &'static str, endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            prefix,
            endpoint: endpoint.into(),
            body: Some(body),
        }
    }
}

/// A successful (2xx) response, body untouched.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        serde_json::from_str(&self.body).map_err(|e| BridgeError::Decode(e.to_string()))
    }
}

/// Authenticated client for the backing API that moves to another
/// configured server on 5xx or network failure and retries once.
pub struct FailoverClient {
    http: Client,
    pool: ServerPool,
    secret: SharedSecret,
    timeout: Duration,
}

impl FailoverClient {
    pub fn new(server_urls: &str, secret: &str) -> Self {
        let http = crate::utils::http::default_http_client();
        let secret = SharedSecret::new(secret);
        let probe = Arc::new(HttpHealthProbe::new(http.clone(), secret.clone()));
        Self::with_pool(http, ServerPool::new(probe, server_urls), secret)
    }

    pub fn with_pool(http: Client, pool: ServerPool, secret: SharedSecret) -> Self {
        Self {
            http,
            pool,
            secret,
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Active server, selecting one first if none is active yet.
    pub async fn active_server(&self) -> Result<String, BridgeError> {
        self.pool.active_or_select().await
    }

    pub fn current_url(&self) -> Option<String> {
        self.pool.active_url()
    }

    pub fn server_urls(&self) -> Vec<String> {
        self.pool.candidates()
    }

    /// Send `request` to the active server.
    ///
    /// 4xx fails immediately. 5xx and transport errors trigger one failover
    /// sweep; if it finds another server the same request is sent there
    /// exactly once and its outcome is final.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, BridgeError> {
        let base = self.active_server().await?;
        let err = match self.send(&base, request).await {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };

        if !err.is_failover_trigger() {
            return Err(err);
        }

        warn!(
            "{} {}{} failed on {}: {}, attempting failover",
            request.method, request.prefix, request.endpoint, base, err
        );
        let Some(next) = self.pool.failover(&base).await else {
            return Err(err);
        };

        info!(
            "Retrying {} {}{} on {}",
            request.method, request.prefix, request.endpoint, next
        );
        self.send(&next, request).await.map_err(|e| match e {
            BridgeError::RequestFailed { cause, .. } => BridgeError::RequestFailed {
                cause,
                after_failover: true,
            },
            BridgeError::ClientError { status, reason } => BridgeError::RequestFailed {
                cause: FailureCause::Status {
                    code: status,
                    reason,
                },
                after_failover: true,
            },
            other => other,
        })
    }

    async fn send(&self, base: &str, request: &ApiRequest) -> Result<ApiResponse, BridgeError> {
        let url = format!("{}{}{}", base, request.prefix, request.endpoint);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(SECRET_HEADER, self.secret.get())
            .timeout(self.timeout);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| BridgeError::RequestFailed {
            cause: FailureCause::Network(e.to_string()),
            after_failover: false,
        })?;

        let status = resp.status();
        let body = limited_text(resp, DEFAULT_MAX_BODY_BYTES).await;

        // The server has already acted on a 2xx, so an unreadable body must
        // not be retried elsewhere.
        if status.is_success() {
            let body = body.map_err(|e| BridgeError::Decode(e.to_string()))?;
            return Ok(ApiResponse {
                status: status.as_u16(),
                body,
            });
        }

        let reason = match body {
            Ok(body) => error_reason(status, &body),
            Err(e) => {
                debug!("Unreadable {} body from {}: {}", status, url, e);
                status.canonical_reason().unwrap_or_default().to_string()
            }
        };
        if status.is_server_error() {
            Err(BridgeError::RequestFailed {
                cause: FailureCause::Status {
                    code: status.as_u16(),
                    reason,
                },
                after_failover: false,
            })
        } else {
            Err(BridgeError::ClientError {
                status: status.as_u16(),
                reason,
            })
        }
    }

    /// Replace the server list and/or the secret. Empty values are ignored.
    /// New URLs leave the pool uninitialised until the next call.
    pub async fn reconfigure(&self, server_urls: Option<&str>, secret: Option<&str>) {
        if let Some(urls) = server_urls.filter(|u| !u.trim().is_empty()) {
            self.pool.configure(urls).await;
        }
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.secret.set(secret);
            debug!("Shared secret updated");
        }
    }

    /// Probe the active server (selecting one first if needed).
    pub async fn check_current_health(&self) -> Result<(String, bool), BridgeError> {
        let url = self.active_server().await?;
        Ok(self.pool.probe_active().await.unwrap_or((url, false)))
    }

    pub async fn all_servers_health(&self) -> Vec<ServerHealth> {
        self.pool.probe_all().await
    }
}

/// Prefer the API's `{error}` message over the bare status text.
fn error_reason(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string())
}
