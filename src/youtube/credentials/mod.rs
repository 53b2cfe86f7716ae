use crate::utils::http::{DEFAULT_MAX_BODY_BYTES, limited_text};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Supplies OAuth bearer tokens for the YouTube Data API. The initial
/// authorization happens outside this process.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A token fixed at startup.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"[REDACTED]").finish()
    }
}

#[async_trait]
impl CredentialSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        if self.0.is_empty() {
            anyhow::bail!("no YouTube access token configured");
        }
        Ok(self.0.clone())
    }
}

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_MS: i64 = 60_000;

/// Token JSON as written by the Google OAuth flow. Fields this crate does
/// not use are kept so a rewrite does not lose them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredToken {
    #[serde(default)]
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    /// Unix time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry_date: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl StoredToken {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.access_token.is_empty()
            || self
                .expiry_date
                .is_some_and(|expiry| now_ms + EXPIRY_SKEW_MS >= expiry)
    }
}

/// OAuth client registration used to exchange a refresh token.
#[derive(Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// An OAuth token JSON file. Read on every request so an external rewrite
/// is picked up. With an [`OAuthClient`] attached, an expired token is
/// refreshed with its `refresh_token` and written back.
#[derive(Debug)]
pub struct TokenFile {
    path: PathBuf,
    oauth: Option<OAuthClient>,
    http: reqwest::Client,
    refresh_lock: Mutex<()>,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            oauth: None,
            http: crate::utils::http::default_http_client(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_refresh(mut self, oauth: OAuthClient) -> Self {
        self.oauth = Some(oauth);
        self
    }

    async fn load(&self) -> Result<StoredToken> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read token file {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid token file {}", self.path.display()))
    }

    async fn save(&self, token: &StoredToken) -> Result<()> {
        let content = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("failed to write token file {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms).await?;
        }
        Ok(())
    }

    async fn refresh(&self, oauth: &OAuthClient, token: &mut StoredToken) -> Result<()> {
        let Some(refresh_token) = token.refresh_token.clone() else {
            anyhow::bail!(
                "token in {} has expired and has no refresh_token",
                self.path.display()
            );
        };
        let params = [
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let resp = self
            .http
            .post(&oauth.token_uri)
            .form(&params)
            .send()
            .await
            .context("token refresh request failed")?;
        let status = resp.status();
        let body = limited_text(resp, DEFAULT_MAX_BODY_BYTES).await?;
        let parsed: RefreshResponse = serde_json::from_str(&body)
            .with_context(|| format!("token refresh returned {}: {}", status, body))?;

        if let Some(error) = parsed.error {
            anyhow::bail!(
                "Token refresh failed: {}",
                parsed.error_description.unwrap_or(error)
            );
        }
        if !status.is_success() {
            anyhow::bail!("Token refresh failed: {}", status);
        }
        token.access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .context("token refresh response is missing access_token")?;
        if let Some(rotated) = parsed.refresh_token {
            token.refresh_token = Some(rotated);
        }
        token.expiry_date = parsed
            .expires_in
            .map(|secs| Utc::now().timestamp_millis() + secs * 1000);
        Ok(())
    }
}

#[async_trait]
impl CredentialSource for TokenFile {
    async fn access_token(&self) -> Result<String> {
        let Some(ref oauth) = self.oauth else {
            let token = self.load().await?;
            if token.access_token.is_empty() {
                anyhow::bail!("token file {} has an empty access_token", self.path.display());
            }
            return Ok(token.access_token);
        };

        let _guard = self.refresh_lock.lock().await;
        let mut token = self.load().await?;
        if token.is_expired(Utc::now().timestamp_millis()) {
            info!("Refreshing YouTube token in {}", self.path.display());
            self.refresh(oauth, &mut token).await?;
            if let Err(e) = self.save(&token).await {
                warn!("Refreshed token could not be saved: {:#}", e);
            }
        }
        Ok(token.access_token)
    }
}
