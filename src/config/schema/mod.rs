use crate::errors::BridgeError;
use crate::youtube::{GOOGLE_TOKEN_URI, YOUTUBE_API_BASE};
use serde::{Deserialize, Serialize};

/// Generates a `Debug` impl that redacts secret fields.
///
/// - `field_name`         printed normally
/// - `redact(field_name)` `String` field: shows `[empty]` or `[REDACTED]`
macro_rules! redact_debug {
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_interval_ms() -> u64 {
    60_000
}

fn default_youtube_api_base() -> String {
    YOUTUBE_API_BASE.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

fn default_reply_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_reply_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    crate::responder::DEFAULT_MAX_TOKENS
}

/// Where the MCP process looks for the backing API.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// Comma-separated candidate base URLs, in priority order.
    #[serde(default, rename = "serverUrls")]
    pub server_urls: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default, rename = "accessToken")]
    pub access_token: String,
    /// Google OAuth token JSON (`access_token`, `refresh_token`,
    /// `expiry_date`). Takes precedence over `accessToken`.
    #[serde(default, rename = "tokenFile")]
    pub token_file: String,
    /// OAuth client used to refresh `tokenFile`. Without it the file is
    /// only read.
    #[serde(default, rename = "clientId")]
    pub client_id: String,
    #[serde(default, rename = "clientSecret")]
    pub client_secret: String,
    #[serde(default = "default_token_uri", rename = "tokenUri")]
    pub token_uri: String,
    #[serde(default = "default_youtube_api_base", rename = "apiBase")]
    pub api_base: String,
}

redact_debug!(
    YouTubeConfig,
    redact(access_token),
    token_file,
    client_id,
    redact(client_secret),
    token_uri,
    api_base,
);

impl YouTubeConfig {
    pub fn can_refresh(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            token_file: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            token_uri: default_token_uri(),
            api_base: default_youtube_api_base(),
        }
    }
}

/// OpenAI-compatible chat completions endpoint used for auto-replies.
#[derive(Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default = "default_reply_api_base", rename = "apiBase")]
    pub api_base: String,
    #[serde(default, rename = "apiKey")]
    pub api_key: String,
    #[serde(default = "default_reply_model")]
    pub model: String,
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,
    #[serde(default, rename = "systemPrompt")]
    pub system_prompt: Option<String>,
}

redact_debug!(
    ReplyConfig,
    api_base,
    redact(api_key),
    model,
    max_tokens,
    system_prompt,
);

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            api_base: default_reply_api_base(),
            api_key: String::new(),
            model: default_reply_model(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoResponseConfig {
    /// Numbers to answer automatically. Empty disables the responder.
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default = "default_interval_ms", rename = "intervalMs")]
    pub interval_ms: u64,
    #[serde(default)]
    pub reply: ReplyConfig,
}

impl Default for AutoResponseConfig {
    fn default() -> Self {
        Self {
            numbers: Vec::new(),
            interval_ms: default_interval_ms(),
            reply: ReplyConfig::default(),
        }
    }
}

impl AutoResponseConfig {
    pub fn enabled(&self) -> bool {
        self.numbers.iter().any(|n| !n.trim().is_empty())
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Shared secret sent as `x-secret` by the client and checked by the
    /// backing API.
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default, rename = "autoResponse")]
    pub auto_response: AutoResponseConfig,
    /// Directory of one-value-per-file secrets. Defaults to `secrets/`
    /// under the chatterbox home.
    #[serde(default, rename = "secretsDir")]
    pub secrets_dir: Option<String>,
}

redact_debug!(
    Config,
    redact(secret),
    client,
    server,
    youtube,
    auto_response,
    secrets_dir,
);

impl Config {
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.validate_client()?;
        self.validate_server()?;
        self.validate_youtube()?;
        self.validate_auto_response()?;
        Ok(())
    }

    fn validate_client(&self) -> Result<(), BridgeError> {
        for raw in crate::client::parse_server_urls(&self.client.server_urls) {
            validate_http_url("client.serverUrls", &raw)?;
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), BridgeError> {
        if self.server.host.trim().is_empty() {
            return Err(BridgeError::Config("server.host must not be empty".into()));
        }
        if self.server.port == 0 {
            return Err(BridgeError::Config("server.port must be > 0".into()));
        }
        Ok(())
    }

    fn validate_youtube(&self) -> Result<(), BridgeError> {
        let y = &self.youtube;
        validate_http_url("youtube.apiBase", &y.api_base)?;
        if y.client_id.is_empty() != y.client_secret.is_empty() {
            return Err(BridgeError::Config(
                "youtube.clientId and youtube.clientSecret must be set together".into(),
            ));
        }
        if y.can_refresh() {
            validate_http_url("youtube.tokenUri", &y.token_uri)?;
        }
        Ok(())
    }

    fn validate_auto_response(&self) -> Result<(), BridgeError> {
        let a = &self.auto_response;
        if a.interval_ms < 1000 {
            return Err(BridgeError::Config(
                "autoResponse.intervalMs must be at least 1000".into(),
            ));
        }
        if a.reply.max_tokens == 0 {
            return Err(BridgeError::Config(
                "autoResponse.reply.maxTokens must be > 0".into(),
            ));
        }
        if a.enabled() {
            validate_http_url("autoResponse.reply.apiBase", &a.reply.api_base)?;
            if a.reply.model.trim().is_empty() {
                return Err(BridgeError::Config(
                    "autoResponse.reply.model must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, raw: &str) -> Result<(), BridgeError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        BridgeError::Config(format!("{} has an invalid URL '{}': {}", field, raw, e))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(BridgeError::Config(format!(
            "{} must use http or https, got '{}' in '{}'",
            field, other, raw
        ))),
    }
}
