use super::schema::Config;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

macro_rules! define_string_overrides {
    ($( $env:literal => $($path:ident).+ );* $(;)?) => {
        /// Env vars that map directly onto a string field.
        pub const STRING_OVERRIDES: &[&str] = &[$($env),*];

        fn apply_string_overrides(config: &mut Config, lookup: &dyn Fn(&str) -> Option<String>) {
            $(
                if let Some(val) = lookup($env).filter(|v| !v.is_empty()) {
                    config.$($path).+ = val;
                }
            )*
        }
    };
}

define_string_overrides! {
    "CHATTERBOX_SERVER_URLS"             => client.server_urls;
    "CHATTERBOX_SECRET"                  => secret;
    "CHATTERBOX_HOST"                    => server.host;
    "CHATTERBOX_YOUTUBE_ACCESS_TOKEN"    => youtube.access_token;
    "CHATTERBOX_YOUTUBE_TOKEN_FILE"      => youtube.token_file;
    "CHATTERBOX_YOUTUBE_CLIENT_ID"       => youtube.client_id;
    "CHATTERBOX_YOUTUBE_CLIENT_SECRET"   => youtube.client_secret;
    "CHATTERBOX_REPLY_API_KEY"           => auto_response.reply.api_key;
    "CHATTERBOX_REPLY_API_BASE"          => auto_response.reply.api_base;
    "CHATTERBOX_REPLY_MODEL"             => auto_response.reply.model;
}

/// Apply `CHATTERBOX_*` overrides found through `lookup`. Unset or empty
/// values leave the field alone; unparseable numbers are logged and skipped.
pub fn apply_overrides(config: &mut Config, lookup: &dyn Fn(&str) -> Option<String>) {
    apply_string_overrides(config, lookup);

    if let Some(raw) = lookup("CHATTERBOX_PORT").filter(|v| !v.is_empty()) {
        match raw.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("ignoring CHATTERBOX_PORT: '{}' is not a port", raw),
        }
    }
    if let Some(raw) = lookup("CHATTERBOX_AUTO_RESPONSE_INTERVAL_MS").filter(|v| !v.is_empty()) {
        match raw.trim().parse() {
            Ok(ms) => config.auto_response.interval_ms = ms,
            Err(_) => warn!(
                "ignoring CHATTERBOX_AUTO_RESPONSE_INTERVAL_MS: '{}' is not a number",
                raw
            ),
        }
    }
    if let Some(raw) = lookup("CHATTERBOX_AUTO_RESPONSE_NUMBERS").filter(|v| !v.is_empty()) {
        config.auto_response.numbers = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
    }
}

/// Read a secrets directory: each file becomes `UPPERCASE_STEM` = trimmed
/// contents. A missing directory yields nothing.
pub fn read_secrets_dir(dir: &Path) -> HashMap<String, String> {
    let mut secrets = HashMap::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return secrets;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let key = stem.to_uppercase();
                debug!("loaded {} from {}", key, path.display());
                secrets.insert(key, contents.trim().to_string());
            }
            Err(e) => warn!("failed to read secret {}: {}", path.display(), e),
        }
    }
    secrets
}

#[cfg(test)]
mod tests;
