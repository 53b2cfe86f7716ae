use crate::config::Config;
use crate::config::credentials::{apply_overrides, read_secrets_dir};
use crate::utils::{expand_home, get_chatterbox_home};
use anyhow::{Context, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_chatterbox_home()?.join("config.json"))
}

/// Load the config file (or defaults when it does not exist), then overlay
/// the secrets directory and finally the process environment.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    load_config_with(config_path, &|key| std::env::var(key).ok())
}

/// [`load_config`] with an injectable environment lookup.
pub fn load_config_with(
    config_path: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Config> {
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    let mut config = if path.exists() {
        read_config_file(path)?
    } else {
        debug!("no config at {}, using defaults", path.display());
        Config::default()
    };

    let secrets = read_secrets_dir(&secrets_dir(&config, path));
    overlay(&mut config, &secrets, env);

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    // Shared lock: concurrent readers are fine, a writer holding an
    // exclusive lock blocks us until it is done.
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open config at {}", path.display()))?;
    file.lock_shared()
        .with_context(|| "Failed to acquire shared lock on config file")?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    check_file_permissions(path);

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config JSON from {}", path.display()))
}

/// `secretsDir` when set, otherwise `secrets/` next to the config file.
fn secrets_dir(config: &Config, config_path: &Path) -> PathBuf {
    match config.secrets_dir.as_deref().filter(|d| !d.is_empty()) {
        Some(dir) => expand_home(dir),
        None => config_path
            .parent()
            .map_or_else(|| PathBuf::from("secrets"), |p| p.join("secrets")),
    }
}

/// Environment values win over secrets files.
fn overlay(
    config: &mut Config,
    secrets: &HashMap<String, String>,
    env: &dyn Fn(&str) -> Option<String>,
) {
    apply_overrides(config, &|key| {
        env(key)
            .filter(|v| !v.is_empty())
            .or_else(|| secrets.get(key).cloned())
    });
}

#[cfg(unix)]
fn check_file_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Once;

    static WARNED: Once = Once::new();
    WARNED.call_once(|| {
        if let Ok(meta) = std::fs::metadata(path) {
            let mode = meta.permissions().mode();
            if mode & 0o077 != 0 {
                warn!(
                    "config file {} has permissions {:o}, recommend 0600",
                    path.display(),
                    mode & 0o777
                );
            }
        }
    });
}

#[cfg(not(unix))]
fn check_file_permissions(_path: &Path) {}
