pub mod http;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// `CHATTERBOX_HOME`, or `~/.chatterbox`.
pub fn get_chatterbox_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("CHATTERBOX_HOME") {
        return Ok(PathBuf::from(home));
    }
    Ok(dirs::home_dir()
        .context("Could not determine home directory")?
        .join(".chatterbox"))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
