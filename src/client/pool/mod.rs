use super::probe::HealthProbe;
use crate::errors::BridgeError;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Health of one configured server at the time it was probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHealth {
    pub url: String,
    pub healthy: bool,
    pub active: bool,
}

#[derive(Debug, Default)]
struct PoolState {
    candidates: Vec<String>,
    active: Option<String>,
}

/// Split a comma-separated server list, trimming entries and dropping
/// empties and repeats. First occurrence wins.
pub fn parse_server_urls(raw: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let url = part.trim();
        if url.is_empty() || urls.iter().any(|u| u == url) {
            continue;
        }
        urls.push(url.to_string());
    }
    urls
}

/// Ordered candidate servers plus the one currently receiving traffic.
///
/// The active URL is either unset or one of the candidates. Sweeps
/// (`select_initial`, `failover`) and `configure` are serialised on an
/// async mutex; reads of the active URL only take the state lock briefly.
pub struct ServerPool {
    probe: Arc<dyn HealthProbe>,
    state: RwLock<PoolState>,
    sweep: Mutex<()>,
}

impl ServerPool {
    pub fn new(probe: Arc<dyn HealthProbe>, raw_urls: &str) -> Self {
        Self {
            probe,
            state: RwLock::new(PoolState {
                candidates: parse_server_urls(raw_urls),
                active: None,
            }),
            sweep: Mutex::new(()),
        }
    }

    /// Replace the candidate list. The pool is uninitialised afterwards.
    pub async fn configure(&self, raw_urls: &str) {
        let _guard = self.sweep.lock().await;
        let candidates = parse_server_urls(raw_urls);
        info!("Configured {} WhatsApp server(s)", candidates.len());
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.candidates = candidates;
        state.active = None;
    }

    pub fn candidates(&self) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .candidates
            .clone()
    }

    pub fn active_url(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .active
            .clone()
    }

    fn set_active(&self, url: &str) {
        self.state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .active = Some(url.to_string());
    }

    /// Activate the first healthy candidate in configured order.
    pub async fn select_initial(&self) -> Result<String, BridgeError> {
        let _guard = self.sweep.lock().await;
        self.sweep_initial().await
    }

    /// Return the active URL, running the initial selection if the pool is
    /// uninitialised. Callers queued behind a sweep reuse its result.
    pub async fn active_or_select(&self) -> Result<String, BridgeError> {
        if let Some(url) = self.active_url() {
            return Ok(url);
        }
        let _guard = self.sweep.lock().await;
        if let Some(url) = self.active_url() {
            return Ok(url);
        }
        self.sweep_initial().await
    }

    async fn sweep_initial(&self) -> Result<String, BridgeError> {
        for url in self.candidates() {
            if self.probe.probe(&url).await {
                info!("Using WhatsApp server: {}", url);
                self.set_active(&url);
                return Ok(url);
            }
        }
        warn!("No healthy WhatsApp servers available");
        Err(BridgeError::NoServersAvailable)
    }

    /// Move traffic off `current` to the first other healthy candidate.
    ///
    /// Returns `None` and leaves the active URL untouched when no other
    /// candidate is healthy.
    pub async fn failover(&self, current: &str) -> Option<String> {
        let _guard = self.sweep.lock().await;
        for url in self.candidates() {
            if url == current {
                continue;
            }
            if self.probe.probe(&url).await {
                warn!("Failed over from {} to {}", current, url);
                self.set_active(&url);
                return Some(url);
            }
        }
        warn!("No alternative WhatsApp server available (current: {})", current);
        None
    }

    /// Probe the active server, if any.
    pub async fn probe_active(&self) -> Option<(String, bool)> {
        let url = self.active_url()?;
        let healthy = self.probe.probe(&url).await;
        Some((url, healthy))
    }

    /// Probe every candidate in order, for status reporting. Does not
    /// change the active URL.
    pub async fn probe_all(&self) -> Vec<ServerHealth> {
        let active = self.active_url();
        let mut results = Vec::new();
        for url in self.candidates() {
            let healthy = self.probe.probe(&url).await;
            results.push(ServerHealth {
                active: active.as_deref() == Some(url.as_str()),
                url,
                healthy,
            });
        }
        results
    }
}

#[cfg(test)]
mod tests;
