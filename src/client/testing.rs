use super::probe::HealthProbe;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Probe with a fixed set of healthy URLs that records every call.
#[derive(Default)]
pub struct ScriptedProbe {
    healthy: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn healthy(urls: &[&str]) -> Self {
        Self {
            healthy: Mutex::new(urls.iter().map(|u| (*u).to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_healthy(&self, url: &str, healthy: bool) {
        let mut set = self.healthy.lock().unwrap();
        if healthy {
            set.insert(url.to_string());
        } else {
            set.remove(url);
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, base_url: &str) -> bool {
        self.calls.lock().unwrap().push(base_url.to_string());
        self.healthy.lock().unwrap().contains(base_url)
    }
}
