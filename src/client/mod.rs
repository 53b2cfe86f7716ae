//! Agent-side access to the backing API: health probing, the server pool,
//! and the failover client with typed WhatsApp and YouTube wrappers on top.

pub mod failover;
pub mod pool;
pub mod probe;
pub mod whatsapp;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

pub use failover::{ApiRequest, ApiResponse, FailoverClient};
pub use pool::{ServerHealth, ServerPool, parse_server_urls};
pub use probe::{HealthProbe, HttpHealthProbe};
pub use whatsapp::WhatsAppApi;
pub use youtube::YouTubeApi;

use std::sync::{Arc, RwLock};

/// Header carrying the shared secret on every request.
pub const SECRET_HEADER: &str = "x-secret";

/// Shared secret handle. The client and its probe hold clones, so a
/// reconfigured secret is seen by both.
#[derive(Clone, Default)]
pub struct SharedSecret(Arc<RwLock<String>>);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(secret.into())))
    }

    pub fn get(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, secret: impl Into<String>) {
        *self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = secret.into();
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}
