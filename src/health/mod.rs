//! Health reports served by the backing API. The failover client only reads
//! `overall.healthy` from the detailed report.

use crate::models::SessionStatus;
use crate::whatsapp::WhatsAppService;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    fn from_bool(healthy: bool) -> Self {
        if healthy {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }

    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemChecks {
    pub uptime: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub timestamp: String,
    /// Whole seconds since the service started.
    pub uptime: u64,
    pub checks: SystemChecks,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppHealth {
    pub status: SessionStatus,
    #[serde(rename = "isHealthy")]
    pub is_healthy: bool,
    #[serde(rename = "lastCheck")]
    pub last_check: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallHealth {
    pub healthy: bool,
    pub version: String,
    pub platform: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealth {
    pub status: HealthStatus,
    pub timestamp: String,
    pub system: SystemHealth,
    pub whatsapp: WhatsAppHealth,
    pub overall: OverallHealth,
}

pub struct HealthService {
    started: Instant,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn check_system(&self) -> SystemHealth {
        let elapsed = self.started.elapsed();
        let uptime_ok = !elapsed.is_zero();
        SystemHealth {
            status: HealthStatus::from_bool(uptime_ok),
            timestamp: Utc::now().to_rfc3339(),
            uptime: elapsed.as_secs(),
            checks: SystemChecks { uptime: uptime_ok },
        }
    }

    /// A session is healthy only when linked with no QR prompt pending.
    pub fn check_whatsapp(&self, whatsapp: &WhatsAppService) -> WhatsAppHealth {
        let status = whatsapp.status();
        WhatsAppHealth {
            status,
            is_healthy: status.is_ready && !status.has_qr,
            last_check: Utc::now().to_rfc3339(),
        }
    }

    pub fn detailed(&self, whatsapp: &WhatsAppService) -> DetailedHealth {
        let system = self.check_system();
        let whatsapp = self.check_whatsapp(whatsapp);
        let healthy = system.status.is_healthy() && whatsapp.is_healthy;
        DetailedHealth {
            status: HealthStatus::from_bool(healthy),
            timestamp: Utc::now().to_rfc3339(),
            system,
            whatsapp,
            overall: OverallHealth {
                healthy,
                version: crate::VERSION.to_string(),
                platform: std::env::consts::OS.to_string(),
            },
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
