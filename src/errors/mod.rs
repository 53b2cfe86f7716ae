use thiserror::Error;

/// Why a request against the backing API failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The server answered with a non-success status.
    Status { code: u16, reason: String },
    /// Connect failure or timeout before any status arrived.
    Network(String),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { code, reason } if reason.is_empty() => write!(f, "{}", code),
            Self::Status { code, reason } => write!(f, "{} {}", code, reason),
            Self::Network(msg) => write!(f, "{}", msg),
        }
    }
}

fn failover_suffix(after_failover: &bool) -> &'static str {
    if *after_failover {
        " after failover"
    } else {
        ""
    }
}

/// Typed error hierarchy for the bridge.
///
/// Returned by the failover client and the typed API wrappers. Tool
/// implementations render it into text and never let it escape further.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No available servers found. All servers are unreachable.")]
    NoServersAvailable,

    #[error("API request failed{}: {cause}", failover_suffix(.after_failover))]
    RequestFailed {
        cause: FailureCause,
        after_failover: bool,
    },

    #[error("API request failed: {status} {reason}")]
    ClientError { status: u16, reason: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BridgeError {
    /// Whether another server might have answered this request.
    pub fn is_failover_trigger(&self) -> bool {
        match self {
            Self::RequestFailed { cause, .. } => match cause {
                FailureCause::Status { code, .. } => *code >= 500,
                FailureCause::Network(_) => true,
            },
            _ => false,
        }
    }
}

/// Errors raised by the services behind the backing API.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("WhatsApp client is not ready")]
    NotReady,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    /// HTTP status the backing API answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}
