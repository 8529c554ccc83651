use thiserror::Error;

use crate::health::HealthStatus;

/// Why a single upstream request did not yield a usable dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        FetchError::Network(err.to_string())
    }

    /// The upstream actively refused us (data may still be reachable another way).
    pub fn is_blocked(&self) -> bool {
        matches!(self, FetchError::Http { status: 403 })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Http { status: 429 })
    }

    /// 403 is a degraded signal; everything else means the path is down.
    pub fn health_status(&self) -> HealthStatus {
        if self.is_blocked() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Down
        }
    }
}

/// Surfaced only once the whole acquisition chain is exhausted.
#[derive(Debug, Clone, Error)]
pub enum AcquisitionError {
    #[error("stats provider unavailable and no cached data to fall back on ({source})")]
    Disconnected {
        #[source]
        source: FetchError,
    },
}

impl AcquisitionError {
    pub fn fetch_error(&self) -> &FetchError {
        match self {
            AcquisitionError::Disconnected { source } => source,
        }
    }
}
