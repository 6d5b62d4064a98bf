use std::time::Duration;
use thiserror::Error;

/// Coarse failure classes for remote generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    NotFound,
    RateLimit,
    Malformed,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request exceeded {0:?}")]
    Timeout(Duration),
    #[error("credential rejected (HTTP {0}); check the API key")]
    Unauthorized(u16),
    #[error("endpoint or model not found (HTTP 404); check the endpoint id")]
    NotFound,
    #[error("rate limit exceeded (HTTP 429); try again later")]
    RateLimited,
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Classify a non-2xx status code.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(status),
            404 => Self::NotFound,
            429 => Self::RateLimited,
            _ => Self::Status { status, body },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::Status { .. } => ErrorKind::Network,
            Self::Unauthorized(_) => ErrorKind::Auth,
            Self::NotFound => ErrorKind::NotFound,
            Self::RateLimited => ErrorKind::RateLimit,
            Self::MalformedResponse(_) => ErrorKind::Malformed,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
