use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `keylevels-data`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("rate limited (HTTP 429) for {0}")]
    RateLimited(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request url: {0}")]
    Url(String),

    #[error("retries exhausted after {attempts} attempts for {url}")]
    RetriesExhausted { attempts: u32, url: String },

    #[error("failed to fetch spot price for {0}")]
    MissingSpot(String),
}

impl DataError {
    /// Determine if an error is worth retrying the same request for.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::RateLimited(_) => true,
            DataError::Status { status, .. } => *status >= 500,
            DataError::Http(error_msg) => {
                let error_lower = error_msg.to_lowercase();
                error_lower.contains("timed out")
                    || error_lower.contains("timeout")
                    || error_lower.contains("connection")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Http(value.to_string())
        }
    }
}

impl From<url::ParseError> for DataError {
    fn from(value: url::ParseError) -> Self {
        Self::Url(value.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
