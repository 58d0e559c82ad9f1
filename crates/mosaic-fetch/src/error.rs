//! Error types for mosaic-fetch.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("cannot build a gateway URL for '{locator}': {source}")]
    GatewayUrl {
        locator: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout after {0:?}")]
    Timeout(Duration),

    #[error("content exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("max retries exceeded ({attempts} attempts): {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },

    #[error("content unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// Whether another attempt at the same URL may succeed.
    ///
    /// Network errors, timeouts, 429 and 5xx statuses are transient. Client
    /// errors and oversized content are not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
