//! Error types for locator parsing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("unsupported locator scheme in '{0}'")]
    UnsupportedScheme(String),

    #[error("locator {0} is not a string")]
    NotText(String),

    #[error("locator '{0}' has no address")]
    MissingAddress(String),

    #[error("invalid address in locator '{url}': {reason}")]
    InvalidAddress { url: String, reason: &'static str },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, LocatorError>;
