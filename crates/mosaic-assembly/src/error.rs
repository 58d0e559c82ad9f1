//! Error types for mosaic-assembly.

use std::time::Duration;

use mosaic_fetch::FetchError;
use mosaic_locator::{Locator, LocatorError};
use mosaic_verify::DigestError;
use thiserror::Error;

use crate::Fragments;

/// The manifest document could not be interpreted.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest is not a JSON object")]
    NotAnObject,

    #[error("manifest has no `sources` object")]
    MissingSources,

    #[error("manifest entry '{name}' is malformed: {source}")]
    InvalidEntry {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single fragment declaration could not be used as written.
///
/// These are reported and the assembly carries on; see
/// [`MalformedFragmentPolicy`](crate::MalformedFragmentPolicy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    #[error("fragment '{name}' has neither inline content nor a digest")]
    Unverifiable { name: String },

    #[error("fragment '{name}' declares an invalid digest: {source}")]
    InvalidDigest {
        name: String,
        #[source]
        source: DigestError,
    },

    #[error("fragment '{name}' has an unusable location '{url}': {source}")]
    Locator {
        name: String,
        url: String,
        #[source]
        source: LocatorError,
    },
}

impl FragmentError {
    pub fn name(&self) -> &str {
        match self {
            FragmentError::Unverifiable { name }
            | FragmentError::InvalidDigest { name, .. }
            | FragmentError::Locator { name, .. } => name,
        }
    }

    /// Whether the whole fragment was rejected, rather than one of its locations.
    pub fn rejects_fragment(&self) -> bool {
        !matches!(self, FragmentError::Locator { .. })
    }
}

/// Terminal outcome of an assembly attempt that did not complete.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("manifest unavailable from {locator}: {source}")]
    ManifestUnavailable {
        locator: Locator,
        #[source]
        source: FetchError,
    },

    #[error("deadline of {deadline:?} exceeded, missing: {}", .missing.join(", "))]
    DeadlineExceeded {
        deadline: Duration,
        missing: Vec<String>,
        partial: Fragments,
    },

    #[error("no location left to retrieve: {}", .missing.join(", "))]
    Stalled {
        missing: Vec<String>,
        partial: Fragments,
    },

    #[error("assembly abandoned")]
    Abandoned,
}

impl AssemblyError {
    /// Names still missing when the attempt ended, if it got that far.
    pub fn missing(&self) -> &[String] {
        match self {
            AssemblyError::DeadlineExceeded { missing, .. }
            | AssemblyError::Stalled { missing, .. } => missing,
            _ => &[],
        }
    }

    /// Fragments obtained before the attempt ended.
    pub fn partial(&self) -> Option<&Fragments> {
        match self {
            AssemblyError::DeadlineExceeded { partial, .. }
            | AssemblyError::Stalled { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
