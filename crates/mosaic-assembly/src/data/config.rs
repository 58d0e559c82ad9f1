use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use mosaic_verify::Algorithm;
use serde::{Deserialize, Serialize};

/// What to do with a fragment that declares neither inline content nor a
/// usable digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedFragmentPolicy {
    /// Report the fragment and classify the rest.
    #[default]
    Skip,
    /// Report the fragment and stop classifying. Fragments already classified
    /// still proceed.
    Abort,
}

impl fmt::Display for MalformedFragmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MalformedFragmentPolicy::Skip => "skip",
            MalformedFragmentPolicy::Abort => "abort",
        })
    }
}

impl FromStr for MalformedFragmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedFragmentPolicy::Skip),
            "abort" => Ok(MalformedFragmentPolicy::Abort),
            other => Err(format!("unknown malformed-fragment policy '{other}'")),
        }
    }
}

/// Settings for an [`Assembler`](crate::Assembler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyConfig {
    pub algorithm: Algorithm,
    pub malformed_fragments: MalformedFragmentPolicy,
    /// Upper bound on one attempt, measured from `begin`. `None` waits forever.
    pub deadline: Option<Duration>,
    /// Capacity of the shared event channel.
    pub event_capacity: usize,
}

impl AssemblyConfig {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_EVENT_CAPACITY: usize = 256;

    #[must_use]
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn malformed_fragments(mut self, policy: MalformedFragmentPolicy) -> Self {
        self.malformed_fragments = policy;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            malformed_fragments: MalformedFragmentPolicy::default(),
            deadline: Some(Self::DEFAULT_DEADLINE),
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssemblyConfig::default();
        assert_eq!(config.algorithm, Algorithm::Keccak256);
        assert_eq!(config.malformed_fragments, MalformedFragmentPolicy::Skip);
        assert_eq!(config.deadline, Some(Duration::from_secs(300)));
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_builder() {
        let config = AssemblyConfig::default()
            .malformed_fragments(MalformedFragmentPolicy::Abort)
            .deadline(None)
            .event_capacity(0);
        assert_eq!(config.malformed_fragments, MalformedFragmentPolicy::Abort);
        assert_eq!(config.deadline, None);
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Abort".parse(), Ok(MalformedFragmentPolicy::Abort));
        assert_eq!(" skip ".parse(), Ok(MalformedFragmentPolicy::Skip));
        assert!("truncate".parse::<MalformedFragmentPolicy>().is_err());
    }
}
