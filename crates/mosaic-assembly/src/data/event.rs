use mosaic_locator::Locator;
use mosaic_verify::Digest;
use tracing::{debug, error, info, warn};

use crate::error::FragmentError;

/// Identifies one assembly attempt within an [`Assembler`](crate::Assembler).
pub type AttemptId = u64;

/// Why delivered content was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discard {
    /// The content's digest matches no fragment of this attempt.
    Unclaimed { digest: Digest },
    /// The fragment with this digest was already satisfied by another location.
    AlreadySatisfied { digest: Digest },
}

impl Discard {
    pub fn digest(&self) -> Digest {
        match self {
            Discard::Unclaimed { digest } | Discard::AlreadySatisfied { digest } => *digest,
        }
    }
}

/// Something that happened during an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyEvent {
    pub attempt: AttemptId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The manifest parsed and was partitioned.
    ManifestAccepted {
        fragments: usize,
        inline: usize,
        pending: usize,
    },
    FragmentRejected(FragmentError),
    Subscribed { digest: Digest, locator: Locator },
    FragmentSatisfied {
        digest: Digest,
        names: Vec<String>,
        locator: Locator,
    },
    /// Redundant retrievals for a satisfied digest were stopped.
    MirrorsCancelled { digest: Digest, locators: Vec<Locator> },
    Discarded { locator: Locator, reason: Discard },
    LocatorFailed {
        digest: Digest,
        locator: Locator,
        reason: String,
    },
    Completed { fragments: usize },
    Failed { reason: String },
}

impl EventKind {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            EventKind::FragmentRejected(_) | EventKind::LocatorFailed { .. } | EventKind::Failed { .. }
        )
    }
}

impl AssemblyEvent {
    pub(crate) fn log(&self) {
        let attempt = self.attempt;
        match &self.kind {
            EventKind::ManifestAccepted {
                fragments,
                inline,
                pending,
            } => info!(attempt, fragments, inline, pending, "manifest accepted"),
            EventKind::FragmentRejected(err) => {
                warn!(attempt, fragment = err.name(), error = %err, "fragment rejected")
            }
            EventKind::Subscribed { digest, locator } => {
                debug!(attempt, %digest, %locator, "retrieving")
            }
            EventKind::FragmentSatisfied {
                digest,
                names,
                locator,
            } => info!(attempt, %digest, %locator, names = ?names, "fragment satisfied"),
            EventKind::MirrorsCancelled { digest, locators } => {
                debug!(attempt, %digest, count = locators.len(), "mirrors cancelled")
            }
            EventKind::Discarded { locator, reason } => {
                debug!(attempt, %locator, reason = ?reason, "content discarded")
            }
            EventKind::LocatorFailed {
                digest,
                locator,
                reason,
            } => warn!(attempt, %digest, %locator, %reason, "retrieval failed"),
            EventKind::Completed { fragments } => info!(attempt, fragments, "assembly complete"),
            EventKind::Failed { reason } => error!(attempt, %reason, "assembly failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_error() {
        assert!(EventKind::Failed { reason: "x".into() }.is_error());
        assert!(EventKind::FragmentRejected(FragmentError::Unverifiable { name: "a".into() }).is_error());
        assert!(!EventKind::Completed { fragments: 1 }.is_error());

        let digest = Digest::new([0; 32]);
        let discarded = EventKind::Discarded {
            locator: Locator::ipfs("QmTest").unwrap(),
            reason: Discard::Unclaimed { digest },
        };
        assert!(!discarded.is_error());
    }
}
