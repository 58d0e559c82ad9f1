use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use mosaic_locator::{Locator, LocatorError};
use mosaic_verify::{Algorithm, Digest};

use crate::data::{Discard, Fragments, MalformedFragmentPolicy, Manifest};
use crate::error::FragmentError;

/// Fragment names awaiting one digest, and where to find it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingFragment {
    pub names: Vec<String>,
    pub locators: Vec<Locator>,
}

/// Result of classifying a manifest.
#[derive(Debug, Default)]
pub struct Partition {
    /// Retrievals to start, each bound to the digest it was declared for.
    pub subscriptions: Vec<(Digest, Locator)>,
    pub rejected: Vec<FragmentError>,
    /// Classification stopped at a malformed fragment.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Discarded(Discard),
    Satisfied {
        digest: Digest,
        names: Vec<String>,
        /// Other locations still retrieving this digest.
        cancel: Vec<Locator>,
        /// Nothing is pending any more.
        complete: bool,
    },
}

/// Progress of an attempt at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub satisfied: Vec<String>,
    pub pending: Vec<String>,
    pub outstanding: usize,
}

/// Everything one attempt knows about its fragments.
///
/// Owned by a single attempt; every transition takes `&mut self`.
#[derive(Debug)]
pub struct AssemblyState {
    algorithm: Algorithm,
    pending: HashMap<Digest, PendingFragment>,
    satisfied: Fragments,
    outstanding: HashMap<Digest, HashSet<Locator>>,
    resolved: HashSet<Digest>,
}

impl AssemblyState {
    /// Classify every fragment of `manifest` into satisfied or pending.
    pub fn partition(
        manifest: &Manifest,
        algorithm: Algorithm,
        policy: MalformedFragmentPolicy,
    ) -> (Self, Partition) {
        let mut state = Self {
            algorithm,
            pending: HashMap::new(),
            satisfied: Fragments::new(),
            outstanding: HashMap::new(),
            resolved: HashSet::new(),
        };
        let mut partition = Partition::default();

        for spec in manifest.fragments() {
            if let Some(content) = &spec.inline_content {
                state
                    .satisfied
                    .insert(spec.name.clone(), Bytes::from(content.clone()));
                continue;
            }

            let digest = match spec.digest.as_deref() {
                None => Err(FragmentError::Unverifiable {
                    name: spec.name.clone(),
                }),
                Some(raw) => raw
                    .parse::<Digest>()
                    .map_err(|source| FragmentError::InvalidDigest {
                        name: spec.name.clone(),
                        source,
                    }),
            };
            let digest = match digest {
                Ok(digest) => digest,
                Err(err) => {
                    partition.rejected.push(err);
                    match policy {
                        MalformedFragmentPolicy::Skip => continue,
                        MalformedFragmentPolicy::Abort => {
                            partition.truncated = true;
                            break;
                        }
                    }
                }
            };

            let fragment = state.pending.entry(digest).or_default();
            fragment.names.push(spec.name.clone());
            let outstanding = state.outstanding.entry(digest).or_default();

            for declared in &spec.locators {
                let parsed = match declared.as_str() {
                    Some(url) => url.parse::<Locator>().map_err(|source| (url.to_owned(), source)),
                    None => {
                        let raw = declared.to_string();
                        Err((raw.clone(), LocatorError::NotText(raw)))
                    }
                };
                match parsed {
                    Ok(locator) => {
                        if outstanding.insert(locator.clone()) {
                            fragment.locators.push(locator.clone());
                            partition.subscriptions.push((digest, locator));
                        }
                    }
                    Err((url, source)) => partition.rejected.push(FragmentError::Locator {
                        name: spec.name.clone(),
                        url,
                        source,
                    }),
                }
            }
        }

        (state, partition)
    }

    /// Accept `content` delivered by `locator`, which was retrieving `bound`.
    ///
    /// The content is stored under whatever pending digest it hashes to; the
    /// declared binding only retires the locator.
    pub fn try_mark_satisfied(&mut self, bound: &Digest, locator: &Locator, content: Bytes) -> Resolution {
        self.retire(bound, locator);

        let digest = self.algorithm.digest(&content);
        let Some(fragment) = self.pending.remove(&digest) else {
            return Resolution::Discarded(if self.resolved.contains(&digest) {
                Discard::AlreadySatisfied { digest }
            } else {
                Discard::Unclaimed { digest }
            });
        };
        for name in &fragment.names {
            self.satisfied.insert(name.clone(), content.clone());
        }
        self.resolved.insert(digest);

        let mut cancel: Vec<Locator> = self
            .outstanding
            .remove(&digest)
            .unwrap_or_default()
            .into_iter()
            .collect();
        cancel.sort();

        Resolution::Satisfied {
            digest,
            names: fragment.names,
            cancel,
            complete: self.pending.is_empty(),
        }
    }

    /// Drop a locator whose retrieval failed. Returns whether it was outstanding.
    pub fn locator_failed(&mut self, bound: &Digest, locator: &Locator) -> bool {
        self.retire(bound, locator)
    }

    fn retire(&mut self, bound: &Digest, locator: &Locator) -> bool {
        self.outstanding
            .get_mut(bound)
            .is_some_and(|locators| locators.remove(locator))
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Something is pending and nothing is left that could deliver it.
    pub fn is_stalled(&self) -> bool {
        !self.pending.is_empty()
            && self
                .pending
                .keys()
                .all(|digest| self.outstanding.get(digest).is_none_or(HashSet::is_empty))
    }

    pub fn is_pending(&self, digest: &Digest) -> bool {
        self.pending.contains_key(digest)
    }

    /// Pending digests with the names and locators waiting on them.
    pub fn pending(&self) -> impl Iterator<Item = (&Digest, &PendingFragment)> {
        self.pending.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(|fragment| fragment.names.len()).sum()
    }

    pub fn satisfied(&self) -> &Fragments {
        &self.satisfied
    }

    /// Pending fragment names, sorted.
    pub fn missing(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pending
            .values()
            .flat_map(|fragment| fragment.names.iter().cloned())
            .collect();
        names.sort();
        names
    }

    /// Locators still retrieving some pending digest.
    pub fn outstanding(&self) -> usize {
        self.outstanding
            .iter()
            .filter(|(digest, _)| self.pending.contains_key(*digest))
            .map(|(_, locators)| locators.len())
            .sum()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            satisfied: self.satisfied.keys().cloned().collect(),
            pending: self.missing(),
            outstanding: self.outstanding(),
        }
    }

    pub fn into_satisfied(self) -> Fragments {
        self.satisfied
    }
}
