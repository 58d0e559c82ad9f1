use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use mosaic_fetch::{FetchError, FetchService};
use mosaic_locator::Locator;
use mosaic_verify::Digest;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::{AssemblyState, Resolution, Snapshot};
use crate::data::{Assembled, AssemblyConfig, AssemblyEvent, AttemptId, EventKind, Fragments, Manifest};
use crate::error::AssemblyError;

pub(crate) type Outcome = Result<Assembled, AssemblyError>;

/// Requests from an [`Assembly`](super::Assembly) handle.
pub(crate) enum Command {
    Snapshot(oneshot::Sender<Snapshot>),
}

pub(crate) enum ManifestSource {
    Locator(Locator),
    Bytes(Bytes),
}

/// A finished retrieval. `None` means it was cancelled first.
enum TaskResult {
    Manifest {
        locator: Locator,
        result: Option<Result<Bytes, FetchError>>,
    },
    Fragment {
        digest: Digest,
        locator: Locator,
        result: Option<Result<Bytes, FetchError>>,
    },
}

struct Accepted {
    manifest: Manifest,
    state: AssemblyState,
}

/// Owns one attempt: its state, its retrievals and their cancellation.
///
/// Every transition happens on the actor's task, one at a time.
pub(crate) struct AssemblyActor<F> {
    attempt: AttemptId,
    fetcher: Arc<F>,
    config: AssemblyConfig,
    events: broadcast::Sender<AssemblyEvent>,
    deadline: Option<Instant>,
    accepted: Option<Accepted>,
    in_flight: FuturesUnordered<BoxFuture<'static, TaskResult>>,
    /// Cancelled when the attempt ends or the handle abandons it.
    root: CancellationToken,
    /// One child of `root` per pending digest.
    groups: HashMap<Digest, CancellationToken>,
}

impl<F: FetchService> AssemblyActor<F> {
    pub(crate) fn new(
        attempt: AttemptId,
        fetcher: Arc<F>,
        config: AssemblyConfig,
        events: broadcast::Sender<AssemblyEvent>,
        root: CancellationToken,
    ) -> Self {
        let deadline = config.deadline.map(|limit| Instant::now() + limit);
        Self {
            attempt,
            fetcher,
            config,
            events,
            deadline,
            accepted: None,
            in_flight: FuturesUnordered::new(),
            root,
            groups: HashMap::new(),
        }
    }

    /// Begin the attempt. Returns the outcome if it is already settled.
    pub(crate) fn start(&mut self, source: ManifestSource) -> Option<Outcome> {
        match source {
            ManifestSource::Bytes(bytes) => self.accept_manifest(&bytes),
            ManifestSource::Locator(locator) => {
                self.fetch_manifest(locator);
                None
            }
        }
    }

    /// Drive the attempt to its outcome.
    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Outcome {
        trace!(attempt = self.attempt, "assembly task started");
        let abandoned = self.root.clone();
        let deadline = self.deadline;
        let expiry = async move {
            match deadline {
                Some(at) => time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expiry);

        loop {
            tokio::select! {
                Some(command) = commands.recv() => match command {
                    Command::Snapshot(reply) => {
                        let _ = reply.send(self.snapshot());
                    }
                },
                Some(result) = self.in_flight.next() => {
                    if let Some(outcome) = self.on_result(result) {
                        return outcome;
                    }
                }
                () = abandoned.cancelled() => return self.fail(AssemblyError::Abandoned),
                () = &mut expiry => return self.expire(),
            }
        }
    }

    fn on_result(&mut self, result: TaskResult) -> Option<Outcome> {
        match result {
            TaskResult::Manifest { result: None, .. } => None,
            TaskResult::Manifest {
                locator,
                result: Some(Ok(bytes)),
            } => {
                debug!(attempt = self.attempt, %locator, bytes = bytes.len(), "manifest retrieved");
                self.accept_manifest(&bytes)
            }
            TaskResult::Manifest {
                locator,
                result: Some(Err(source)),
            } => Some(self.fail(AssemblyError::ManifestUnavailable { locator, source })),
            TaskResult::Fragment {
                digest,
                locator,
                result: None,
            } => {
                trace!(attempt = self.attempt, %digest, %locator, "retrieval cancelled");
                None
            }
            TaskResult::Fragment {
                digest,
                locator,
                result: Some(Ok(content)),
            } => self.on_resolved(digest, locator, content),
            TaskResult::Fragment {
                digest,
                locator,
                result: Some(Err(err)),
            } => self.on_failed(digest, locator, err),
        }
    }

    fn accept_manifest(&mut self, bytes: &[u8]) -> Option<Outcome> {
        let manifest = match Manifest::from_slice(bytes) {
            Ok(manifest) => manifest,
            Err(err) => return Some(self.fail(err.into())),
        };
        let (state, partition) = AssemblyState::partition(
            &manifest,
            self.config.algorithm,
            self.config.malformed_fragments,
        );

        self.emit(EventKind::ManifestAccepted {
            fragments: manifest.len(),
            inline: state.satisfied().len(),
            pending: state.pending_count(),
        });
        for rejected in partition.rejected {
            self.emit(EventKind::FragmentRejected(rejected));
        }
        if partition.truncated {
            warn!(attempt = self.attempt, "classification stopped at a malformed fragment");
        }

        self.accepted = Some(Accepted { manifest, state });
        for (digest, locator) in partition.subscriptions {
            self.subscribe(digest, locator);
        }
        self.settle()
    }

    fn fetch_manifest(&mut self, locator: Locator) {
        let fetcher = Arc::clone(&self.fetcher);
        let root = self.root.clone();
        self.in_flight.push(
            async move {
                let result = root.run_until_cancelled_owned(fetcher.fetch(&locator)).await;
                TaskResult::Manifest { locator, result }
            }
            .boxed(),
        );
    }

    fn subscribe(&mut self, digest: Digest, locator: Locator) {
        let root = &self.root;
        let group = self
            .groups
            .entry(digest)
            .or_insert_with(|| root.child_token())
            .clone();
        self.emit(EventKind::Subscribed {
            digest,
            locator: locator.clone(),
        });

        let fetcher = Arc::clone(&self.fetcher);
        self.in_flight.push(
            async move {
                let result = group.run_until_cancelled_owned(fetcher.fetch(&locator)).await;
                TaskResult::Fragment {
                    digest,
                    locator,
                    result,
                }
            }
            .boxed(),
        );
    }

    fn on_resolved(&mut self, bound: Digest, locator: Locator, content: Bytes) -> Option<Outcome> {
        let resolution = self
            .accepted
            .as_mut()?
            .state
            .try_mark_satisfied(&bound, &locator, content);

        match resolution {
            Resolution::Discarded(reason) => {
                self.emit(EventKind::Discarded { locator, reason });
            }
            Resolution::Satisfied {
                digest,
                names,
                cancel,
                ..
            } => {
                if let Some(group) = self.groups.remove(&digest) {
                    group.cancel();
                }
                self.emit(EventKind::FragmentSatisfied {
                    digest,
                    names,
                    locator,
                });
                if !cancel.is_empty() {
                    self.emit(EventKind::MirrorsCancelled {
                        digest,
                        locators: cancel,
                    });
                }
            }
        }
        self.settle()
    }

    fn on_failed(&mut self, digest: Digest, locator: Locator, err: FetchError) -> Option<Outcome> {
        if self.accepted.as_mut()?.state.locator_failed(&digest, &locator) {
            self.emit(EventKind::LocatorFailed {
                digest,
                locator,
                reason: err.to_string(),
            });
        } else {
            debug!(attempt = self.attempt, %digest, %locator, error = %err, "failure from retired locator");
        }
        self.settle()
    }

    /// Complete or fail if nothing else can change the outcome.
    fn settle(&mut self) -> Option<Outcome> {
        let accepted = self.accepted.as_ref()?;
        if accepted.state.is_complete() {
            let Accepted { manifest, state } = self.accepted.take()?;
            let fragments = state.into_satisfied();
            self.emit(EventKind::Completed {
                fragments: fragments.len(),
            });
            self.shutdown();
            return Some(Ok(Assembled {
                manifest,
                fragments,
            }));
        }
        if accepted.state.is_stalled() {
            let (missing, partial) = self.take_progress();
            return Some(self.fail(AssemblyError::Stalled { missing, partial }));
        }
        None
    }

    fn expire(&mut self) -> Outcome {
        let (missing, partial) = self.take_progress();
        let deadline = self.config.deadline.unwrap_or_default();
        self.fail(AssemblyError::DeadlineExceeded {
            deadline,
            missing,
            partial,
        })
    }

    fn fail(&mut self, error: AssemblyError) -> Outcome {
        self.emit(EventKind::Failed {
            reason: error.to_string(),
        });
        self.shutdown();
        Err(error)
    }

    /// Stop every retrieval still running.
    fn shutdown(&mut self) {
        self.root.cancel();
        self.groups.clear();
        self.in_flight.clear();
    }

    fn take_progress(&mut self) -> (Vec<String>, Fragments) {
        match self.accepted.take() {
            Some(Accepted { state, .. }) => (state.missing(), state.into_satisfied()),
            None => (Vec::new(), Fragments::new()),
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.accepted
            .as_ref()
            .map(|accepted| accepted.state.snapshot())
            .unwrap_or_default()
    }

    fn emit(&self, kind: EventKind) {
        let event = AssemblyEvent {
            attempt: self.attempt,
            kind,
        };
        event.log();
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
