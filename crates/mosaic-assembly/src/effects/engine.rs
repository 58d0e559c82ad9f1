use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use mosaic_fetch::FetchService;
use mosaic_locator::Locator;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::actor::{AssemblyActor, Command, ManifestSource, Outcome};
use crate::core::Snapshot;
use crate::data::{Assembled, AssemblyConfig, AssemblyEvent, AttemptId};
use crate::error::AssemblyError;

const COMMAND_CAPACITY: usize = 8;

/// Starts assembly attempts against a [`FetchService`].
///
/// Attempts share the fetch service and the event channel, nothing else.
pub struct Assembler<F> {
    fetcher: Arc<F>,
    config: AssemblyConfig,
    events: broadcast::Sender<AssemblyEvent>,
    next_attempt: AtomicU64,
}

impl<F: FetchService> Assembler<F> {
    pub fn new(fetcher: F, config: AssemblyConfig) -> Self {
        Self::with_shared(Arc::new(fetcher), config)
    }

    pub fn with_shared(fetcher: Arc<F>, config: AssemblyConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            fetcher,
            config,
            events,
            next_attempt: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Subscribe to events of every attempt started from now on.
    pub fn events(&self) -> broadcast::Receiver<AssemblyEvent> {
        self.events.subscribe()
    }

    /// Retrieve the manifest at `manifest` and assemble it.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn begin(&self, manifest: Locator) -> Assembly {
        self.start(ManifestSource::Locator(manifest))
    }

    /// Assemble a manifest the caller already holds.
    ///
    /// A manifest whose fragments are all inline, or one that does not parse,
    /// settles before this returns.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn begin_with_manifest(&self, manifest: impl Into<Bytes>) -> Assembly {
        self.start(ManifestSource::Bytes(manifest.into()))
    }

    fn start(&self, source: ManifestSource) -> Assembly {
        let id = self.next_attempt.fetch_add(1, Ordering::Relaxed);
        let root = CancellationToken::new();
        let (commands, receiver) = mpsc::channel(COMMAND_CAPACITY);
        let (outcome_tx, outcome) = oneshot::channel();

        let mut actor = AssemblyActor::new(
            id,
            Arc::clone(&self.fetcher),
            self.config.clone(),
            self.events.clone(),
            root.clone(),
        );
        match actor.start(source) {
            Some(settled) => {
                let _ = outcome_tx.send(settled);
            }
            None => {
                tokio::spawn(async move {
                    let _ = outcome_tx.send(actor.run(receiver).await);
                });
            }
        }

        Assembly {
            id,
            commands,
            outcome,
            guard: root.clone().drop_guard(),
            root,
        }
    }
}

/// Handle to one running attempt.
///
/// Dropping the handle abandons the attempt.
pub struct Assembly {
    id: AttemptId,
    commands: mpsc::Sender<Command>,
    outcome: oneshot::Receiver<Outcome>,
    root: CancellationToken,
    guard: DropGuard,
}

impl Assembly {
    pub fn id(&self) -> AttemptId {
        self.id
    }

    /// Current progress, or `None` once the attempt has ended.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, response) = oneshot::channel();
        self.commands.send(Command::Snapshot(reply)).await.ok()?;
        response.await.ok()
    }

    /// Stop the attempt. [`Assembly::wait`] then reports
    /// [`AssemblyError::Abandoned`] unless it had already ended.
    pub fn abandon(&self) {
        self.root.cancel();
    }

    /// Take the outcome if the attempt has already ended.
    pub fn try_wait(&mut self) -> Option<Result<Assembled, AssemblyError>> {
        match self.outcome.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(AssemblyError::Abandoned)),
        }
    }

    /// Wait for the attempt's single outcome.
    pub async fn wait(self) -> Result<Assembled, AssemblyError> {
        let Assembly {
            commands,
            outcome,
            guard,
            ..
        } = self;
        let result = outcome.await.unwrap_or(Err(AssemblyError::Abandoned));
        guard.disarm();
        drop(commands);
        result
    }
}
