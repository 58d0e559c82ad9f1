//! Scripted [`FetchService`] for tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use mosaic_locator::Locator;
use tokio::sync::watch;

use crate::{FetchError, FetchService, Result};

/// How the mock answers a locator.
#[derive(Clone)]
enum Script {
    Content(Bytes),
    Fail(FetchError),
    Never,
    Gated(watch::Receiver<bool>, Bytes),
}

#[derive(Default)]
struct State {
    scripts: HashMap<Locator, Script>,
    gates: HashMap<Locator, watch::Sender<bool>>,
    requested: Vec<Locator>,
    cancelled: Vec<Locator>,
}

/// A [`FetchService`] whose answers are scripted per locator.
///
/// Unscripted locators fail with [`FetchError::Unavailable`]. Every call to
/// `fetch` is recorded, and so is every fetch future dropped before it
/// resolved, which is how an unsubscription shows up.
#[derive(Clone)]
pub struct MockFetcher {
    state: Arc<Mutex<State>>,
    requests: Arc<watch::Sender<usize>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        let (requests, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            requests: Arc::new(requests),
        }
    }

    /// Resolve `locator` with `content` as soon as it is fetched.
    pub fn serve(&self, locator: &Locator, content: impl Into<Bytes>) -> &Self {
        self.script(locator, Script::Content(content.into()))
    }

    /// Fail `locator` with `error`.
    pub fn fail(&self, locator: &Locator, error: FetchError) -> &Self {
        self.script(locator, Script::Fail(error))
    }

    /// Never resolve `locator`.
    pub fn hang(&self, locator: &Locator) -> &Self {
        self.script(locator, Script::Never)
    }

    /// Resolve `locator` with `content` once [`MockFetcher::release`] is called.
    pub fn gate(&self, locator: &Locator, content: impl Into<Bytes>) -> &Self {
        let (sender, receiver) = watch::channel(false);
        self.lock().gates.insert(locator.clone(), sender);
        self.script(locator, Script::Gated(receiver, content.into()))
    }

    pub fn release(&self, locator: &Locator) {
        if let Some(gate) = self.lock().gates.get(locator) {
            gate.send_replace(true);
        }
    }

    /// Every locator fetched so far, in call order.
    pub fn requested(&self) -> Vec<Locator> {
        self.lock().requested.clone()
    }

    /// Every fetch dropped before it resolved, in drop order.
    pub fn cancelled(&self) -> Vec<Locator> {
        self.lock().cancelled.clone()
    }

    /// Wait until at least `count` fetches have been issued.
    pub async fn wait_for_requests(&self, count: usize) {
        let mut receiver = self.requests.subscribe();
        let _ = receiver.wait_for(|issued| *issued >= count).await;
    }

    fn script(&self, locator: &Locator, script: Script) -> &Self {
        self.lock().scripts.insert(locator.clone(), script);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FetchService for MockFetcher {
    fn fetch(&self, locator: &Locator) -> impl Future<Output = Result<Bytes>> + Send {
        let script = {
            let mut state = self.lock();
            state.requested.push(locator.clone());
            state.scripts.get(locator).cloned()
        };
        self.requests.send_modify(|issued| *issued += 1);

        let mut guard = CancelGuard {
            state: Arc::clone(&self.state),
            locator: Some(locator.clone()),
        };

        async move {
            let result = match script {
                Some(Script::Content(content)) => Ok(content),
                Some(Script::Fail(error)) => Err(error),
                Some(Script::Never) => std::future::pending().await,
                Some(Script::Gated(mut gate, content)) => {
                    let opened = gate.wait_for(|open| *open).await.is_ok();
                    if opened { Ok(content) } else { std::future::pending().await }
                }
                None => Err(FetchError::Unavailable(format!(
                    "no script for {}",
                    guard.locator.as_ref().map(ToString::to_string).unwrap_or_default()
                ))),
            };
            guard.locator = None;
            result
        }
    }
}

/// Records a cancellation if the fetch future is dropped unresolved.
struct CancelGuard {
    state: Arc<Mutex<State>>,
    locator: Option<Locator>,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(locator) = self.locator.take() {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cancelled
                .push(locator);
        }
    }
}
