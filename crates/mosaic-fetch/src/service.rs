use std::future::Future;

use bytes::Bytes;
use mosaic_locator::Locator;

use crate::Result;

/// Retrieves the content behind a [`Locator`].
///
/// Each call is one subscription: the returned future resolves with the
/// content or with an error once the service has given up on that locator.
/// Dropping the future unsubscribes. A service may deliver content that does
/// not match what the caller expects; callers verify.
pub trait FetchService: Send + Sync + 'static {
    fn fetch(&self, locator: &Locator) -> impl Future<Output = Result<Bytes>> + Send;
}
