use std::sync::Arc;
use std::time::Duration;

/// Default IPFS gateway.
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io";

/// Default Swarm gateway.
pub const DEFAULT_SWARM_GATEWAY: &str = "https://swarm-gateways.net";

/// Configuration for [`GatewayFetcher`](crate::GatewayFetcher).
///
/// # Examples
///
/// ```
/// use mosaic_fetch::GatewayOptions;
/// use std::time::Duration;
///
/// let options = GatewayOptions::default()
///     .ipfs_gateway("https://dweb.link")
///     .max_retries(5)
///     .request_timeout(Duration::from_secs(10));
/// assert_eq!(options.ipfs_gateway, "https://dweb.link");
/// ```
#[derive(Clone, Debug)]
pub struct GatewayOptions {
    /// Base URL that IPFS locators are resolved against, as `{base}/ipfs/{cid}`.
    pub ipfs_gateway: String,

    /// Base URL that Swarm locators are resolved against, as `{base}/bzz-raw:/{hash}`.
    pub swarm_gateway: String,

    /// Headers sent with every request, including retries.
    pub headers: Arc<[(String, String)]>,

    /// Retries after the initial attempt for transient failures.
    ///
    /// Total attempts = 1 + max_retries. Default: 3
    pub max_retries: u32,

    /// Base delay for exponential backoff, `retry_backoff * 2^n` before retry n.
    ///
    /// Default: 100ms
    pub retry_backoff: Duration,

    /// Limit for one attempt, body included. Default: 30s
    pub request_timeout: Duration,

    /// Largest accepted body in bytes. Default: 30 MiB
    pub max_content_length: u64,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            swarm_gateway: DEFAULT_SWARM_GATEWAY.to_string(),
            headers: Arc::new([]),
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            max_content_length: 30 * 1024 * 1024,
        }
    }
}

impl GatewayOptions {
    #[must_use]
    pub fn ipfs_gateway(mut self, base: impl Into<String>) -> Self {
        self.ipfs_gateway = base.into();
        self
    }

    #[must_use]
    pub fn swarm_gateway(mut self, base: impl Into<String>) -> Self {
        self.swarm_gateway = base.into();
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn max_content_length(mut self, max_content_length: u64) -> Self {
        self.max_content_length = max_content_length;
        self
    }
}
