use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use mosaic_locator::{Endpoint, Locator};
use tracing::{debug, warn};
use url::Url;

use crate::{FetchError, FetchService, GatewayOptions, HttpClient, Result, retry_delay};

/// [`FetchService`] that retrieves locators through HTTP gateways.
///
/// IPFS and Swarm locators are rewritten onto the configured gateways; HTTP
/// locators are fetched directly. Transient failures are retried with
/// exponential backoff, everything else fails the locator immediately.
pub struct GatewayFetcher<C: HttpClient> {
    client: C,
    options: GatewayOptions,
}

impl<C: HttpClient> GatewayFetcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            options: GatewayOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GatewayOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// The URL a locator is retrieved from.
    pub fn gateway_url(&self, locator: &Locator) -> Result<Url> {
        let raw = match locator.endpoint() {
            Endpoint::Ipfs => format!(
                "{}/ipfs/{}",
                self.options.ipfs_gateway.trim_end_matches('/'),
                locator.address()
            ),
            Endpoint::Swarm => format!(
                "{}/bzz-raw:/{}",
                self.options.swarm_gateway.trim_end_matches('/'),
                locator.address()
            ),
            Endpoint::Http => locator.address().to_string(),
        };

        Url::parse(&raw).map_err(|source| FetchError::GatewayUrl {
            locator: locator.to_string(),
            source,
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<Bytes> {
        let limit = self.options.max_content_length;
        let request = async {
            let response = self
                .client
                .stream(url.as_str(), &self.options.headers)
                .await
                .map_err(network)?;

            if !(200..300).contains(&response.status) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            if response.content_length.is_some_and(|len| len > limit) {
                return Err(FetchError::TooLarge { limit });
            }

            let mut body = response.body;
            let mut buffer = BytesMut::new();
            while let Some(chunk) = body.try_next().await.map_err(network)? {
                if (buffer.len() + chunk.len()) as u64 > limit {
                    return Err(FetchError::TooLarge { limit });
                }
                buffer.extend_from_slice(&chunk);
            }
            Ok(buffer.freeze())
        };

        tokio::time::timeout(self.options.request_timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(self.options.request_timeout))?
    }
}

impl<C: HttpClient + 'static> FetchService for GatewayFetcher<C> {
    async fn fetch(&self, locator: &Locator) -> Result<Bytes> {
        let url = self.gateway_url(locator)?;
        let max_retries = self.options.max_retries;

        let mut attempt = 0;
        loop {
            match self.fetch_once(&url).await {
                Ok(content) => {
                    debug!(%locator, %url, bytes = content.len(), "fetched");
                    return Ok(content);
                }
                Err(err) if err.is_transient() && attempt < max_retries => {
                    let delay = retry_delay(attempt, self.options.retry_backoff);
                    warn!(%locator, %url, attempt, ?delay, error = %err, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() && max_retries > 0 => {
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn network<E: std::error::Error>(e: E) -> FetchError {
    FetchError::Network(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxStream, Response};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    const CID: &str = "QmTfCPvJYaNV2ZZHSb6HNZDh7VhtZmd5GJ2rWn7ERNXRKy";
    const SWARM: &str = "8d3a2a7a8b8e2e3bd53f1c4e7ac7f84b1ec8b4b7f5d2e1e0c3f9a1b2c3d4e5f6";

    #[derive(Debug)]
    struct MockError(String);

    impl std::fmt::Display for MockError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for MockError {}

    enum Reply {
        Ok { status: u16, chunks: Vec<&'static [u8]>, declared: Option<u64> },
        ConnectionError,
        Hang,
    }

    /// Answers requests from a queue; the last reply repeats.
    struct MockHttpClient {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockHttpClient {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn ok(body: &'static [u8]) -> Reply {
            Reply::Ok { status: 200, chunks: vec![body], declared: None }
        }

        fn status(status: u16) -> Reply {
            Reply::Ok { status, chunks: vec![], declared: None }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl HttpClient for MockHttpClient {
        type Error = MockError;

        async fn stream(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<Response<Self::Error>, Self::Error> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec()));

            let reply = {
                let mut replies = self.replies.lock().unwrap();
                if replies.len() > 1 { replies.pop_front() } else { replies.front().map(clone_reply) }
            };

            match reply {
                Some(Reply::Ok { status, chunks, declared }) => {
                    let items: Vec<std::result::Result<Bytes, MockError>> = chunks
                        .into_iter()
                        .map(|c| Ok(Bytes::from_static(c)))
                        .collect();
                    let body: BoxStream<'static, _> = Box::pin(futures_util::stream::iter(items));
                    Ok(Response { status, content_length: declared, body })
                }
                Some(Reply::ConnectionError) | None => Err(MockError("connection refused".into())),
                Some(Reply::Hang) => std::future::pending().await,
            }
        }
    }

    fn clone_reply(reply: &Reply) -> Reply {
        match reply {
            Reply::Ok { status, chunks, declared } => Reply::Ok {
                status: *status,
                chunks: chunks.clone(),
                declared: *declared,
            },
            Reply::ConnectionError => Reply::ConnectionError,
            Reply::Hang => Reply::Hang,
        }
    }

    fn fetcher(replies: Vec<Reply>) -> GatewayFetcher<MockHttpClient> {
        GatewayFetcher::new(MockHttpClient::new(replies))
            .with_options(GatewayOptions::default().retry_backoff(Duration::from_millis(1)))
    }

    #[test]
    fn test_gateway_url_mapping() {
        let fetcher = GatewayFetcher::new(MockHttpClient::new(vec![])).with_options(
            GatewayOptions::default()
                .ipfs_gateway("https://gw.example/")
                .swarm_gateway("https://swarm.example"),
        );

        let ipfs: Locator = format!("dweb:/ipfs/{CID}").parse().unwrap();
        let swarm: Locator = format!("bzz-raw://{SWARM}").parse().unwrap();
        let http: Locator = "https://example.com/a.sol".parse().unwrap();

        assert_eq!(
            fetcher.gateway_url(&ipfs).unwrap().as_str(),
            format!("https://gw.example/ipfs/{CID}")
        );
        assert_eq!(
            fetcher.gateway_url(&swarm).unwrap().as_str(),
            format!("https://swarm.example/bzz-raw:/{SWARM}")
        );
        assert_eq!(fetcher.gateway_url(&http).unwrap().as_str(), "https://example.com/a.sol");
    }

    #[test]
    fn test_gateway_url_rejects_bad_base() {
        let fetcher = GatewayFetcher::new(MockHttpClient::new(vec![]))
            .with_options(GatewayOptions::default().ipfs_gateway("not a url"));
        let ipfs: Locator = format!("ipfs://{CID}").parse().unwrap();

        assert!(matches!(fetcher.gateway_url(&ipfs), Err(FetchError::GatewayUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_concatenates_chunks() {
        let fetcher = fetcher(vec![Reply::Ok {
            status: 200,
            chunks: vec![&b"contract "[..], &b"A {}"[..]],
            declared: Some(13),
        }]);
        let locator: Locator = format!("ipfs://{CID}").parse().unwrap();

        let content = fetcher.fetch(&locator).await.unwrap();
        assert_eq!(&content[..], b"contract A {}");
    }

    #[tokio::test]
    async fn test_fetch_sends_headers() {
        let client = MockHttpClient::new(vec![MockHttpClient::ok(b"x")]);
        let fetcher = GatewayFetcher::new(client)
            .with_options(GatewayOptions::default().header("Authorization", "Bearer t"));
        let locator: Locator = "https://example.com/a.sol".parse().unwrap();

        fetcher.fetch(&locator).await.unwrap();
        let requests = fetcher.client.requests.lock().unwrap();
        assert_eq!(requests[0].1, vec![("Authorization".to_string(), "Bearer t".to_string())]);
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let fetcher = fetcher(vec![
            MockHttpClient::status(503),
            Reply::ConnectionError,
            MockHttpClient::ok(b"recovered"),
        ]);
        let locator: Locator = format!("ipfs://{CID}").parse().unwrap();

        let content = fetcher.fetch(&locator).await.unwrap();
        assert_eq!(&content[..], b"recovered");
        assert_eq!(fetcher.client.request_count(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_client_error() {
        let fetcher = fetcher(vec![MockHttpClient::status(404)]);
        let locator: Locator = format!("ipfs://{CID}").parse().unwrap();

        let result = fetcher.fetch(&locator).await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(fetcher.client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let fetcher = fetcher(vec![MockHttpClient::status(502)]);
        let locator: Locator = format!("ipfs://{CID}").parse().unwrap();

        let result = fetcher.fetch(&locator).await;
        match result {
            Err(FetchError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::Status { status: 502, .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(fetcher.client.request_count(), 4);
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let client = MockHttpClient::new(vec![Reply::Ok {
            status: 200,
            chunks: vec![&b"tiny"[..]],
            declared: Some(1024),
        }]);
        let fetcher = GatewayFetcher::new(client)
            .with_options(GatewayOptions::default().max_content_length(16));
        let locator: Locator = "https://example.com/a.sol".parse().unwrap();

        let result = fetcher.fetch(&locator).await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit: 16 })));
        assert_eq!(fetcher.client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_streamed_body_over_limit() {
        let client = MockHttpClient::new(vec![Reply::Ok {
            status: 200,
            chunks: vec![&b"0123456789"[..], &b"0123456789"[..]],
            declared: None,
        }]);
        let fetcher = GatewayFetcher::new(client)
            .with_options(GatewayOptions::default().max_content_length(15));
        let locator: Locator = "https://example.com/a.sol".parse().unwrap();

        let result = fetcher.fetch(&locator).await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit: 15 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried() {
        let client = MockHttpClient::new(vec![Reply::Hang, MockHttpClient::ok(b"late")]);
        let fetcher = GatewayFetcher::new(client).with_options(
            GatewayOptions::default()
                .request_timeout(Duration::from_secs(5))
                .retry_backoff(Duration::from_millis(10)),
        );
        let locator: Locator = "https://example.com/a.sol".parse().unwrap();

        let content = fetcher.fetch(&locator).await.unwrap();
        assert_eq!(&content[..], b"late");
        assert_eq!(fetcher.client.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_retries() {
        let client = MockHttpClient::new(vec![Reply::Hang]);
        let fetcher = GatewayFetcher::new(client).with_options(
            GatewayOptions::default()
                .max_retries(0)
                .request_timeout(Duration::from_secs(5)),
        );
        let locator: Locator = "https://example.com/a.sol".parse().unwrap();

        let result = fetcher.fetch(&locator).await;
        assert!(matches!(result, Err(FetchError::Timeout(d)) if d == Duration::from_secs(5)));
    }
}
