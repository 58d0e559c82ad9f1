//! Retrieval of content-addressed fragments.
//!
//! # Architecture
//!
//! - [`FetchService`] - the boundary the assembly engine consumes: one future per locator
//! - [`HttpClient`] - minimal streaming HTTP abstraction, [`ReqwestClient`] in production
//! - [`GatewayFetcher`] - resolves IPFS / Swarm / HTTP locators through gateways,
//!   with bounded retries, timeouts and a size limit
//! - `mock` (feature) - scripted [`FetchService`] for tests
//!
//! The service owns retry policy. Callers own cancellation: dropping a fetch
//! future unsubscribes it.

mod error;
mod gateway;
mod http;
mod options;
mod retry;
mod service;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{FetchError, Result};
pub use gateway::GatewayFetcher;
pub use http::{BoxStream, HttpClient, Response};
pub use options::GatewayOptions;
pub use retry::retry_delay;
pub use service::FetchService;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
