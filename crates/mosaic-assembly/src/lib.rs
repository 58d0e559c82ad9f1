//! Content-addressed, multi-source assembly.
//!
//! A [`Manifest`] names fragments by digest, each with inline content or a list
//! of candidate locations. An [`Assembler`] retrieves every missing fragment
//! from any of its locations through a [`FetchService`](mosaic_fetch::FetchService),
//! keeps only content whose recomputed digest is one it is waiting for, stops
//! redundant retrievals once a digest is satisfied, and settles each attempt
//! exactly once.
//!
//! # Architecture
//!
//! - [`data`] - manifest model, configuration, events
//! - [`core`] - [`AssemblyState`]: partition and resolution, no I/O
//! - `effects` - [`Assembler`] and the per-attempt actor
//!
//! # Example
//!
//! ```
//! use mosaic_assembly::{Assembler, AssemblyConfig};
//! use mosaic_fetch::mock::MockFetcher;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let assembler = Assembler::new(MockFetcher::new(), AssemblyConfig::default());
//! let attempt = assembler.begin_with_manifest(r#"{"sources": {"A.sol": {"content": "contract A {}"}}}"#);
//! let assembled = attempt.wait().await.unwrap();
//! assert_eq!(&assembled.fragments["A.sol"][..], b"contract A {}");
//! # }
//! ```

pub mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::{AssemblyState, Partition, PendingFragment, Resolution, Snapshot};
pub use data::{
    Assembled, AssemblyConfig, AssemblyEvent, AttemptId, Discard, EventKind, FragmentSpec, Fragments,
    MalformedFragmentPolicy, Manifest,
};
pub use effects::{Assembler, Assembly};
pub use error::{AssemblyError, FragmentError, ManifestError, Result};
