//! Content digests for content-addressed fragments.
//!
//! A fragment's identity is the digest of its bytes. This crate provides the
//! fixed-size [`Digest`] value used as that identity, the [`Algorithm`]s that
//! produce it, and a minimal incremental [`Hasher`] trait for callers that see
//! content in chunks.
//!
//! # Example
//!
//! ```
//! use mosaic_verify::{Algorithm, Digest};
//!
//! let digest = Algorithm::Keccak256.digest(b"");
//! let parsed: Digest = "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
//!     .parse()
//!     .unwrap();
//! assert_eq!(digest, parsed);
//! ```

pub use self::algorithm::{Algorithm, AlgorithmHasher};
pub use self::digest::{DIGEST_LEN, Digest};
pub use self::error::{DigestError, Result};
pub use self::hasher::{Hasher, Keccak256Hasher};

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

mod algorithm;
mod digest;
mod error;
mod hasher;
