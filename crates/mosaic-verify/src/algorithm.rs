use std::fmt;
use std::str::FromStr;

use crate::{Digest, DigestError, Hasher, Keccak256Hasher};

#[cfg(feature = "sha256")]
use crate::Sha256Hasher;

/// Hash function used to derive a fragment's [`Digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Keccak-256, as used by contract metadata `keccak256` fields.
    #[default]
    Keccak256,

    #[cfg(feature = "sha256")]
    Sha256,
}

impl Algorithm {
    /// Digest `data` in one pass.
    pub fn digest(self, data: &[u8]) -> Digest {
        match self {
            Algorithm::Keccak256 => Digest::new(Keccak256Hasher::digest(data)),
            #[cfg(feature = "sha256")]
            Algorithm::Sha256 => Digest::new(Sha256Hasher::digest(data)),
        }
    }

    /// A fresh incremental hasher for this algorithm.
    pub fn hasher(self) -> AlgorithmHasher {
        match self {
            Algorithm::Keccak256 => AlgorithmHasher::Keccak256(Keccak256Hasher::new()),
            #[cfg(feature = "sha256")]
            Algorithm::Sha256 => AlgorithmHasher::Sha256(Sha256Hasher::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Keccak256 => "keccak256",
            #[cfg(feature = "sha256")]
            Algorithm::Sha256 => "sha256",
        }
    }
}

/// Incremental hasher for an [`Algorithm`] chosen at runtime.
pub enum AlgorithmHasher {
    Keccak256(Keccak256Hasher),
    #[cfg(feature = "sha256")]
    Sha256(Sha256Hasher),
}

impl AlgorithmHasher {
    pub fn finish(self) -> Digest {
        let mut out = [0u8; crate::DIGEST_LEN];
        out.copy_from_slice(&self.finalize());
        Digest::new(out)
    }
}

impl Hasher for AlgorithmHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            AlgorithmHasher::Keccak256(h) => h.update(data),
            #[cfg(feature = "sha256")]
            AlgorithmHasher::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            AlgorithmHasher::Keccak256(h) => h.finalize(),
            #[cfg(feature = "sha256")]
            AlgorithmHasher::Sha256(h) => h.finalize(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "keccak256" | "keccak" => Ok(Algorithm::Keccak256),
            #[cfg(feature = "sha256")]
            "sha256" => Ok(Algorithm::Sha256),
            _ => Err(DigestError::UnknownAlgorithm(s.to_string())),
        }
    }
}
