use sha3::Digest as _;

/// Incremental hash computation over content seen in chunks.
pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Keccak256Hasher(sha3::Keccak256);

impl Hasher for Keccak256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Keccak256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Keccak256Hasher {
    pub fn new() -> Self { Self(sha3::Keccak256::new()) }

    pub fn digest(data: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&sha3::Keccak256::digest(data));
        out
    }
}

#[cfg(feature = "sha256")]
pub struct Sha256Hasher(sha2::Sha256);

#[cfg(feature = "sha256")]
impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { sha2::Digest::update(&mut self.0, data); }
    fn finalize(self) -> Vec<u8> { sha2::Digest::finalize(self.0).to_vec() }
}

#[cfg(feature = "sha256")]
impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "sha256")]
impl Sha256Hasher {
    pub fn new() -> Self { Self(<sha2::Sha256 as sha2::Digest>::new()) }

    pub fn digest(data: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&<sha2::Sha256 as sha2::Digest>::digest(data));
        out
    }
}
