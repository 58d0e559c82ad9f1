use std::fmt;
use std::str::FromStr;

use crate::DigestError;

/// Length in bytes of every supported digest.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte content digest.
///
/// Parses from hex with or without a `0x` prefix, in either case. Displays as
/// lowercase `0x`-prefixed hex, the form manifests use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = DigestError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; DIGEST_LEN] =
            bytes.try_into().map_err(|_| DigestError::InvalidLength {
                expected: DIGEST_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(hex_part).map_err(|e| DigestError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_KECCAK: &str = "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";

    #[test]
    fn test_parse_with_and_without_prefix() {
        let plain: Digest = EMPTY_KECCAK.parse().unwrap();
        let prefixed: Digest = format!("0x{EMPTY_KECCAK}").parse().unwrap();
        let upper: Digest = format!("0X{}", EMPTY_KECCAK.to_uppercase()).parse().unwrap();

        assert_eq!(plain, prefixed);
        assert_eq!(plain, upper);
    }

    #[test]
    fn test_display_is_lowercase_prefixed() {
        let digest: Digest = EMPTY_KECCAK.to_uppercase().parse().unwrap();
        assert_eq!(digest.to_string(), format!("0x{EMPTY_KECCAK}"));
        assert_eq!(digest.to_hex(), EMPTY_KECCAK);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let result = "0xdeadbeef".parse::<Digest>();
        assert_eq!(
            result,
            Err(DigestError::InvalidLength {
                expected: DIGEST_LEN,
                actual: 4
            })
        );
    }

    #[test]
    fn test_rejects_non_hex() {
        let result = "0xnothex".parse::<Digest>();
        assert!(matches!(result, Err(DigestError::InvalidHex(_))));
    }

    #[test]
    fn test_debug_shows_hex() {
        let digest = Digest::new([0xab; DIGEST_LEN]);
        let debug = format!("{digest:?}");
        assert!(debug.starts_with("Digest(0xabab"));
    }
}
