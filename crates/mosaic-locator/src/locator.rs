use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::{LocatorError, Result};

const IPFS_PREFIXES: [&str; 4] = ["dweb:/ipfs/", "ipfs://", "ipfs:/", "/ipfs/"];
const SWARM_PREFIXES: [&str; 3] = ["bzz-raw://", "bzzr://", "bzz://"];

/// Kind of endpoint a [`Locator`] is retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// IPFS content identifier, optionally followed by a path.
    Ipfs,
    /// Swarm content hash.
    Swarm,
    /// Plain HTTP(S) URL.
    Http,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Ipfs => write!(f, "ipfs"),
            Endpoint::Swarm => write!(f, "swarm"),
            Endpoint::Http => write!(f, "http"),
        }
    }
}

/// A structured retrieval address.
///
/// Equality, ordering and hashing use the structured form, never the string
/// the locator was parsed from.
///
/// # Examples
///
/// ```
/// use mosaic_locator::{Endpoint, Locator};
///
/// let a: Locator = "dweb:/ipfs/QmTfCPvJYaNV2ZZHSb6HNZDh7VhtZmd5GJ2rWn7ERNXRKy".parse().unwrap();
/// let b: Locator = "ipfs://QmTfCPvJYaNV2ZZHSb6HNZDh7VhtZmd5GJ2rWn7ERNXRKy".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.endpoint(), Endpoint::Ipfs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator {
    endpoint: Endpoint,
    address: String,
}

impl Locator {
    /// IPFS locator from a content identifier with an optional `/path` suffix.
    pub fn ipfs(address: &str) -> Result<Self> {
        let address = address.trim_matches('/');
        let url = format!("dweb:/ipfs/{address}");
        Ok(Self {
            endpoint: Endpoint::Ipfs,
            address: validate_ipfs(address, &url)?,
        })
    }

    /// Swarm locator from a 32 or 64 byte hex hash.
    pub fn swarm(hash: &str) -> Result<Self> {
        let hash = hash.trim_matches('/');
        let url = format!("bzz-raw://{hash}");
        Ok(Self {
            endpoint: Endpoint::Swarm,
            address: validate_swarm(hash, &url)?,
        })
    }

    pub fn http(url: &Url) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => Ok(Self {
                endpoint: Endpoint::Http,
                address: url.to_string(),
            }),
            _ => Err(LocatorError::UnsupportedScheme(url.to_string())),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The address within the endpoint: CID and path, Swarm hash, or full URL.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(LocatorError::MissingAddress(s.to_string()));
        }

        if let Some(rest) = strip_any_prefix(raw, &IPFS_PREFIXES) {
            return Ok(Self {
                endpoint: Endpoint::Ipfs,
                address: validate_ipfs(rest.trim_matches('/'), raw)?,
            });
        }

        if let Some(rest) = strip_any_prefix(raw, &SWARM_PREFIXES) {
            return Ok(Self {
                endpoint: Endpoint::Swarm,
                address: validate_swarm(rest.trim_matches('/'), raw)?,
            });
        }

        if strip_any_prefix(raw, &["http://", "https://"]).is_some() {
            let url = Url::parse(raw).map_err(|source| LocatorError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?;
            return Self::http(&url);
        }

        Err(LocatorError::UnsupportedScheme(raw.to_string()))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.endpoint {
            Endpoint::Ipfs => write!(f, "dweb:/ipfs/{}", self.address),
            Endpoint::Swarm => write!(f, "bzz-raw://{}", self.address),
            Endpoint::Http => f.write_str(&self.address),
        }
    }
}

fn strip_any_prefix<'a>(s: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| {
        let head = s.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
    })
}

fn validate_ipfs(address: &str, url: &str) -> Result<String> {
    if address.is_empty() {
        return Err(LocatorError::MissingAddress(url.to_string()));
    }

    let mut segments = address.split('/');
    let cid = segments.next().unwrap_or_default();
    if !cid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LocatorError::InvalidAddress {
            url: url.to_string(),
            reason: "content identifier must be alphanumeric",
        });
    }

    for segment in segments {
        let valid_chars = segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if segment.is_empty() || segment == "." || segment == ".." || !valid_chars {
            return Err(LocatorError::InvalidAddress {
                url: url.to_string(),
                reason: "invalid path segment",
            });
        }
    }

    Ok(address.to_string())
}

fn validate_swarm(hash: &str, url: &str) -> Result<String> {
    if hash.is_empty() {
        return Err(LocatorError::MissingAddress(url.to_string()));
    }
    if !matches!(hash.len(), 64 | 128) || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LocatorError::InvalidAddress {
            url: url.to_string(),
            reason: "swarm hash must be 64 or 128 hex characters",
        });
    }
    Ok(hash.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const CID: &str = "QmTfCPvJYaNV2ZZHSb6HNZDh7VhtZmd5GJ2rWn7ERNXRKy";
    const SWARM: &str = "8d3a2a7a8b8e2e3bd53f1c4e7ac7f84b1ec8b4b7f5d2e1e0c3f9a1b2c3d4e5f6";

    #[test]
    fn test_ipfs_forms_are_equal() {
        let forms = [
            format!("dweb:/ipfs/{CID}"),
            format!("ipfs://{CID}"),
            format!("ipfs:/{CID}"),
            format!("/ipfs/{CID}"),
            format!("IPFS://{CID}/"),
        ];

        let parsed: HashSet<Locator> = forms.iter().map(|f| f.parse().unwrap()).collect();
        assert_eq!(parsed.len(), 1);

        let locator = parsed.into_iter().next().unwrap();
        assert_eq!(locator.endpoint(), Endpoint::Ipfs);
        assert_eq!(locator.address(), CID);
        assert_eq!(locator.to_string(), format!("dweb:/ipfs/{CID}"));
    }

    #[test]
    fn test_ipfs_keeps_cid_case() {
        let locator: Locator = format!("ipfs://{CID}").parse().unwrap();
        assert_eq!(locator.address(), CID);
    }

    #[test]
    fn test_ipfs_with_path() {
        let locator: Locator = format!("dweb:/ipfs/{CID}/contracts/Token.sol").parse().unwrap();
        assert_eq!(locator.address(), format!("{CID}/contracts/Token.sol"));
    }

    #[test]
    fn test_ipfs_rejects_traversal() {
        let result = format!("ipfs://{CID}/../secret").parse::<Locator>();
        assert!(matches!(result, Err(LocatorError::InvalidAddress { .. })));
    }

    #[test]
    fn test_ipfs_rejects_bad_cid() {
        let result = "dweb:/ipfs/Qm$$$".parse::<Locator>();
        assert!(matches!(result, Err(LocatorError::InvalidAddress { .. })));
    }

    #[test]
    fn test_swarm_forms_normalize() {
        let upper = SWARM.to_uppercase();
        let a: Locator = format!("bzz-raw://{SWARM}").parse().unwrap();
        let b: Locator = format!("bzzr://{upper}").parse().unwrap();

        assert_eq!(a, b);
        assert_eq!(a.endpoint(), Endpoint::Swarm);
        assert_eq!(b.address(), SWARM);
        assert_eq!(b.to_string(), format!("bzz-raw://{SWARM}"));
    }

    #[test]
    fn test_swarm_rejects_short_hash() {
        let result = "bzz-raw://abcd".parse::<Locator>();
        assert!(matches!(result, Err(LocatorError::InvalidAddress { .. })));
    }

    #[test]
    fn test_http_normalized() {
        let a: Locator = "https://Example.com/sources/a.sol".parse().unwrap();
        let b: Locator = "https://example.com:443/sources/a.sol".parse().unwrap();

        assert_eq!(a, b);
        assert_eq!(a.endpoint(), Endpoint::Http);
        assert_eq!(a.to_string(), "https://example.com/sources/a.sol");
    }

    #[test]
    fn test_http_invalid_url() {
        let result = "https://".parse::<Locator>();
        assert!(matches!(result, Err(LocatorError::InvalidUrl { .. })));
    }

    #[test]
    fn test_missing_address() {
        assert!(matches!("".parse::<Locator>(), Err(LocatorError::MissingAddress(_))));
        assert!(matches!("dweb:/ipfs/".parse::<Locator>(), Err(LocatorError::MissingAddress(_))));
        assert!(matches!("bzz-raw://".parse::<Locator>(), Err(LocatorError::MissingAddress(_))));
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = "ftp://example.com/a.sol".parse::<Locator>();
        assert_eq!(
            result,
            Err(LocatorError::UnsupportedScheme("ftp://example.com/a.sol".to_string()))
        );
        assert!(matches!(
            "just some text".parse::<Locator>(),
            Err(LocatorError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_endpoints_distinguish() {
        let ipfs = Locator::ipfs(CID).unwrap();
        let swarm = Locator::swarm(SWARM).unwrap();
        assert_ne!(ipfs, swarm);
        assert_ne!(ipfs.endpoint(), swarm.endpoint());
    }

    #[test]
    fn test_http_constructor_rejects_other_schemes() {
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(matches!(Locator::http(&url), Err(LocatorError::UnsupportedScheme(_))));
    }
}
