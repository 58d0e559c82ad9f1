use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ManifestError;

/// Fragment name to content.
pub type Fragments = BTreeMap<String, Bytes>;

/// One `sources` entry, as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpec {
    /// The entry's key in `sources`.
    pub name: String,
    /// Declared digest, still as hex text.
    pub digest: Option<String>,
    /// Literal content; satisfies the fragment without retrieval.
    pub inline_content: Option<String>,
    /// Candidate locations, in declaration order, not yet parsed. Entries
    /// that are not strings are kept so they can be reported.
    pub locators: Vec<Value>,
}

#[derive(Deserialize)]
struct Entry {
    #[serde(default, alias = "digest")]
    keccak256: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    urls: Vec<Value>,
}

/// A parsed manifest document.
///
/// The whole document is kept so it can travel with the assembled fragments;
/// only `sources` is interpreted.
#[derive(Debug, Clone)]
pub struct Manifest {
    document: Value,
    fragments: Vec<FragmentSpec>,
}

impl Manifest {
    /// Parse a manifest. Fragments keep their document order.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let document: Value = serde_json::from_slice(bytes)?;
        let root = document.as_object().ok_or(ManifestError::NotAnObject)?;
        let sources = root
            .get("sources")
            .and_then(Value::as_object)
            .ok_or(ManifestError::MissingSources)?;

        let mut fragments = Vec::with_capacity(sources.len());
        for (name, entry) in sources {
            let entry = Entry::deserialize(entry).map_err(|source| ManifestError::InvalidEntry {
                name: name.clone(),
                source,
            })?;
            fragments.push(FragmentSpec {
                name: name.clone(),
                digest: entry.keccak256,
                inline_content: entry.content,
                locators: entry.urls,
            });
        }

        Ok(Self {
            document,
            fragments,
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn fragments(&self) -> &[FragmentSpec] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// The outcome of a completed assembly: the manifest and every fragment.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub manifest: Manifest,
    pub fragments: Fragments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_sources() {
        let manifest = Manifest::from_slice(
            br#"{
                "compiler": {"version": "0.8.19"},
                "sources": {
                    "b.sol": {"keccak256": "0x01", "urls": ["bzz-raw://aa", "dweb:/ipfs/Qm"]},
                    "a.sol": {"content": "contract A {}"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.len(), 2);
        let names: Vec<_> = manifest.fragments().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.sol", "a.sol"]);

        let b = &manifest.fragments()[0];
        assert_eq!(b.digest.as_deref(), Some("0x01"));
        assert_eq!(b.locators, [Value::from("bzz-raw://aa"), Value::from("dweb:/ipfs/Qm")]);
        assert!(b.inline_content.is_none());

        let a = &manifest.fragments()[1];
        assert_eq!(a.inline_content.as_deref(), Some("contract A {}"));
        assert!(a.locators.is_empty());

        assert_eq!(manifest.document()["compiler"]["version"], "0.8.19");
    }

    #[test]
    fn test_digest_alias() {
        let manifest = Manifest::from_slice(br#"{"sources": {"x": {"digest": "abcd"}}}"#).unwrap();
        assert_eq!(manifest.fragments()[0].digest.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_empty_sources() {
        let manifest = Manifest::from_slice(br#"{"sources": {}}"#).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Manifest::from_slice(b"not json"), Err(ManifestError::Json(_))));
        assert!(matches!(Manifest::from_slice(b"[1, 2]"), Err(ManifestError::NotAnObject)));
        assert!(matches!(Manifest::from_slice(b"{}"), Err(ManifestError::MissingSources)));
        assert!(matches!(
            Manifest::from_slice(br#"{"sources": []}"#),
            Err(ManifestError::MissingSources)
        ));
        assert!(matches!(
            Manifest::from_slice(br#"{"sources": {"x": 7}}"#),
            Err(ManifestError::InvalidEntry { name, .. }) if name == "x"
        ));
    }

    #[test]
    fn test_non_string_locator_keeps_entry() {
        let manifest =
            Manifest::from_slice(br#"{"sources": {"x": {"keccak256": "00", "urls": [42, "bzz-raw://aa"]}}}"#).unwrap();
        assert_eq!(manifest.fragments()[0].locators, [Value::from(42), Value::from("bzz-raw://aa")]);
    }
}
