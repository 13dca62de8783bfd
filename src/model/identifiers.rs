//! Component reference identifiers.
//!
//! A [`LocalRef`] is unique within one Document and is derived from the
//! source document's own identifiers (CycloneDX `bom-ref`, SPDX `SPDXID`),
//! never regenerated; regenerating would break relationship resolution.
//! Identity across Documents is established only via package-url or hash
//! matching, represented here by the canonical identity string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable local reference id for a component, unique within one Document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalRef(String);

impl LocalRef {
    /// Create a local reference from a source-document identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying reference string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocalRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocalRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Normalize a package-url for identity comparison.
///
/// Uses the `packageurl` crate for structural validation; a malformed purl
/// falls back to lowercasing so identity stays deterministic either way.
#[must_use]
pub fn normalize_purl(purl: &str) -> String {
    match packageurl::PackageUrl::from_str(purl) {
        Ok(parsed) => parsed.to_string().to_lowercase(),
        Err(_) => purl.trim().to_lowercase(),
    }
}

/// Check whether a purl string is structurally valid.
#[must_use]
pub fn purl_is_valid(purl: &str) -> bool {
    packageurl::PackageUrl::from_str(purl).is_ok()
}

/// Format-independent identity for cross-document matching and
/// content-addressing: the normalized purl when present, otherwise
/// `name@version` (lowercased name).
#[must_use]
pub fn canonical_identity(purl: Option<&str>, name: &str, version: Option<&str>) -> String {
    if let Some(purl) = purl {
        return normalize_purl(purl);
    }
    match version {
        Some(v) => format!("{}@{}", name.to_lowercase(), v),
        None => name.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prefers_purl() {
        let id = canonical_identity(Some("pkg:cargo/serde@1.0.0"), "Serde", Some("1.0.0"));
        assert!(id.starts_with("pkg:cargo/serde"));
    }

    #[test]
    fn identity_falls_back_to_name_version() {
        assert_eq!(canonical_identity(None, "App", Some("1.0.0")), "app@1.0.0");
        assert_eq!(canonical_identity(None, "App", None), "app");
    }

    #[test]
    fn malformed_purl_still_normalizes() {
        let id = canonical_identity(Some("not-a-purl"), "x", None);
        assert_eq!(id, "not-a-purl");
        assert!(!purl_is_valid("not-a-purl"));
    }

    #[test]
    fn valid_purl_is_recognized() {
        assert!(purl_is_valid("pkg:npm/%40scope/name@1.2.3"));
    }
}
