//! Normalized component and its attribute types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

use super::identifiers::{canonical_identity, LocalRef};
use super::license::LicenseSet;

/// Kind of component, the union of what the supported formats can express.
///
/// CycloneDX `type` and SPDX `primaryPackagePurpose` both map here; values
/// neither side recognizes are carried through as [`ComponentType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    Application,
    Library,
    Framework,
    Container,
    OperatingSystem,
    Device,
    Firmware,
    File,
    Other(String),
}

impl ComponentType {
    /// Parse a CycloneDX component type string.
    #[must_use]
    pub fn from_cdx(s: &str) -> Self {
        match s {
            "application" => Self::Application,
            "library" => Self::Library,
            "framework" => Self::Framework,
            "container" => Self::Container,
            "operating-system" => Self::OperatingSystem,
            "device" => Self::Device,
            "firmware" => Self::Firmware,
            "file" => Self::File,
            other => Self::Other(other.to_string()),
        }
    }

    /// Parse an SPDX `primaryPackagePurpose` value.
    #[must_use]
    pub fn from_spdx_purpose(s: &str) -> Self {
        match s {
            "APPLICATION" => Self::Application,
            "LIBRARY" => Self::Library,
            "FRAMEWORK" => Self::Framework,
            "CONTAINER" => Self::Container,
            "OPERATING-SYSTEM" => Self::OperatingSystem,
            "DEVICE" => Self::Device,
            "FIRMWARE" => Self::Firmware,
            "FILE" => Self::File,
            other => Self::Other(other.to_string()),
        }
    }

    /// The CycloneDX spelling of this type.
    #[must_use]
    pub fn as_cdx_str(&self) -> &str {
        match self {
            Self::Application => "application",
            Self::Library => "library",
            Self::Framework => "framework",
            Self::Container => "container",
            Self::OperatingSystem => "operating-system",
            Self::Device => "device",
            Self::Firmware => "firmware",
            Self::File => "file",
            Self::Other(s) => s,
        }
    }

    /// The SPDX `primaryPackagePurpose` spelling of this type.
    #[must_use]
    pub fn as_spdx_purpose(&self) -> String {
        match self {
            Self::Other(s) => s.clone(),
            _ => self.as_cdx_str().to_uppercase(),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cdx_str())
    }
}

/// Checksum algorithms carried on components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_512,
    Other(String),
}

impl HashAlgorithm {
    /// Parse an algorithm name from either format's spelling
    /// (`SHA-256`, `SHA256`, case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().replace('-', "").as_str() {
            "MD5" => Self::Md5,
            "SHA1" => Self::Sha1,
            "SHA256" => Self::Sha256,
            "SHA384" => Self::Sha384,
            "SHA512" => Self::Sha512,
            "SHA3256" => Self::Sha3_256,
            "SHA3512" => Self::Sha3_512,
            _ => Self::Other(s.to_string()),
        }
    }

    /// The CycloneDX `alg` spelling.
    #[must_use]
    pub fn as_cdx_str(&self) -> &str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_512 => "SHA3-512",
            Self::Other(s) => s,
        }
    }

    /// The SPDX checksum-algorithm spelling.
    #[must_use]
    pub fn as_spdx_str(&self) -> String {
        match self {
            Self::Other(s) => s.clone(),
            _ => self.as_cdx_str().replace('-', ""),
        }
    }
}

/// One checksum on a component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentHash {
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

impl ComponentHash {
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into().to_lowercase(),
        }
    }
}

/// Kind of external reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalRefKind {
    DownloadLocation,
    Vcs,
    Website,
    IssueTracker,
    Cpe,
    Other(String),
}

impl ExternalRefKind {
    /// Parse a CycloneDX external-reference type string.
    #[must_use]
    pub fn from_cdx(s: &str) -> Self {
        match s {
            "distribution" => Self::DownloadLocation,
            "vcs" => Self::Vcs,
            "website" => Self::Website,
            "issue-tracker" => Self::IssueTracker,
            other => Self::Other(other.to_string()),
        }
    }

    /// The CycloneDX external-reference type spelling.
    #[must_use]
    pub fn as_cdx_str(&self) -> &str {
        match self {
            Self::DownloadLocation => "distribution",
            Self::Vcs => "vcs",
            Self::Website => "website",
            Self::IssueTracker => "issue-tracker",
            Self::Cpe => "other",
            Self::Other(s) => s,
        }
    }
}

/// An external reference (download location, VCS URL, CPE, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExternalRef {
    pub kind: ExternalRefKind,
    pub url: String,
}

impl ExternalRef {
    pub fn new(kind: ExternalRefKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

/// A normalized software component.
///
/// Source-format fields with no counterpart here survive in `extensions`
/// keyed by their original field names, so export can reproduce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Reference id from the source document, unique within the Document.
    pub local_ref: LocalRef,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Best-effort semver interpretation of `version`; absent when the
    /// version string is not semver. Never a substitute for `version`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semver: Option<semver::Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "LicenseSet::is_empty")]
    pub licenses: LicenseSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<ComponentHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<ExternalRef>,
    /// Unmapped source fields, preserved verbatim for round-tripping.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, serde_json::Value>,
    /// Cheap content hash for change detection, not identity.
    #[serde(skip)]
    pub content_hash: u64,
}

impl Component {
    /// Minimal component with just a reference id and a name.
    pub fn new(local_ref: impl Into<LocalRef>, name: impl Into<String>) -> Self {
        Self {
            local_ref: local_ref.into(),
            name: name.into(),
            version: None,
            semver: None,
            supplier: None,
            component_type: None,
            purl: None,
            licenses: LicenseSet::new(),
            hashes: Vec::new(),
            external_refs: Vec::new(),
            extensions: IndexMap::new(),
            content_hash: 0,
        }
    }

    /// Format-independent identity string: normalized purl when present,
    /// otherwise `name@version`.
    #[must_use]
    pub fn canonical_identity(&self) -> String {
        canonical_identity(self.purl.as_deref(), &self.name, self.version.as_deref())
    }

    /// Recompute the xxh3 change-detection hash over the identifying and
    /// attribute fields. Call after the component is fully populated.
    pub fn update_content_hash(&mut self) {
        let mut buf = String::new();
        buf.push_str(&self.canonical_identity());
        if let Some(supplier) = &self.supplier {
            buf.push('\x1f');
            buf.push_str(supplier);
        }
        if let Some(t) = &self.component_type {
            buf.push('\x1f');
            buf.push_str(t.as_cdx_str());
        }
        for license in &self.licenses.licenses {
            buf.push('\x1f');
            buf.push_str(&license.id);
        }
        for hash in &self.hashes {
            buf.push('\x1f');
            buf.push_str(&hash.value);
        }
        for eref in &self.external_refs {
            buf.push('\x1f');
            buf.push_str(&eref.url);
        }
        self.content_hash = xxh3_64(buf.as_bytes());
    }

    /// Parse `version` into `semver` when it is well-formed semver.
    pub fn update_semver(&mut self) {
        self.semver = self
            .version
            .as_deref()
            .and_then(|v| semver::Version::parse(v.trim_start_matches('v')).ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_round_trips_spellings() {
        assert_eq!(
            ComponentType::from_cdx("operating-system"),
            ComponentType::OperatingSystem
        );
        assert_eq!(
            ComponentType::from_spdx_purpose("LIBRARY"),
            ComponentType::Library
        );
        assert_eq!(
            ComponentType::OperatingSystem.as_spdx_purpose(),
            "OPERATING-SYSTEM"
        );
        assert_eq!(
            ComponentType::from_cdx("machine-learning-model"),
            ComponentType::Other("machine-learning-model".to_string())
        );
    }

    #[test]
    fn hash_algorithm_accepts_both_spellings() {
        assert_eq!(HashAlgorithm::parse("SHA-256"), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::parse("SHA256"), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::parse("sha256"), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::Sha256.as_spdx_str(), "SHA256");
    }

    #[test]
    fn content_hash_reflects_attribute_changes() {
        let mut a = Component::new("ref-1", "serde");
        a.version = Some("1.0.0".to_string());
        a.update_content_hash();
        let before = a.content_hash;

        a.supplier = Some("serde team".to_string());
        a.update_content_hash();
        assert_ne!(before, a.content_hash);
    }

    #[test]
    fn semver_is_best_effort() {
        let mut c = Component::new("r", "x");
        c.version = Some("1.2.3".to_string());
        c.update_semver();
        assert!(c.semver.is_some());

        c.version = Some("2024-01-01".to_string());
        c.update_semver();
        assert!(c.semver.is_none());
        assert_eq!(c.version.as_deref(), Some("2024-01-01"));
    }
}
