//! Supported format families, schema versions, and serializations.
//!
//! Every (family, version) pair is a closed tagged variant dispatched through
//! explicit lookup tables in the validator and parser modules. Adding a
//! version means adding one variant here and one validator/parser pair;
//! shared logic never changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SBOM format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatFamily {
    CycloneDx,
    Spdx,
}

impl FormatFamily {
    /// Human-readable family name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CycloneDx => "CycloneDX",
            Self::Spdx => "SPDX",
        }
    }

    /// Parse a declared-format hint string (API path segments use lowercase).
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.to_lowercase().as_str() {
            "cyclonedx" | "cdx" => Some(Self::CycloneDx),
            "spdx" => Some(Self::Spdx),
            _ => None,
        }
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Supported CycloneDX schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CdxVersion {
    V1_5,
    V1_6,
}

impl CdxVersion {
    /// All supported versions, oldest first.
    pub const ALL: [Self; 2] = [Self::V1_5, Self::V1_6];

    /// The version string as it appears in `specVersion`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1_5 => "1.5",
            Self::V1_6 => "1.6",
        }
    }
}

impl fmt::Display for CdxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supported SPDX schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpdxVersion {
    V2_2,
    V2_3,
}

impl SpdxVersion {
    /// All supported versions, oldest first.
    pub const ALL: [Self; 2] = [Self::V2_2, Self::V2_3];

    /// The version string without the `SPDX-` prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V2_2 => "2.2",
            Self::V2_3 => "2.3",
        }
    }
}

impl fmt::Display for SpdxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialization of the raw document bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Serialization {
    #[default]
    Json,
    TagValue,
}

impl fmt::Display for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::TagValue => write!(f, "tag-value"),
        }
    }
}

/// Fully resolved format: family, schema version, and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatSpec {
    CycloneDx {
        version: CdxVersion,
        serialization: Serialization,
    },
    Spdx {
        version: SpdxVersion,
        serialization: Serialization,
    },
}

impl FormatSpec {
    /// The format family of this spec.
    #[must_use]
    pub const fn family(&self) -> FormatFamily {
        match self {
            Self::CycloneDx { .. } => FormatFamily::CycloneDx,
            Self::Spdx { .. } => FormatFamily::Spdx,
        }
    }

    /// The resolved schema version string.
    #[must_use]
    pub const fn version_str(&self) -> &'static str {
        match self {
            Self::CycloneDx { version, .. } => version.as_str(),
            Self::Spdx { version, .. } => version.as_str(),
        }
    }

    /// The serialization of the raw bytes.
    #[must_use]
    pub const fn serialization(&self) -> Serialization {
        match self {
            Self::CycloneDx { serialization, .. } | Self::Spdx { serialization, .. } => {
                *serialization
            }
        }
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.family(),
            self.version_str(),
            self.serialization()
        )
    }
}

/// Declared-format hint supplied alongside an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatHint {
    pub family: FormatFamily,
    /// Declared schema version string, if the caller knows it.
    pub version: Option<String>,
}

impl FormatHint {
    /// Hint for a format family without a declared version.
    #[must_use]
    pub const fn family(family: FormatFamily) -> Self {
        Self {
            family,
            version: None,
        }
    }

    /// Hint with a declared schema version.
    pub fn with_version(family: FormatFamily, version: impl Into<String>) -> Self {
        Self {
            family,
            version: Some(version.into()),
        }
    }
}

/// Outcome of resolving a declared version string against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion<V> {
    pub version: V,
    /// Present when the declared version was not an exact match.
    pub fallback_warning: Option<String>,
}

fn parse_major_minor(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.trim().splitn(2, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

/// Resolve a declared version against a supported list (oldest first).
///
/// Exact match wins. Otherwise the closest supported version ≤ the declared
/// one is used with a warning, so a newer patch revision of a schema never
/// hard-fails ingestion. When nothing is ≤ the declared version, the oldest
/// supported version is used, also with a warning.
fn resolve<V: Copy>(
    declared: &str,
    supported: &[V],
    as_str: fn(&V) -> &'static str,
    family: FormatFamily,
) -> ResolvedVersion<V> {
    for v in supported {
        if as_str(v) == declared.trim() {
            return ResolvedVersion {
                version: *v,
                fallback_warning: None,
            };
        }
    }

    let declared_mm = parse_major_minor(declared);
    let mut best: Option<V> = None;
    if let Some(declared_mm) = declared_mm {
        for v in supported {
            if let Some(mm) = parse_major_minor(as_str(v)) {
                if mm <= declared_mm {
                    best = Some(*v);
                }
            }
        }
    }

    let version = best.unwrap_or(supported[0]);
    ResolvedVersion {
        fallback_warning: Some(format!(
            "unsupported {family} schema version {declared:?}; validating as {}",
            as_str(&version)
        )),
        version,
    }
}

/// Resolve a declared CycloneDX `specVersion` string.
#[must_use]
pub fn resolve_cdx_version(declared: &str) -> ResolvedVersion<CdxVersion> {
    resolve(
        declared,
        &CdxVersion::ALL,
        |v| v.as_str(),
        FormatFamily::CycloneDx,
    )
}

/// Resolve a declared SPDX version string (with or without the `SPDX-` prefix).
#[must_use]
pub fn resolve_spdx_version(declared: &str) -> ResolvedVersion<SpdxVersion> {
    let stripped = declared.trim().strip_prefix("SPDX-").unwrap_or(declared);
    resolve(
        stripped,
        &SpdxVersion::ALL,
        |v| v.as_str(),
        FormatFamily::Spdx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_match() {
        let resolved = resolve_cdx_version("1.5");
        assert_eq!(resolved.version, CdxVersion::V1_5);
        assert!(resolved.fallback_warning.is_none());
    }

    #[test]
    fn newer_version_falls_back_to_closest_below() {
        let resolved = resolve_cdx_version("1.7");
        assert_eq!(resolved.version, CdxVersion::V1_6);
        assert!(resolved.fallback_warning.is_some());
    }

    #[test]
    fn older_version_falls_back_to_oldest_supported() {
        let resolved = resolve_cdx_version("1.4");
        assert_eq!(resolved.version, CdxVersion::V1_5);
        assert!(resolved.fallback_warning.is_some());
    }

    #[test]
    fn spdx_prefix_is_stripped() {
        let resolved = resolve_spdx_version("SPDX-2.3");
        assert_eq!(resolved.version, SpdxVersion::V2_3);
        assert!(resolved.fallback_warning.is_none());
    }

    #[test]
    fn garbage_version_falls_back_with_warning() {
        let resolved = resolve_spdx_version("next");
        assert_eq!(resolved.version, SpdxVersion::V2_2);
        assert!(resolved.fallback_warning.is_some());
    }

    #[test]
    fn hint_parsing_is_case_insensitive() {
        assert_eq!(
            FormatFamily::from_hint("CycloneDX"),
            Some(FormatFamily::CycloneDx)
        );
        assert_eq!(FormatFamily::from_hint("spdx"), Some(FormatFamily::Spdx));
        assert_eq!(FormatFamily::from_hint("swid"), None);
    }
}
