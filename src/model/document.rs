//! The canonical Document: one ingested SBOM after normalization.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::component::Component;
use super::identifiers::LocalRef;
use crate::formats::FormatSpec;

/// Directed relationship kinds, stored in canonical direction only.
///
/// Source formats that express the inverse (`DEPENDENCY_OF`, `CONTAINED_BY`,
/// `DESCRIBED_BY`, `GENERATES`) are flipped during normalization so every
/// edge reads forward.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    DependsOn,
    Contains,
    Describes,
    GeneratedFrom,
    VariantOf,
    Other(String),
}

impl RelationKind {
    /// Map an SPDX relationship type to a canonical kind, flipping direction
    /// where SPDX spells the inverse. Returns the kind and whether the edge
    /// endpoints must be swapped.
    #[must_use]
    pub fn from_spdx(relationship_type: &str) -> (Self, bool) {
        match relationship_type {
            "DEPENDS_ON" => (Self::DependsOn, false),
            "DEPENDENCY_OF" => (Self::DependsOn, true),
            "CONTAINS" => (Self::Contains, false),
            "CONTAINED_BY" => (Self::Contains, true),
            "DESCRIBES" => (Self::Describes, false),
            "DESCRIBED_BY" => (Self::Describes, true),
            "GENERATED_FROM" => (Self::GeneratedFrom, false),
            "GENERATES" => (Self::GeneratedFrom, true),
            "VARIANT_OF" => (Self::VariantOf, false),
            other => (Self::Other(other.to_string()), false),
        }
    }

    /// The SPDX spelling of this kind, in canonical direction.
    #[must_use]
    pub fn as_spdx_str(&self) -> &str {
        match self {
            Self::DependsOn => "DEPENDS_ON",
            Self::Contains => "CONTAINS",
            Self::Describes => "DESCRIBES",
            Self::GeneratedFrom => "GENERATED_FROM",
            Self::VariantOf => "VARIANT_OF",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_spdx_str())
    }
}

/// A directed edge between two components of one Document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub from: LocalRef,
    pub to: LocalRef,
    pub kind: RelationKind,
}

impl Relationship {
    pub fn new(from: impl Into<LocalRef>, kind: RelationKind, to: impl Into<LocalRef>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

/// SHA-256 content address of a Document's canonical form, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already-computed lowercase hex digest.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex digest string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully normalized SBOM.
///
/// Produced only by the normalizer and immutable afterwards. `content_hash`
/// covers the canonical graph (components, relationships, subject) and
/// deliberately excludes `format` and `ingested_at`, so the same dependency
/// graph hashes identically whichever format it arrived in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content_hash: ContentHash,
    /// The resolved source format this Document was normalized from.
    pub format: FormatSpec,
    pub ingested_at: DateTime<Utc>,
    /// The component this SBOM is about.
    pub subject: LocalRef,
    /// All components keyed by local reference, insertion-ordered.
    pub components: IndexMap<LocalRef, Component>,
    pub relationships: Vec<Relationship>,
    /// Unmapped document-level source fields, preserved for round-tripping.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Document {
    /// The subject component, if present in the component map.
    #[must_use]
    pub fn subject_component(&self) -> Option<&Component> {
        self.components.get(&self.subject)
    }

    /// Direct dependencies of a component, in declaration order.
    pub fn dependencies_of<'a>(
        &'a self,
        of: &'a LocalRef,
    ) -> impl Iterator<Item = &'a Component> + 'a {
        self.relationships
            .iter()
            .filter(move |r| r.kind == RelationKind::DependsOn && &r.from == of)
            .filter_map(|r| self.components.get(&r.to))
    }
}
