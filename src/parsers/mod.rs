//! Per-version parsers: raw bytes to a typed, version-specific tree.
//!
//! Parsing happens in two steps. [`read_raw`] turns bytes into a [`RawTree`]
//! (a generic JSON value or a flat tag-value list) that the validators
//! inspect without committing to a schema. [`parse`] then deserializes the
//! raw tree into the typed tree for the exact (family, version) pair the
//! detector chose. Each supported version owns its tree type; nothing is
//! branched on a version field inside shared structs.

pub mod cyclonedx;
pub mod spdx;

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::formats::{CdxVersion, FormatSpec, Serialization, SpdxVersion};

pub use cyclonedx::{Cdx15Bom, Cdx16Bom};
pub use spdx::{Spdx22Document, Spdx23Document};

/// One `Tag: value` line from an SPDX tag-value document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValuePair {
    pub key: String,
    pub value: String,
    /// 1-based source line of the tag, for finding paths.
    pub line: usize,
}

/// Serialization-level parse of the raw bytes, schema-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTree {
    Json(Value),
    TagValue(Vec<TagValuePair>),
}

/// Parse raw bytes at the serialization level only.
///
/// # Errors
///
/// [`ParseError::Syntax`] when the bytes do not parse as the serialization
/// the detector chose.
pub fn read_raw(spec: FormatSpec, bytes: &[u8]) -> Result<RawTree, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Syntax {
        format: spec.to_string(),
        message: format!("input is not valid UTF-8: {e}"),
    })?;

    match spec.serialization() {
        Serialization::Json => {
            let value: Value = serde_json::from_str(text).map_err(|e| ParseError::Syntax {
                format: spec.to_string(),
                message: e.to_string(),
            })?;
            Ok(RawTree::Json(value))
        }
        Serialization::TagValue => Ok(RawTree::TagValue(read_tag_value(text))),
    }
}

/// Split tag-value text into pairs. `<text>...</text>` blocks may span
/// lines; comment lines and blank lines are skipped.
pub(crate) fn read_tag_value(text: &str) -> Vec<TagValuePair> {
    let mut pairs = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((idx, line)) = lines.next() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let mut value = value.trim().to_string();

        if value.starts_with("<text>") && !value.contains("</text>") {
            for (_, continuation) in lines.by_ref() {
                value.push('\n');
                value.push_str(continuation);
                if continuation.contains("</text>") {
                    break;
                }
            }
        }
        if let Some(inner) = value
            .strip_prefix("<text>")
            .and_then(|v| v.strip_suffix("</text>"))
        {
            value = inner.trim().to_string();
        }

        pairs.push(TagValuePair {
            key,
            value,
            line: idx + 1,
        });
    }
    pairs
}

/// The typed tree for one (family, version) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatTree {
    Cdx15(Cdx15Bom),
    Cdx16(Cdx16Bom),
    Spdx22(Spdx22Document),
    Spdx23(Spdx23Document),
}

impl FormatTree {
    /// The format spec this tree was parsed as.
    #[must_use]
    pub fn spec(&self) -> FormatSpec {
        match self {
            Self::Cdx15(_) => FormatSpec::CycloneDx {
                version: CdxVersion::V1_5,
                serialization: Serialization::Json,
            },
            Self::Cdx16(_) => FormatSpec::CycloneDx {
                version: CdxVersion::V1_6,
                serialization: Serialization::Json,
            },
            Self::Spdx22(doc) => FormatSpec::Spdx {
                version: SpdxVersion::V2_2,
                serialization: doc.serialization,
            },
            Self::Spdx23(doc) => FormatSpec::Spdx {
                version: SpdxVersion::V2_3,
                serialization: doc.serialization,
            },
        }
    }

    /// Total declared components, nested CycloneDX components included.
    #[must_use]
    pub fn component_count(&self) -> usize {
        match self {
            Self::Cdx15(bom) => bom.component_count(),
            Self::Cdx16(bom) => bom.component_count(),
            Self::Spdx22(doc) => doc.packages.len(),
            Self::Spdx23(doc) => doc.packages.len(),
        }
    }

    /// Total declared relationship/dependency edges.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        match self {
            Self::Cdx15(bom) => bom.edge_count(),
            Self::Cdx16(bom) => bom.edge_count(),
            Self::Spdx22(doc) => doc.relationships.len(),
            Self::Spdx23(doc) => doc.relationships.len(),
        }
    }
}

/// Deserialize a raw tree into the typed tree for `spec`.
///
/// # Errors
///
/// [`ParseError::SchemaMismatch`] when the raw tree's serialization or
/// discriminators do not fit the detected format; [`ParseError::Syntax`]
/// when typed deserialization fails structurally.
pub fn parse(spec: FormatSpec, raw: RawTree) -> Result<FormatTree, ParseError> {
    let tree = match (spec, raw) {
        (FormatSpec::CycloneDx { version, .. }, RawTree::Json(value)) => match version {
            CdxVersion::V1_5 => FormatTree::Cdx15(cyclonedx::parse_1_5(value)?),
            CdxVersion::V1_6 => FormatTree::Cdx16(cyclonedx::parse_1_6(value)?),
        },
        (FormatSpec::Spdx { version, .. }, RawTree::Json(value)) => match version {
            SpdxVersion::V2_2 => FormatTree::Spdx22(spdx::parse_json_2_2(value)?),
            SpdxVersion::V2_3 => FormatTree::Spdx23(spdx::parse_json_2_3(value)?),
        },
        (FormatSpec::Spdx { version, .. }, RawTree::TagValue(pairs)) => match version {
            SpdxVersion::V2_2 => FormatTree::Spdx22(spdx::parse_tag_value_2_2(&pairs)),
            SpdxVersion::V2_3 => FormatTree::Spdx23(spdx::parse_tag_value_2_3(&pairs)),
        },
        (spec @ FormatSpec::CycloneDx { .. }, RawTree::TagValue(_)) => {
            return Err(ParseError::SchemaMismatch {
                expected: spec.to_string(),
                message: "CycloneDX has no tag-value serialization".to_string(),
            })
        }
    };

    debug!(
        format = %tree.spec(),
        components = tree.component_count(),
        relationships = tree.relationship_count(),
        "parsed typed tree"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FormatFamily;

    fn cdx15() -> FormatSpec {
        FormatSpec::CycloneDx {
            version: CdxVersion::V1_5,
            serialization: Serialization::Json,
        }
    }

    #[test]
    fn read_raw_rejects_bad_json() {
        let err = read_raw(cdx15(), b"{ not json").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn tag_value_splits_on_first_colon() {
        let pairs = read_tag_value("PackageDownloadLocation: https://example.com/x\n");
        assert_eq!(pairs[0].key, "PackageDownloadLocation");
        assert_eq!(pairs[0].value, "https://example.com/x");
    }

    #[test]
    fn tag_value_joins_text_blocks() {
        let pairs = read_tag_value(
            "PackageDescription: <text>line one\nline two</text>\nPackageName: x\n",
        );
        assert_eq!(pairs[0].value, "line one\nline two");
        assert_eq!(pairs[1].key, "PackageName");
        assert_eq!(pairs[1].line, 3);
    }

    #[test]
    fn cyclonedx_tag_value_is_schema_mismatch() {
        let raw = RawTree::TagValue(Vec::new());
        let err = parse(cdx15(), raw).unwrap_err();
        assert!(matches!(err, ParseError::SchemaMismatch { .. }));
    }

    #[test]
    fn tree_reports_its_spec() {
        let raw = read_raw(cdx15(), br#"{"bomFormat":"CycloneDX","specVersion":"1.5"}"#).unwrap();
        let tree = parse(cdx15(), raw).unwrap();
        assert_eq!(tree.spec().family(), FormatFamily::CycloneDx);
        assert_eq!(tree.spec().version_str(), "1.5");
    }
}
