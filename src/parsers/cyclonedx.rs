//! Typed trees for CycloneDX JSON, one top-level type per schema version.
//!
//! The 1.5 and 1.6 trees share their inner field types where the schemas
//! agree; the top level is kept separate so each version can diverge without
//! touching the other. Fields the normalizer does not map are captured by
//! serde-flattened maps and survive export untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// CycloneDX 1.5 document root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cdx15Bom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bom_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CdxMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<CdxComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<CdxDependency>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// CycloneDX 1.6 document root. Structurally identical to 1.5 for the
/// mapped fields; 1.6-only surfaces (tools object form, declarations)
/// arrive through the flattened maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cdx16Bom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bom_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CdxMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<CdxComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<CdxDependency>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Document metadata: timestamp, authoring tools, and the subject component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdxMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Array form in 1.5, object form in 1.6; kept opaque for round-tripping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<CdxComponent>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdxComponent {
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<CdxOrganization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<CdxLicenseChoice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<CdxHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_references: Vec<CdxExternalReference>,
    /// Nested subcomponents; flattened to `Contains` edges at normalization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<CdxComponent>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdxOrganization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Either a single license (by id or name) or an SPDX expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdxLicenseChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<CdxLicense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdxLicense {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdxHash {
    pub alg: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdxExternalReference {
    #[serde(rename = "type")]
    pub reference_type: String,
    pub url: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One entry of the `dependencies` array: a component and what it depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdxDependency {
    #[serde(rename = "ref")]
    pub dependency_ref: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn count_nested(components: &[CdxComponent]) -> usize {
    components
        .iter()
        .map(|c| 1 + count_nested(&c.components))
        .sum()
}

impl Cdx15Bom {
    /// Declared components including the metadata subject and all nesting.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let subject = usize::from(
            self.metadata
                .as_ref()
                .is_some_and(|m| m.component.is_some()),
        );
        subject + count_nested(&self.components)
    }

    /// Declared dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(|d| d.depends_on.len()).sum()
    }
}

impl Cdx16Bom {
    /// Declared components including the metadata subject and all nesting.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let subject = usize::from(
            self.metadata
                .as_ref()
                .is_some_and(|m| m.component.is_some()),
        );
        subject + count_nested(&self.components)
    }

    /// Declared dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(|d| d.depends_on.len()).sum()
    }
}

fn syntax_error(version: &str, e: &serde_json::Error) -> ParseError {
    ParseError::Syntax {
        format: format!("CycloneDX {version} (JSON)"),
        message: e.to_string(),
    }
}

/// Deserialize a JSON value as a CycloneDX 1.5 document.
pub fn parse_1_5(value: Value) -> Result<Cdx15Bom, ParseError> {
    serde_json::from_value(value).map_err(|e| syntax_error("1.5", &e))
}

/// Deserialize a JSON value as a CycloneDX 1.6 document.
pub fn parse_1_6(value: Value) -> Result<Cdx16Bom, ParseError> {
    serde_json::from_value(value).map_err(|e| syntax_error("1.6", &e))
}
