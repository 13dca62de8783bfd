//! Typed trees for SPDX documents, one top-level type per schema version,
//! each fed by a JSON deserializer and a tag-value builder.
//!
//! 2.3 adds `primaryPackagePurpose` over 2.2; the 2.2 tree does not carry
//! the field at all, so a 2.2 document can never smuggle one through.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;
use crate::formats::Serialization;
use crate::parsers::TagValuePair;

/// SPDX 2.2 document root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spdx22Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spdx_version: Option<String>,
    #[serde(rename = "SPDXID", skip_serializing_if = "Option::is_none")]
    pub spdxid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_describes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<Spdx22Package>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<SpdxRelationship>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    /// How the document arrived; not part of the JSON schema.
    #[serde(skip)]
    pub serialization: Serialization,
}

/// SPDX 2.3 document root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spdx23Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spdx_version: Option<String>,
    #[serde(rename = "SPDXID", skip_serializing_if = "Option::is_none")]
    pub spdxid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_describes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<Spdx23Package>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<SpdxRelationship>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
    /// How the document arrived; not part of the JSON schema.
    #[serde(skip)]
    pub serialization: Serialization,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spdx22Package {
    #[serde(rename = "SPDXID", skip_serializing_if = "Option::is_none")]
    pub spdxid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_declared: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checksums: Vec<SpdxChecksum>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<SpdxExternalRef>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// 2.3 package: 2.2 plus `primaryPackagePurpose`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spdx23Package {
    #[serde(rename = "SPDXID", skip_serializing_if = "Option::is_none")]
    pub spdxid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_declared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_package_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checksums: Vec<SpdxChecksum>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<SpdxExternalRef>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxChecksum {
    pub algorithm: String,
    pub checksum_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxExternalRef {
    pub reference_category: String,
    pub reference_type: String,
    pub reference_locator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxRelationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spdx_element_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_spdx_element: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn syntax_error(version: &str, e: &serde_json::Error) -> ParseError {
    ParseError::Syntax {
        format: format!("SPDX {version} (JSON)"),
        message: e.to_string(),
    }
}

/// Deserialize a JSON value as an SPDX 2.2 document.
pub fn parse_json_2_2(value: Value) -> Result<Spdx22Document, ParseError> {
    serde_json::from_value(value).map_err(|e| syntax_error("2.2", &e))
}

/// Deserialize a JSON value as an SPDX 2.3 document.
pub fn parse_json_2_3(value: Value) -> Result<Spdx23Document, ParseError> {
    serde_json::from_value(value).map_err(|e| syntax_error("2.3", &e))
}

/// Package fields common to both versions, accumulated while walking
/// tag-value pairs.
#[derive(Debug, Default)]
struct PackageDraft {
    spdxid: Option<String>,
    name: Option<String>,
    version_info: Option<String>,
    supplier: Option<String>,
    download_location: Option<String>,
    license_concluded: Option<String>,
    license_declared: Option<String>,
    primary_package_purpose: Option<String>,
    checksums: Vec<SpdxChecksum>,
    external_refs: Vec<SpdxExternalRef>,
    extra: IndexMap<String, Value>,
}

#[derive(Debug, Default)]
struct DocumentDraft {
    spdx_version: Option<String>,
    spdxid: Option<String>,
    name: Option<String>,
    data_license: Option<String>,
    document_namespace: Option<String>,
    relationships: Vec<SpdxRelationship>,
    packages: Vec<PackageDraft>,
    extra: IndexMap<String, Value>,
}

/// Walk tag-value pairs into a version-independent draft. `PackageName`
/// starts a new package; SPDXID and the other Package* tags bind to the
/// package currently open, or to the document before any package opens.
fn build_draft(pairs: &[TagValuePair]) -> DocumentDraft {
    let mut doc = DocumentDraft::default();

    for pair in pairs {
        match pair.key.as_str() {
            "SPDXVersion" => doc.spdx_version = Some(pair.value.clone()),
            "DataLicense" => doc.data_license = Some(pair.value.clone()),
            "DocumentName" => doc.name = Some(pair.value.clone()),
            "DocumentNamespace" => doc.document_namespace = Some(pair.value.clone()),
            "SPDXID" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.spdxid = Some(pair.value.clone());
                } else {
                    doc.spdxid = Some(pair.value.clone());
                }
            }
            "PackageName" => doc.packages.push(PackageDraft {
                name: Some(pair.value.clone()),
                ..PackageDraft::default()
            }),
            "PackageVersion" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.version_info = Some(pair.value.clone());
                }
            }
            "PackageSupplier" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.supplier = Some(pair.value.clone());
                }
            }
            "PackageDownloadLocation" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.download_location = Some(pair.value.clone());
                }
            }
            "PackageLicenseConcluded" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.license_concluded = Some(pair.value.clone());
                }
            }
            "PackageLicenseDeclared" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.license_declared = Some(pair.value.clone());
                }
            }
            "PrimaryPackagePurpose" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    pkg.primary_package_purpose = Some(pair.value.clone());
                }
            }
            // "PackageChecksum: SHA256: abc..."
            "PackageChecksum" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    if let Some((algorithm, value)) = pair.value.split_once(':') {
                        pkg.checksums.push(SpdxChecksum {
                            algorithm: algorithm.trim().to_string(),
                            checksum_value: value.trim().to_string(),
                        });
                    }
                }
            }
            // "ExternalRef: PACKAGE-MANAGER purl pkg:cargo/serde@1.0.0"
            "ExternalRef" => {
                if let Some(pkg) = doc.packages.last_mut() {
                    let mut parts = pair.value.split_whitespace();
                    if let (Some(category), Some(ref_type), Some(locator)) =
                        (parts.next(), parts.next(), parts.next())
                    {
                        pkg.external_refs.push(SpdxExternalRef {
                            reference_category: category.to_string(),
                            reference_type: ref_type.to_string(),
                            reference_locator: locator.to_string(),
                        });
                    }
                }
            }
            // "Relationship: SPDXRef-a DEPENDS_ON SPDXRef-b"
            "Relationship" => {
                let mut parts = pair.value.split_whitespace();
                if let (Some(from), Some(kind), Some(to)) =
                    (parts.next(), parts.next(), parts.next())
                {
                    doc.relationships.push(SpdxRelationship {
                        spdx_element_id: Some(from.to_string()),
                        relationship_type: Some(kind.to_string()),
                        related_spdx_element: Some(to.to_string()),
                        extra: IndexMap::new(),
                    });
                }
            }
            other => {
                let value = Value::String(pair.value.clone());
                match doc.packages.last_mut() {
                    Some(pkg) => pkg.extra.insert(other.to_string(), value),
                    None => doc.extra.insert(other.to_string(), value),
                };
            }
        }
    }
    doc
}

/// Build an SPDX 2.2 tree from tag-value pairs. Tag-value has no syntax
/// beyond `Tag: value`, so building never fails; missing required tags are
/// the validator's concern.
#[must_use]
pub fn parse_tag_value_2_2(pairs: &[TagValuePair]) -> Spdx22Document {
    let draft = build_draft(pairs);
    Spdx22Document {
        spdx_version: draft.spdx_version,
        spdxid: draft.spdxid,
        name: draft.name,
        data_license: draft.data_license,
        document_namespace: draft.document_namespace,
        creation_info: None,
        document_describes: Vec::new(),
        packages: draft
            .packages
            .into_iter()
            .map(|p| Spdx22Package {
                spdxid: p.spdxid,
                name: p.name,
                version_info: p.version_info,
                supplier: p.supplier,
                download_location: p.download_location,
                license_concluded: p.license_concluded,
                license_declared: p.license_declared,
                checksums: p.checksums,
                external_refs: p.external_refs,
                extra: p.extra,
            })
            .collect(),
        relationships: draft.relationships,
        extra: draft.extra,
        serialization: Serialization::TagValue,
    }
}

/// Build an SPDX 2.3 tree from tag-value pairs.
#[must_use]
pub fn parse_tag_value_2_3(pairs: &[TagValuePair]) -> Spdx23Document {
    let draft = build_draft(pairs);
    Spdx23Document {
        spdx_version: draft.spdx_version,
        spdxid: draft.spdxid,
        name: draft.name,
        data_license: draft.data_license,
        document_namespace: draft.document_namespace,
        creation_info: None,
        document_describes: Vec::new(),
        packages: draft
            .packages
            .into_iter()
            .map(|p| Spdx23Package {
                spdxid: p.spdxid,
                name: p.name,
                version_info: p.version_info,
                supplier: p.supplier,
                download_location: p.download_location,
                license_concluded: p.license_concluded,
                license_declared: p.license_declared,
                primary_package_purpose: p.primary_package_purpose,
                checksums: p.checksums,
                external_refs: p.external_refs,
                extra: p.extra,
            })
            .collect(),
        relationships: draft.relationships,
        extra: draft.extra,
        serialization: Serialization::TagValue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::read_tag_value;

    #[test]
    fn parses_minimal_json() {
        let doc = parse_json_2_3(serde_json::json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "app-1.0.0",
            "dataLicense": "CC0-1.0",
            "documentDescribes": ["SPDXRef-app"],
            "packages": [
                {"SPDXID": "SPDXRef-app", "name": "app", "versionInfo": "1.0.0",
                 "primaryPackagePurpose": "APPLICATION"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-app", "relationshipType": "DEPENDS_ON",
                 "relatedSpdxElement": "SPDXRef-lib"}
            ]
        }))
        .unwrap();

        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.document_describes, vec!["SPDXRef-app"]);
        assert_eq!(
            doc.packages[0].primary_package_purpose.as_deref(),
            Some("APPLICATION")
        );
    }

    #[test]
    fn tag_value_packages_and_relationships() {
        let text = "\
SPDXVersion: SPDX-2.2
DataLicense: CC0-1.0
SPDXID: SPDXRef-DOCUMENT
DocumentName: app-1.0.0
PackageName: app
SPDXID: SPDXRef-app
PackageVersion: 1.0.0
PackageSupplier: Organization: Example Corp
PackageChecksum: SHA256: abc123
ExternalRef: PACKAGE-MANAGER purl pkg:cargo/app@1.0.0
PackageName: lib
SPDXID: SPDXRef-lib
PackageVersion: 2.0.0
Relationship: SPDXRef-app DEPENDS_ON SPDXRef-lib
Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-app
";
        let doc = parse_tag_value_2_2(&read_tag_value(text));

        assert_eq!(doc.spdxid.as_deref(), Some("SPDXRef-DOCUMENT"));
        assert_eq!(doc.packages.len(), 2);
        assert_eq!(doc.packages[0].spdxid.as_deref(), Some("SPDXRef-app"));
        assert_eq!(
            doc.packages[0].supplier.as_deref(),
            Some("Organization: Example Corp")
        );
        assert_eq!(doc.packages[0].checksums[0].algorithm, "SHA256");
        assert_eq!(
            doc.packages[0].external_refs[0].reference_locator,
            "pkg:cargo/app@1.0.0"
        );
        assert_eq!(doc.relationships.len(), 2);
        assert_eq!(doc.serialization, Serialization::TagValue);
    }

    #[test]
    fn purpose_only_lands_on_2_3() {
        let text = "\
SPDXVersion: SPDX-2.3
PackageName: app
SPDXID: SPDXRef-app
PrimaryPackagePurpose: APPLICATION
";
        let doc = parse_tag_value_2_3(&read_tag_value(text));
        assert_eq!(
            doc.packages[0].primary_package_purpose.as_deref(),
            Some("APPLICATION")
        );
    }
}
