//! SPDX 2.3 JSON exporter.

use serde_json::{json, Map, Value};

use crate::model::{Component, Document, ExternalRefKind, LocalRef};

/// Document-level extension keys that belong to the other family.
const FOREIGN_DOC_KEYS: &[&str] = &["metadata", "serialNumber", "version"];

/// Render a normalized document as SPDX 2.3 JSON.
///
/// Every canonical relationship kind has an SPDX spelling, so the graph
/// exports without auxiliary extensions. References that did not originate
/// from SPDX are sanitized into `SPDXRef-` form.
#[must_use]
pub fn to_spdx(doc: &Document) -> Value {
    let mut root = Map::new();
    root.insert("spdxVersion".to_string(), json!("SPDX-2.3"));
    root.insert("SPDXID".to_string(), json!("SPDXRef-DOCUMENT"));

    let name = doc
        .extensions
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| default_document_name(doc));
    root.insert("name".to_string(), json!(name));

    let data_license = doc
        .extensions
        .get("dataLicense")
        .and_then(Value::as_str)
        .unwrap_or("CC0-1.0");
    root.insert("dataLicense".to_string(), json!(data_license));

    if let Some(namespace) = doc.extensions.get("documentNamespace") {
        root.insert("documentNamespace".to_string(), namespace.clone());
    }
    let creation_info = doc
        .extensions
        .get("creationInfo")
        .cloned()
        .unwrap_or_else(|| {
            json!({
                "created": doc.ingested_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                "creators": ["Tool: sbom-ingest"],
            })
        });
    root.insert("creationInfo".to_string(), creation_info);

    root.insert(
        "documentDescribes".to_string(),
        json!([sanitize_ref(&doc.subject)]),
    );

    let packages: Vec<Value> = doc.components.values().map(render_package).collect();
    root.insert("packages".to_string(), Value::Array(packages));

    let relationships: Vec<Value> = doc
        .relationships
        .iter()
        .map(|rel| {
            json!({
                "spdxElementId": sanitize_ref(&rel.from),
                "relationshipType": rel.kind.as_spdx_str(),
                "relatedSpdxElement": sanitize_ref(&rel.to),
            })
        })
        .collect();
    if !relationships.is_empty() {
        root.insert("relationships".to_string(), Value::Array(relationships));
    }

    for (key, value) in &doc.extensions {
        if FOREIGN_DOC_KEYS.contains(&key.as_str())
            || ["name", "dataLicense", "documentNamespace", "creationInfo"]
                .contains(&key.as_str())
        {
            continue;
        }
        root.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(root)
}

fn default_document_name(doc: &Document) -> String {
    match doc.subject_component() {
        Some(subject) => match &subject.version {
            Some(version) => format!("{}-{version}", subject.name),
            None => subject.name.clone(),
        },
        None => "sbom".to_string(),
    }
}

/// Turn any local reference into a legal SPDX identifier.
fn sanitize_ref(local_ref: &LocalRef) -> String {
    let value = local_ref.value();
    if let Some(rest) = value.strip_prefix("SPDXRef-") {
        if is_idstring(rest) {
            return value.to_string();
        }
    }
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect();
    format!("SPDXRef-{cleaned}")
}

fn is_idstring(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

fn render_package(component: &Component) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "SPDXID".to_string(),
        json!(sanitize_ref(&component.local_ref)),
    );
    obj.insert("name".to_string(), json!(component.name));
    if let Some(version) = &component.version {
        obj.insert("versionInfo".to_string(), json!(version));
    }

    if let Some(supplier) = &component.supplier {
        let prefix = match component.extensions.get("supplierType").and_then(Value::as_str) {
            Some("Person") => "Person",
            _ => "Organization",
        };
        obj.insert("supplier".to_string(), json!(format!("{prefix}: {supplier}")));
    }

    if !component.licenses.is_empty() {
        let concluded = component
            .licenses
            .raw_expression
            .clone()
            .unwrap_or_else(|| {
                component
                    .licenses
                    .licenses
                    .iter()
                    .map(|l| l.id.clone())
                    .collect::<Vec<_>>()
                    .join(" AND ")
            });
        obj.insert("licenseConcluded".to_string(), json!(concluded));
    }
    if let Some(declared) = component.extensions.get("licenseDeclared") {
        obj.insert("licenseDeclared".to_string(), declared.clone());
    }

    if !component.hashes.is_empty() {
        let checksums: Vec<Value> = component
            .hashes
            .iter()
            .map(|h| {
                json!({
                    "algorithm": h.algorithm.as_spdx_str(),
                    "checksumValue": h.value,
                })
            })
            .collect();
        obj.insert("checksums".to_string(), Value::Array(checksums));
    }

    let mut external_refs = Vec::new();
    if let Some(purl) = &component.purl {
        external_refs.push(json!({
            "referenceCategory": "PACKAGE-MANAGER",
            "referenceType": "purl",
            "referenceLocator": purl,
        }));
    }
    for eref in &component.external_refs {
        match &eref.kind {
            ExternalRefKind::DownloadLocation => {
                obj.entry("downloadLocation".to_string())
                    .or_insert_with(|| json!(eref.url));
            }
            ExternalRefKind::Cpe => external_refs.push(json!({
                "referenceCategory": "SECURITY",
                "referenceType": "cpe23Type",
                "referenceLocator": eref.url,
            })),
            kind => external_refs.push(json!({
                "referenceCategory": "OTHER",
                "referenceType": kind.as_cdx_str(),
                "referenceLocator": eref.url,
            })),
        }
    }
    if !external_refs.is_empty() {
        obj.insert("externalRefs".to_string(), Value::Array(external_refs));
    }
    obj.entry("downloadLocation".to_string())
        .or_insert_with(|| json!("NOASSERTION"));

    if let Some(ctype) = &component.component_type {
        obj.insert(
            "primaryPackagePurpose".to_string(),
            json!(ctype.as_spdx_purpose()),
        );
    }

    for (key, value) in &component.extensions {
        if ["supplier", "supplierType", "licenseDeclared"].contains(&key.as_str()) {
            continue;
        }
        obj.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::formats::{FormatSpec, Serialization, SpdxVersion};
    use crate::model::{ContentHash, RelationKind, Relationship};
    use chrono::Utc;
    use indexmap::IndexMap;

    fn fixture() -> Document {
        let mut app = Component::new("SPDXRef-app", "app");
        app.version = Some("1.0.0".to_string());
        app.supplier = Some("Example Corp".to_string());
        app.licenses.add_expression("MIT");
        let lib = Component::new("SPDXRef-lib", "lib");

        let mut components = IndexMap::new();
        components.insert(app.local_ref.clone(), app);
        components.insert(lib.local_ref.clone(), lib);

        let mut doc = Document {
            content_hash: ContentHash::new(""),
            format: FormatSpec::Spdx {
                version: SpdxVersion::V2_3,
                serialization: Serialization::Json,
            },
            ingested_at: Utc::now(),
            subject: LocalRef::from("SPDXRef-app"),
            components,
            relationships: vec![Relationship::new(
                "SPDXRef-app",
                RelationKind::DependsOn,
                "SPDXRef-lib",
            )],
            extensions: IndexMap::new(),
        };
        doc.content_hash = fingerprint(&doc);
        doc
    }

    #[test]
    fn document_shape() {
        let out = to_spdx(&fixture());
        assert_eq!(out["spdxVersion"], "SPDX-2.3");
        assert_eq!(out["dataLicense"], "CC0-1.0");
        assert_eq!(out["name"], "app-1.0.0");
        assert_eq!(out["documentDescribes"][0], "SPDXRef-app");
        assert_eq!(out["packages"].as_array().unwrap().len(), 2);
        assert_eq!(out["relationships"][0]["relationshipType"], "DEPENDS_ON");
    }

    #[test]
    fn supplier_gets_organization_prefix() {
        let out = to_spdx(&fixture());
        assert_eq!(out["packages"][0]["supplier"], "Organization: Example Corp");
    }

    #[test]
    fn foreign_refs_are_sanitized() {
        let mut doc = fixture();
        let odd = Component::new("pkg:cargo/odd@1.0", "odd");
        doc.components.insert(odd.local_ref.clone(), odd);
        let out = to_spdx(&doc);
        let id = out["packages"][2]["SPDXID"].as_str().unwrap();
        assert!(id.starts_with("SPDXRef-"));
        assert!(id
            .chars()
            .skip("SPDXRef-".len())
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'));
    }

    #[test]
    fn missing_creation_info_is_synthesized() {
        let out = to_spdx(&fixture());
        assert!(out["creationInfo"]["created"].as_str().is_some());
    }
}
