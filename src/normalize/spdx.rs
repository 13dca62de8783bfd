//! Lowering of SPDX trees into the canonical draft.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::model::{
    canonical_identity, Component, ComponentHash, ComponentType, ExternalRef, ExternalRefKind,
    HashAlgorithm, LocalRef, RelationKind, Relationship,
};
use crate::parsers::spdx::{
    Spdx22Document, Spdx22Package, Spdx23Document, Spdx23Package, SpdxRelationship,
};
use crate::report::ValidationReport;

use super::Draft;

const DOCUMENT_REF: &str = "SPDXRef-DOCUMENT";

/// Version-independent view of one package, fed by both tree versions.
struct PkgParts {
    spdxid: Option<String>,
    name: Option<String>,
    version_info: Option<String>,
    supplier: Option<String>,
    download_location: Option<String>,
    license_concluded: Option<String>,
    license_declared: Option<String>,
    primary_package_purpose: Option<String>,
    checksums: Vec<crate::parsers::spdx::SpdxChecksum>,
    external_refs: Vec<crate::parsers::spdx::SpdxExternalRef>,
    extra: IndexMap<String, Value>,
}

impl From<Spdx22Package> for PkgParts {
    fn from(pkg: Spdx22Package) -> Self {
        Self {
            spdxid: pkg.spdxid,
            name: pkg.name,
            version_info: pkg.version_info,
            supplier: pkg.supplier,
            download_location: pkg.download_location,
            license_concluded: pkg.license_concluded,
            license_declared: pkg.license_declared,
            primary_package_purpose: None,
            checksums: pkg.checksums,
            external_refs: pkg.external_refs,
            extra: pkg.extra,
        }
    }
}

impl From<Spdx23Package> for PkgParts {
    fn from(pkg: Spdx23Package) -> Self {
        Self {
            spdxid: pkg.spdxid,
            name: pkg.name,
            version_info: pkg.version_info,
            supplier: pkg.supplier,
            download_location: pkg.download_location,
            license_concluded: pkg.license_concluded,
            license_declared: pkg.license_declared,
            primary_package_purpose: pkg.primary_package_purpose,
            checksums: pkg.checksums,
            external_refs: pkg.external_refs,
            extra: pkg.extra,
        }
    }
}

pub(super) fn lower_2_2(doc: Spdx22Document) -> Result<Draft, NormalizeError> {
    lower(
        doc.spdxid,
        doc.name,
        doc.data_license,
        doc.document_namespace,
        doc.creation_info,
        doc.document_describes,
        doc.packages.into_iter().map(PkgParts::from).collect(),
        doc.relationships,
        doc.extra,
    )
}

pub(super) fn lower_2_3(doc: Spdx23Document) -> Result<Draft, NormalizeError> {
    lower(
        doc.spdxid,
        doc.name,
        doc.data_license,
        doc.document_namespace,
        doc.creation_info,
        doc.document_describes,
        doc.packages.into_iter().map(PkgParts::from).collect(),
        doc.relationships,
        doc.extra,
    )
}

#[allow(clippy::too_many_arguments)]
fn lower(
    doc_spdxid: Option<String>,
    doc_name: Option<String>,
    data_license: Option<String>,
    document_namespace: Option<String>,
    creation_info: Option<Value>,
    document_describes: Vec<String>,
    packages: Vec<PkgParts>,
    relationships: Vec<SpdxRelationship>,
    extra: IndexMap<String, Value>,
) -> Result<Draft, NormalizeError> {
    let report = ValidationReport::new();
    let doc_ref = doc_spdxid.clone().unwrap_or_else(|| DOCUMENT_REF.to_string());

    let mut extensions = IndexMap::new();
    if let Some(name) = &doc_name {
        extensions.insert("name".to_string(), Value::String(name.clone()));
    }
    if let Some(license) = data_license {
        extensions.insert("dataLicense".to_string(), Value::String(license));
    }
    if let Some(namespace) = document_namespace {
        extensions.insert("documentNamespace".to_string(), Value::String(namespace));
    }
    if let Some(info) = creation_info {
        extensions.insert("creationInfo".to_string(), info);
    }
    extensions.extend(extra);

    let components: Vec<Component> = packages.into_iter().map(convert).collect();

    // Edges from the document element are bookkeeping, not graph edges;
    // DESCRIBES from the document names the subject.
    let mut described: Vec<LocalRef> = document_describes.into_iter().map(LocalRef::from).collect();
    let mut edges = Vec::new();
    for rel in relationships {
        let (Some(from), Some(rtype), Some(to)) = (
            rel.spdx_element_id,
            rel.relationship_type,
            rel.related_spdx_element,
        ) else {
            continue;
        };
        let (kind, swap) = RelationKind::from_spdx(&rtype);
        let (from, to) = if swap { (to, from) } else { (from, to) };

        if kind == RelationKind::Describes && from == doc_ref {
            described.push(LocalRef::from(to));
            continue;
        }
        edges.push(Relationship::new(from, kind, to));
    }

    let subject = find_subject(&described, doc_name.as_deref(), &components)
        .ok_or(NormalizeError::NoSubject)?;

    Ok(Draft {
        subject,
        components,
        relationships: edges,
        extensions,
        report,
    })
}

/// Subject discovery: the first described reference that resolves to a
/// package, then a document-name match against `name` or `name-version`.
fn find_subject(
    described: &[LocalRef],
    doc_name: Option<&str>,
    components: &[Component],
) -> Option<LocalRef> {
    for candidate in described {
        if components.iter().any(|c| &c.local_ref == candidate) {
            return Some(candidate.clone());
        }
    }

    let doc_name = doc_name?;
    components
        .iter()
        .find(|c| {
            c.name == doc_name
                || c.version
                    .as_deref()
                    .is_some_and(|v| format!("{}-{v}", c.name) == doc_name)
        })
        .map(|c| c.local_ref.clone())
}

fn convert(pkg: PkgParts) -> Component {
    let name = pkg.name.unwrap_or_default();

    let mut purl = None;
    let mut external_refs = Vec::new();
    for eref in pkg.external_refs {
        match eref.reference_type.as_str() {
            "purl" if purl.is_none() => purl = Some(eref.reference_locator),
            "cpe23Type" | "cpe22Type" => {
                external_refs.push(ExternalRef::new(ExternalRefKind::Cpe, eref.reference_locator));
            }
            other => external_refs.push(ExternalRef::new(
                ExternalRefKind::Other(other.to_string()),
                eref.reference_locator,
            )),
        }
    }

    let local_ref = match pkg.spdxid {
        Some(spdxid) => LocalRef::from(spdxid),
        None => LocalRef::from(canonical_identity(
            purl.as_deref(),
            &name,
            pkg.version_info.as_deref(),
        )),
    };

    let mut component = Component::new(local_ref, name);
    component.version = pkg.version_info;
    component.purl = purl;
    component.external_refs = external_refs;
    component.component_type = pkg
        .primary_package_purpose
        .as_deref()
        .map(ComponentType::from_spdx_purpose);

    if let Some(supplier) = pkg.supplier {
        if let Some(person) = supplier.strip_prefix("Person:") {
            component.supplier = Some(person.trim().to_string());
            component.extensions.insert(
                "supplierType".to_string(),
                Value::String("Person".to_string()),
            );
        } else if let Some(org) = supplier.strip_prefix("Organization:") {
            component.supplier = Some(org.trim().to_string());
        } else if supplier != "NOASSERTION" {
            component.supplier = Some(supplier);
        }
    }

    if let Some(location) = pkg.download_location {
        if location != "NOASSERTION" && location != "NONE" {
            component
                .external_refs
                .push(ExternalRef::new(ExternalRefKind::DownloadLocation, location));
        }
    }

    // Concluded license takes precedence; the declared string is kept
    // verbatim for export.
    match &pkg.license_concluded {
        Some(concluded) if concluded != "NOASSERTION" && concluded != "NONE" => {
            component.licenses.add_expression(concluded);
        }
        _ => {
            if let Some(declared) = &pkg.license_declared {
                component.licenses.add_expression(declared);
            }
        }
    }
    if let Some(declared) = pkg.license_declared {
        component
            .extensions
            .insert("licenseDeclared".to_string(), Value::String(declared));
    }

    for checksum in pkg.checksums {
        component.hashes.push(ComponentHash::new(
            HashAlgorithm::parse(&checksum.algorithm),
            checksum.checksum_value,
        ));
    }

    component.extensions.extend(pkg.extra);
    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::spdx::parse_json_2_3;
    use serde_json::json;

    fn fixture(describes: Value, doc_name: &str) -> Spdx23Document {
        parse_json_2_3(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": doc_name,
            "dataLicense": "CC0-1.0",
            "documentDescribes": describes,
            "packages": [
                {"SPDXID": "SPDXRef-app", "name": "app", "versionInfo": "1.0.0",
                 "supplier": "Organization: Example Corp",
                 "licenseConcluded": "MIT",
                 "primaryPackagePurpose": "APPLICATION",
                 "externalRefs": [{"referenceCategory": "PACKAGE-MANAGER",
                                    "referenceType": "purl",
                                    "referenceLocator": "pkg:cargo/app@1.0.0"}]},
                {"SPDXID": "SPDXRef-lib", "name": "lib", "versionInfo": "2.0.0"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-app", "relationshipType": "DEPENDS_ON",
                 "relatedSpdxElement": "SPDXRef-lib"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn document_describes_names_the_subject() {
        let draft = lower_2_3(fixture(json!(["SPDXRef-app"]), "unrelated")).unwrap();
        assert_eq!(draft.subject, LocalRef::from("SPDXRef-app"));
        assert_eq!(draft.components.len(), 2);
        assert_eq!(draft.relationships.len(), 1);

        let subject = &draft.components[0];
        assert_eq!(subject.supplier.as_deref(), Some("Example Corp"));
        assert_eq!(subject.purl.as_deref(), Some("pkg:cargo/app@1.0.0"));
        assert_eq!(
            subject.component_type,
            Some(ComponentType::Application)
        );
    }

    #[test]
    fn name_match_fallback_finds_subject() {
        let draft = lower_2_3(fixture(json!([]), "app-1.0.0")).unwrap();
        assert_eq!(draft.subject, LocalRef::from("SPDXRef-app"));
    }

    #[test]
    fn no_resolvable_subject_fails() {
        let doc = fixture(json!([]), "something-else");
        assert!(matches!(lower_2_3(doc), Err(NormalizeError::NoSubject)));
    }

    #[test]
    fn dependency_of_is_flipped() {
        let doc = parse_json_2_3(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "app",
            "dataLicense": "CC0-1.0",
            "documentDescribes": ["SPDXRef-app"],
            "packages": [
                {"SPDXID": "SPDXRef-app", "name": "app"},
                {"SPDXID": "SPDXRef-lib", "name": "lib"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-lib", "relationshipType": "DEPENDENCY_OF",
                 "relatedSpdxElement": "SPDXRef-app"}
            ]
        }))
        .unwrap();
        let draft = lower_2_3(doc).unwrap();
        assert_eq!(draft.relationships.len(), 1);
        let edge = &draft.relationships[0];
        assert_eq!(edge.kind, RelationKind::DependsOn);
        assert_eq!(edge.from, LocalRef::from("SPDXRef-app"));
        assert_eq!(edge.to, LocalRef::from("SPDXRef-lib"));
    }

    #[test]
    fn describes_relationship_discovers_subject() {
        let doc = parse_json_2_3(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "unrelated",
            "dataLicense": "CC0-1.0",
            "packages": [{"SPDXID": "SPDXRef-app", "name": "app"}],
            "relationships": [
                {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES",
                 "relatedSpdxElement": "SPDXRef-app"}
            ]
        }))
        .unwrap();
        let draft = lower_2_3(doc).unwrap();
        assert_eq!(draft.subject, LocalRef::from("SPDXRef-app"));
        assert!(draft.relationships.is_empty());
    }

    #[test]
    fn noassertion_fields_are_scrubbed() {
        let doc = parse_json_2_3(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "app",
            "dataLicense": "CC0-1.0",
            "documentDescribes": ["SPDXRef-app"],
            "packages": [
                {"SPDXID": "SPDXRef-app", "name": "app",
                 "supplier": "NOASSERTION",
                 "downloadLocation": "NOASSERTION",
                 "licenseConcluded": "NOASSERTION"}
            ]
        }))
        .unwrap();
        let draft = lower_2_3(doc).unwrap();
        let subject = &draft.components[0];
        assert!(subject.supplier.is_none());
        assert!(subject.external_refs.is_empty());
        assert!(subject.licenses.is_empty());
    }
}
