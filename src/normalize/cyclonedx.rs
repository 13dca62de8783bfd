//! Lowering of CycloneDX trees into the canonical draft.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::model::{
    canonical_identity, Component, ComponentHash, ComponentType, ExternalRef, ExternalRefKind,
    HashAlgorithm, LocalRef, RelationKind, Relationship,
};
use crate::parsers::cyclonedx::{Cdx15Bom, Cdx16Bom, CdxComponent, CdxDependency, CdxMetadata};
use crate::report::ValidationReport;

use super::Draft;

pub(super) fn lower_1_5(bom: Cdx15Bom) -> Result<Draft, NormalizeError> {
    lower(
        bom.metadata,
        bom.components,
        bom.dependencies,
        document_extensions(bom.serial_number, bom.version, bom.extra),
    )
}

pub(super) fn lower_1_6(bom: Cdx16Bom) -> Result<Draft, NormalizeError> {
    lower(
        bom.metadata,
        bom.components,
        bom.dependencies,
        document_extensions(bom.serial_number, bom.version, bom.extra),
    )
}

/// Document-level fields with no canonical counterpart, preserved for export.
fn document_extensions(
    serial_number: Option<String>,
    version: Option<u64>,
    extra: IndexMap<String, Value>,
) -> IndexMap<String, Value> {
    let mut extensions = IndexMap::new();
    if let Some(serial) = serial_number {
        extensions.insert("serialNumber".to_string(), Value::String(serial));
    }
    if let Some(version) = version {
        extensions.insert("version".to_string(), Value::from(version));
    }
    extensions.extend(extra);
    extensions
}

fn lower(
    metadata: Option<CdxMetadata>,
    components: Vec<CdxComponent>,
    dependencies: Vec<CdxDependency>,
    mut extensions: IndexMap<String, Value>,
) -> Result<Draft, NormalizeError> {
    let report = ValidationReport::new();

    let mut metadata = metadata.ok_or(NormalizeError::NoSubject)?;
    let subject_src = metadata.component.take().ok_or(NormalizeError::NoSubject)?;

    // The rest of metadata (timestamp, tools, vendor fields) round-trips
    // through the extension bag; the subject itself becomes a component.
    if let Ok(Value::Object(map)) = serde_json::to_value(&metadata) {
        if !map.is_empty() {
            extensions.insert("metadata".to_string(), Value::Object(map));
        }
    }

    let mut flat = Vec::new();
    let mut edges = Vec::new();
    let subject = flatten(subject_src, &mut flat, &mut edges);
    for component in components {
        flatten(component, &mut flat, &mut edges);
    }
    for dependency in dependencies {
        for target in dependency.depends_on {
            edges.push(Relationship::new(
                dependency.dependency_ref.clone(),
                RelationKind::DependsOn,
                target,
            ));
        }
    }

    // Relationship kinds CycloneDX cannot express natively travel in the
    // x-relationships extension written by the exporter.
    if let Some(Value::Array(entries)) = extensions.shift_remove("x-relationships") {
        for entry in entries {
            if let (Some(from), Some(kind), Some(to)) = (
                entry.get("ref").and_then(Value::as_str),
                entry.get("kind").and_then(Value::as_str),
                entry.get("target").and_then(Value::as_str),
            ) {
                let (kind, swap) = RelationKind::from_spdx(kind);
                let (from, to) = if swap { (to, from) } else { (from, to) };
                edges.push(Relationship::new(from, kind, to));
            }
        }
    }

    Ok(Draft {
        subject,
        components: flat,
        relationships: edges,
        extensions,
        report,
    })
}

/// Convert a component and recurse into its nesting, emitting one `Contains`
/// edge per parent-child pair. Returns the parent's reference.
fn flatten(
    mut src: CdxComponent,
    out: &mut Vec<Component>,
    edges: &mut Vec<Relationship>,
) -> LocalRef {
    let nested = std::mem::take(&mut src.components);
    let component = convert(src);
    let parent = component.local_ref.clone();
    out.push(component);

    for child in nested {
        let child_ref = flatten(child, out, edges);
        edges.push(Relationship::new(
            parent.clone(),
            RelationKind::Contains,
            child_ref,
        ));
    }
    parent
}

fn convert(src: CdxComponent) -> Component {
    let name = src.name.unwrap_or_default();
    let local_ref = match src.bom_ref {
        Some(bom_ref) => LocalRef::from(bom_ref),
        // No bom-ref declared; the identity string doubles as the reference.
        None => LocalRef::from(canonical_identity(
            src.purl.as_deref(),
            &name,
            src.version.as_deref(),
        )),
    };

    let mut component = Component::new(local_ref, name);
    component.version = src.version;
    component.component_type = src.component_type.as_deref().map(ComponentType::from_cdx);
    component.purl = src.purl;

    if let Some(supplier) = src.supplier {
        component.supplier = supplier.name;
        if !supplier.extra.is_empty() {
            if let Ok(value) = serde_json::to_value(&supplier.extra) {
                component.extensions.insert("supplier".to_string(), value);
            }
        }
    }

    for choice in src.licenses {
        if let Some(expression) = choice.expression {
            component.licenses.add_expression(&expression);
        }
        if let Some(license) = choice.license {
            if let Some(id) = license.id.or(license.name) {
                component.licenses.add(crate::model::License::new(id));
            }
        }
    }

    for hash in src.hashes {
        component.hashes.push(ComponentHash::new(
            HashAlgorithm::parse(&hash.alg),
            hash.content,
        ));
    }

    for eref in src.external_references {
        component.external_refs.push(ExternalRef::new(
            ExternalRefKind::from_cdx(&eref.reference_type),
            eref.url,
        ));
    }

    component.extensions.extend(src.extra);

    // The cpe field is an identifier, not vendor data; carry it as an
    // external reference like the SPDX side does.
    if let Some(Value::String(cpe)) = component.extensions.get("cpe") {
        let cpe = cpe.clone();
        component.extensions.shift_remove("cpe");
        component
            .external_refs
            .push(ExternalRef::new(ExternalRefKind::Cpe, cpe));
    }
    component
}
