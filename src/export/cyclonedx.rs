//! CycloneDX 1.6 JSON exporter.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::model::{Component, Document, ExternalRefKind, LocalRef, RelationKind};

/// Document-level extension keys that belong to the other family and have
/// no CycloneDX spelling.
const FOREIGN_DOC_KEYS: &[&str] = &["name", "dataLicense", "documentNamespace", "creationInfo"];

/// Render a normalized document as CycloneDX 1.6 JSON.
///
/// `Contains` edges are re-nested into component trees; `DependsOn` edges
/// become the `dependencies` array; every other relationship kind is carried
/// in an `x-relationships` extension so re-import reconstructs the full graph.
#[must_use]
pub fn to_cyclonedx(doc: &Document) -> Value {
    let mut root = Map::new();
    root.insert("bomFormat".to_string(), json!("CycloneDX"));
    root.insert("specVersion".to_string(), json!("1.6"));

    let mut metadata = doc
        .extensions
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    // Children by parent, from canonical Contains edges.
    let mut children: HashMap<&LocalRef, Vec<&LocalRef>> = HashMap::new();
    let mut nested: HashSet<&LocalRef> = HashSet::new();
    for rel in &doc.relationships {
        if rel.kind == RelationKind::Contains {
            children.entry(&rel.from).or_default().push(&rel.to);
            nested.insert(&rel.to);
        }
    }

    let mut seen: HashSet<&LocalRef> = HashSet::new();
    seen.insert(&doc.subject);
    if let Some(subject) = doc.subject_component() {
        metadata.insert(
            "component".to_string(),
            render_component(subject, doc, &children, &mut seen),
        );
    }
    if !metadata.is_empty() {
        root.insert("metadata".to_string(), Value::Object(metadata));
    }

    let mut components: Vec<Value> = doc
        .components
        .iter()
        .filter(|(r, _)| **r != doc.subject && !nested.contains(r))
        .map(|(_, c)| {
            seen.insert(&c.local_ref);
            render_component(c, doc, &children, &mut seen)
        })
        .collect();
    // Components reachable only through a Contains cycle have no render
    // root; emit them at top level instead of dropping them.
    for (local_ref, component) in &doc.components {
        if seen.insert(local_ref) {
            components.push(render_component(component, doc, &children, &mut seen));
        }
    }
    if !components.is_empty() {
        root.insert("components".to_string(), Value::Array(components));
    }

    let mut depends_on: HashMap<&LocalRef, Vec<&str>> = HashMap::new();
    let mut extra_edges = Vec::new();
    for rel in &doc.relationships {
        match rel.kind {
            RelationKind::DependsOn => {
                depends_on.entry(&rel.from).or_default().push(rel.to.value());
            }
            RelationKind::Contains => {}
            _ => extra_edges.push(json!({
                "ref": rel.from.value(),
                "kind": rel.kind.as_spdx_str(),
                "target": rel.to.value(),
            })),
        }
    }
    if !depends_on.is_empty() {
        // Emit in component-map order so output is deterministic.
        let dependencies: Vec<Value> = doc
            .components
            .keys()
            .filter_map(|r| {
                depends_on.get(r).map(|targets| {
                    json!({"ref": r.value(), "dependsOn": targets})
                })
            })
            .collect();
        root.insert("dependencies".to_string(), Value::Array(dependencies));
    }
    if !extra_edges.is_empty() {
        root.insert("x-relationships".to_string(), Value::Array(extra_edges));
    }

    for (key, value) in &doc.extensions {
        if key == "metadata" || FOREIGN_DOC_KEYS.contains(&key.as_str()) {
            continue;
        }
        root.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(root)
}

fn render_component<'a>(
    component: &'a Component,
    doc: &'a Document,
    children: &HashMap<&'a LocalRef, Vec<&'a LocalRef>>,
    seen: &mut HashSet<&'a LocalRef>,
) -> Value {
    let mut obj = Map::new();
    obj.insert("bom-ref".to_string(), json!(component.local_ref.value()));
    if let Some(ctype) = &component.component_type {
        obj.insert("type".to_string(), json!(ctype.as_cdx_str()));
    }
    obj.insert("name".to_string(), json!(component.name));
    if let Some(version) = &component.version {
        obj.insert("version".to_string(), json!(version));
    }
    if let Some(supplier) = &component.supplier {
        let mut org = Map::new();
        org.insert("name".to_string(), json!(supplier));
        if let Some(Value::Object(extra)) = component.extensions.get("supplier") {
            org.extend(extra.clone());
        }
        obj.insert("supplier".to_string(), Value::Object(org));
    }
    if let Some(purl) = &component.purl {
        obj.insert("purl".to_string(), json!(purl));
    }

    if !component.licenses.is_empty() {
        obj.insert("licenses".to_string(), render_licenses(component));
    }

    if !component.hashes.is_empty() {
        let hashes: Vec<Value> = component
            .hashes
            .iter()
            .map(|h| json!({"alg": h.algorithm.as_cdx_str(), "content": h.value}))
            .collect();
        obj.insert("hashes".to_string(), Value::Array(hashes));
    }

    let mut refs = Vec::new();
    for eref in &component.external_refs {
        // CPE has a dedicated component field, not an external-reference type.
        if eref.kind == ExternalRefKind::Cpe && !obj.contains_key("cpe") {
            obj.insert("cpe".to_string(), json!(eref.url));
            continue;
        }
        refs.push(json!({"type": eref.kind.as_cdx_str(), "url": eref.url}));
    }
    if !refs.is_empty() {
        obj.insert("externalReferences".to_string(), Value::Array(refs));
    }

    for (key, value) in &component.extensions {
        if key == "supplier" {
            continue;
        }
        obj.entry(key.clone()).or_insert_with(|| value.clone());
    }

    // Re-nest contained components; the seen set breaks cycles that SPDX
    // CONTAINS edges can legally express.
    if let Some(child_refs) = children.get(&component.local_ref) {
        let mut subs = Vec::new();
        for child_ref in child_refs {
            if !seen.insert(*child_ref) {
                continue;
            }
            if let Some(child) = doc.components.get(*child_ref) {
                subs.push(render_component(child, doc, children, seen));
            }
        }
        if !subs.is_empty() {
            obj.insert("components".to_string(), Value::Array(subs));
        }
    }

    Value::Object(obj)
}

/// One expression entry when a raw expression was declared, plus plain
/// entries for ids the expression does not already cover.
fn render_licenses(component: &Component) -> Value {
    let mut entries = Vec::new();
    let covered: Vec<String> = match &component.licenses.raw_expression {
        Some(expression) => {
            entries.push(json!({"expression": expression}));
            crate::model::expression_ids(expression).unwrap_or_default()
        }
        None => Vec::new(),
    };

    for license in &component.licenses.licenses {
        if covered.contains(&license.id) {
            continue;
        }
        if license.is_spdx {
            entries.push(json!({"license": {"id": license.id}}));
        } else {
            entries.push(json!({"license": {"name": license.id}}));
        }
    }
    Value::Array(entries)
}
