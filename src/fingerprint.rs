//! Content addressing of normalized documents.
//!
//! The fingerprint is SHA-256 over a canonical JSON rendering of the
//! normalized graph. Canonical means: components keyed and sorted by their
//! format-independent identity, relationships expressed over identities and
//! sorted, object keys sorted (the default `serde_json` map is a BTreeMap).
//! Ingestion timestamp, declared format, local reference ids, and extension
//! bags are all excluded, so the same dependency graph produces the same
//! hash whether it arrived as CycloneDX or SPDX, JSON or tag-value. External
//! references participate only for the kinds both families express natively
//! (download location and CPE); family-specific kinds would make the hash
//! diverge across formats.

use std::fmt::Write as _;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::model::{Component, ContentHash, Document, ExternalRefKind};

fn canonical_component(component: &Component) -> Value {
    let mut refs: Vec<String> = component
        .external_refs
        .iter()
        .filter_map(|r| match r.kind {
            ExternalRefKind::DownloadLocation => Some(format!("download:{}", r.url)),
            ExternalRefKind::Cpe => Some(format!("cpe:{}", r.url)),
            _ => None,
        })
        .collect();
    refs.sort();

    json!({
        "identity": component.canonical_identity(),
        "name": component.name.to_lowercase(),
        "version": component.version,
        "supplier": component.supplier,
        "type": component.component_type.as_ref().map(|t| t.as_cdx_str().to_string()),
        "licenses": component
            .licenses
            .licenses
            .iter()
            .map(|l| l.id.clone())
            .collect::<Vec<_>>(),
        "hashes": component
            .hashes
            .iter()
            .map(|h| format!("{}:{}", h.algorithm.as_cdx_str(), h.value))
            .collect::<Vec<_>>(),
        "refs": refs,
    })
}

/// The canonical JSON value a document hashes to. Exposed for tests.
#[must_use]
pub fn canonical_value(doc: &Document) -> Value {
    let identity_of = |r: &crate::model::LocalRef| -> String {
        doc.components
            .get(r)
            .map_or_else(|| r.value().to_lowercase(), Component::canonical_identity)
    };

    let mut components: Vec<Value> = doc.components.values().map(canonical_component).collect();
    components.sort_by(|a, b| a["identity"].as_str().cmp(&b["identity"].as_str()));

    let mut relationships: Vec<Value> = doc
        .relationships
        .iter()
        .map(|rel| {
            json!([
                identity_of(&rel.from),
                rel.kind.as_spdx_str(),
                identity_of(&rel.to),
            ])
        })
        .collect();
    relationships.sort_by(|a, b| a.to_string().cmp(&b.to_string()));

    json!({
        "subject": identity_of(&doc.subject),
        "components": components,
        "relationships": relationships,
    })
}

/// Compute the content address of a normalized document.
#[must_use]
pub fn fingerprint(doc: &Document) -> ContentHash {
    let canonical = canonical_value(doc);
    // Default serde_json maps are BTreeMaps, so key order is already sorted.
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();

    let digest = Sha256::digest(&bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    ContentHash::new(hex)
}
