//! Normalization: typed format trees into the canonical [`Document`].
//!
//! The per-format lowering modules produce a flat draft (subject, component
//! list, relationship list, document extensions); assembly is shared and
//! handles the parts every format needs the same way: duplicate merging,
//! relationship resolution, change-detection hashes, and the content
//! fingerprint. Normalization is best-effort: recoverable problems become
//! warnings and the fields in question are dropped or defaulted, never the
//! whole document.

mod cyclonedx;
mod spdx;

use std::collections::HashMap;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::debug;

use crate::config::{DuplicatePolicy, NormalizeOptions};
use crate::error::NormalizeError;
use crate::fingerprint;
use crate::model::{Component, ContentHash, Document, LocalRef, Relationship};
use crate::ntia;
use crate::parsers::FormatTree;
use crate::report::ValidationReport;

/// Flat output of a per-format lowering pass, before shared assembly.
#[derive(Debug)]
struct Draft {
    subject: LocalRef,
    components: Vec<Component>,
    relationships: Vec<Relationship>,
    extensions: IndexMap<String, serde_json::Value>,
    report: ValidationReport,
}

/// Normalize a typed tree into a canonical document.
///
/// # Errors
///
/// [`NormalizeError::NoSubject`] when no subject component can be resolved;
/// everything else degrades to warnings in the returned report.
pub fn normalize(
    tree: FormatTree,
    options: &NormalizeOptions,
) -> Result<(Document, ValidationReport), NormalizeError> {
    let spec = tree.spec();
    let draft = match tree {
        FormatTree::Cdx15(bom) => cyclonedx::lower_1_5(bom)?,
        FormatTree::Cdx16(bom) => cyclonedx::lower_1_6(bom)?,
        FormatTree::Spdx22(doc) => spdx::lower_2_2(doc)?,
        FormatTree::Spdx23(doc) => spdx::lower_2_3(doc)?,
    };

    let Draft {
        subject,
        components,
        relationships,
        extensions,
        mut report,
    } = draft;

    let (components, aliases) =
        merge_duplicates(components, options.duplicate_policy, &mut report);
    let subject = aliases.get(&subject).cloned().unwrap_or(subject);
    let relationships = resolve_relationships(relationships, &components, &aliases, &mut report);

    let mut document = Document {
        content_hash: ContentHash::new(""),
        format: spec,
        ingested_at: Utc::now(),
        subject,
        components,
        relationships,
        extensions,
    };
    document.content_hash = fingerprint::fingerprint(&document);

    if options.ntia_advisory {
        report.merge(ntia::check_minimum_elements(&document));
    }

    debug!(
        format = %document.format,
        components = document.components.len(),
        relationships = document.relationships.len(),
        content_hash = %document.content_hash,
        "normalized document"
    );
    Ok((document, report))
}

/// Merge components that declare the same name+version twice.
///
/// Scalar fields follow the duplicate policy; set-valued fields union under
/// either policy. Returns the surviving components keyed by local reference
/// and an alias map from dropped references to their survivors, used to
/// rewrite relationship endpoints.
fn merge_duplicates(
    components: Vec<Component>,
    policy: DuplicatePolicy,
    report: &mut ValidationReport,
) -> (IndexMap<LocalRef, Component>, HashMap<LocalRef, LocalRef>) {
    let mut by_identity: HashMap<String, LocalRef> = HashMap::new();
    let mut kept: IndexMap<LocalRef, Component> = IndexMap::new();
    let mut aliases: HashMap<LocalRef, LocalRef> = HashMap::new();

    for mut component in components {
        component.update_semver();

        let identity = duplicate_key(&component);
        match by_identity.get(&identity) {
            None => {
                by_identity.insert(identity, component.local_ref.clone());
                // Two distinct identities can still share a local_ref in a
                // malformed document; the later entry wins the slot.
                if let Some(displaced) = kept.insert(component.local_ref.clone(), component) {
                    report.warning(
                        format!("component {}", displaced.local_ref),
                        format!(
                            "reference is declared by more than one distinct component; dropping {:?} version {:?}",
                            displaced.name,
                            displaced.version.as_deref().unwrap_or("")
                        ),
                    );
                }
            }
            Some(existing_ref) => {
                report.warning(
                    format!("component {}", component.local_ref),
                    format!(
                        "duplicate declaration of {:?} version {:?}; merging",
                        component.name,
                        component.version.as_deref().unwrap_or("")
                    ),
                );
                if component.local_ref != *existing_ref {
                    aliases.insert(component.local_ref.clone(), existing_ref.clone());
                }
                if let Some(survivor) = kept.get_mut(existing_ref) {
                    merge_into(survivor, component, policy);
                }
            }
        }
    }

    for component in kept.values_mut() {
        component.update_content_hash();
    }
    (kept, aliases)
}

fn duplicate_key(component: &Component) -> String {
    format!(
        "{}@{}",
        component.name.to_lowercase(),
        component.version.as_deref().unwrap_or("")
    )
}

fn merge_into(survivor: &mut Component, duplicate: Component, policy: DuplicatePolicy) {
    match policy {
        DuplicatePolicy::LastWins => {
            if duplicate.supplier.is_some() {
                survivor.supplier = duplicate.supplier;
            }
            if duplicate.component_type.is_some() {
                survivor.component_type = duplicate.component_type;
            }
            if duplicate.purl.is_some() {
                survivor.purl = duplicate.purl;
            }
            for (key, value) in duplicate.extensions {
                survivor.extensions.insert(key, value);
            }
        }
        DuplicatePolicy::FirstWins => {
            if survivor.supplier.is_none() {
                survivor.supplier = duplicate.supplier;
            }
            if survivor.component_type.is_none() {
                survivor.component_type = duplicate.component_type;
            }
            if survivor.purl.is_none() {
                survivor.purl = duplicate.purl;
            }
            for (key, value) in duplicate.extensions {
                survivor.extensions.entry(key).or_insert(value);
            }
        }
    }

    survivor.licenses.union(&duplicate.licenses);
    for hash in duplicate.hashes {
        if !survivor.hashes.contains(&hash) {
            survivor.hashes.push(hash);
        }
    }
    for eref in duplicate.external_refs {
        if !survivor.external_refs.contains(&eref) {
            survivor.external_refs.push(eref);
        }
    }
}

/// Rewrite edges through the alias map, drop edges that still point at
/// nothing (with a warning each), and drop exact duplicates and self-loops
/// produced by merging.
fn resolve_relationships(
    relationships: Vec<Relationship>,
    components: &IndexMap<LocalRef, Component>,
    aliases: &HashMap<LocalRef, LocalRef>,
    report: &mut ValidationReport,
) -> Vec<Relationship> {
    let mut resolved = Vec::with_capacity(relationships.len());

    for mut rel in relationships {
        if let Some(target) = aliases.get(&rel.from) {
            rel.from = target.clone();
        }
        if let Some(target) = aliases.get(&rel.to) {
            rel.to = target.clone();
        }

        let mut dangling = false;
        for endpoint in [&rel.from, &rel.to] {
            if !components.contains_key(endpoint) {
                report.warning(
                    format!("relationship {} -> {}", rel.from, rel.to),
                    format!("reference {endpoint:?} does not resolve to a component; edge dropped"),
                );
                dangling = true;
            }
        }
        if dangling || rel.from == rel.to || resolved.contains(&rel) {
            continue;
        }
        resolved.push(rel);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationKind;

    fn component(local_ref: &str, name: &str, version: &str) -> Component {
        let mut c = Component::new(local_ref, name);
        c.version = Some(version.to_string());
        c
    }

    #[test]
    fn duplicates_merge_with_warning_and_alias() {
        let mut report = ValidationReport::new();
        let mut first = component("a", "lib", "1.0");
        first.supplier = Some("first corp".to_string());
        let mut second = component("b", "lib", "1.0");
        second.supplier = Some("second corp".to_string());
        second.licenses.add_expression("MIT");

        let (kept, aliases) =
            merge_duplicates(vec![first, second], DuplicatePolicy::LastWins, &mut report);

        assert_eq!(kept.len(), 1);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(aliases.get(&LocalRef::from("b")), Some(&LocalRef::from("a")));
        let survivor = &kept[&LocalRef::from("a")];
        assert_eq!(survivor.supplier.as_deref(), Some("second corp"));
        assert_eq!(survivor.licenses.licenses.len(), 1);
    }

    #[test]
    fn shared_ref_across_distinct_identities_warns() {
        let mut report = ValidationReport::new();
        let (kept, aliases) = merge_duplicates(
            vec![component("a", "first", "1.0"), component("a", "second", "2.0")],
            DuplicatePolicy::LastWins,
            &mut report,
        );

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[&LocalRef::from("a")].name, "second");
        assert!(aliases.is_empty());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn first_wins_keeps_earlier_scalars() {
        let mut report = ValidationReport::new();
        let mut first = component("a", "lib", "1.0");
        first.supplier = Some("first corp".to_string());
        let mut second = component("b", "lib", "1.0");
        second.supplier = Some("second corp".to_string());

        let (kept, _) =
            merge_duplicates(vec![first, second], DuplicatePolicy::FirstWins, &mut report);
        assert_eq!(
            kept[&LocalRef::from("a")].supplier.as_deref(),
            Some("first corp")
        );
    }

    #[test]
    fn dangling_edges_are_dropped_with_warning() {
        let mut report = ValidationReport::new();
        let (kept, aliases) = merge_duplicates(
            vec![component("a", "app", "1.0")],
            DuplicatePolicy::LastWins,
            &mut report,
        );
        let edges = resolve_relationships(
            vec![Relationship::new("a", RelationKind::DependsOn, "ghost")],
            &kept,
            &aliases,
            &mut report,
        );
        assert!(edges.is_empty());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn merged_endpoints_rewrite_edges() {
        let mut report = ValidationReport::new();
        let (kept, aliases) = merge_duplicates(
            vec![
                component("app", "app", "1.0"),
                component("lib-a", "lib", "2.0"),
                component("lib-b", "lib", "2.0"),
            ],
            DuplicatePolicy::LastWins,
            &mut report,
        );
        let edges = resolve_relationships(
            vec![Relationship::new("app", RelationKind::DependsOn, "lib-b")],
            &kept,
            &aliases,
            &mut report,
        );
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, LocalRef::from("lib-a"));
    }
}
