//! NTIA minimum-elements advisory check.
//!
//! Verifies the per-component minimum elements (supplier, version, unique
//! identifier) over a normalized document. Advisory only: every finding is
//! a warning, and the check runs only when
//! [`NormalizeOptions::ntia_advisory`](crate::config::NormalizeOptions) is set.

use crate::model::Document;
use crate::report::ValidationReport;

/// Report which NTIA minimum elements each component is missing.
#[must_use]
pub fn check_minimum_elements(doc: &Document) -> ValidationReport {
    let mut report = ValidationReport::new();

    for component in doc.components.values() {
        let path = format!("component {}", component.local_ref);
        if component.supplier.is_none() {
            report.warning(&path, "NTIA minimum elements: supplier name is missing");
        }
        if component.version.is_none() {
            report.warning(&path, "NTIA minimum elements: version is missing");
        }
        if component.purl.is_none() && component.hashes.is_empty() {
            report.warning(
                &path,
                "NTIA minimum elements: no unique identifier (purl or checksum)",
            );
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::formats::{CdxVersion, FormatSpec, Serialization};
    use crate::model::{Component, ContentHash};
    use chrono::Utc;
    use indexmap::IndexMap;

    fn doc_with(component: Component) -> Document {
        let mut components = IndexMap::new();
        let subject = component.local_ref.clone();
        components.insert(subject.clone(), component);
        let mut doc = Document {
            content_hash: ContentHash::new(""),
            format: FormatSpec::CycloneDx {
                version: CdxVersion::V1_6,
                serialization: Serialization::Json,
            },
            ingested_at: Utc::now(),
            subject,
            components,
            relationships: Vec::new(),
            extensions: IndexMap::new(),
        };
        doc.content_hash = fingerprint(&doc);
        doc
    }

    #[test]
    fn complete_component_passes() {
        let mut c = Component::new("app", "app");
        c.version = Some("1.0.0".to_string());
        c.supplier = Some("Example Corp".to_string());
        c.purl = Some("pkg:cargo/app@1.0.0".to_string());
        let report = check_minimum_elements(&doc_with(c));
        assert!(report.is_empty());
    }

    #[test]
    fn bare_component_reports_each_missing_element() {
        let report = check_minimum_elements(&doc_with(Component::new("x", "x")));
        assert_eq!(report.warning_count(), 3);
        assert!(report.is_valid());
    }
}
