//! CycloneDX validators, one per supported schema version.

use serde_json::Value;

use crate::model::expression_ids;
use crate::parsers::RawTree;
use crate::report::ValidationReport;

const REQUIRED_FIELDS: &[&str] = &["bomFormat", "specVersion", "metadata"];

const TYPES_1_5: &[&str] = &[
    "application",
    "framework",
    "library",
    "container",
    "platform",
    "operating-system",
    "device",
    "device-driver",
    "firmware",
    "file",
    "machine-learning-model",
    "data",
];

// 1.6 adds cryptographic-asset.
const TYPES_1_6: &[&str] = &[
    "application",
    "framework",
    "library",
    "container",
    "platform",
    "operating-system",
    "device",
    "device-driver",
    "firmware",
    "file",
    "machine-learning-model",
    "data",
    "cryptographic-asset",
];

const HASH_ALGS: &[&str] = &[
    "MD5",
    "SHA-1",
    "SHA-256",
    "SHA-384",
    "SHA-512",
    "SHA3-256",
    "SHA3-384",
    "SHA3-512",
    "BLAKE2b-256",
    "BLAKE2b-384",
    "BLAKE2b-512",
    "BLAKE3",
];

/// Validate as CycloneDX 1.5.
#[must_use]
pub fn validate_1_5(raw: &RawTree) -> ValidationReport {
    validate(raw, "1.5", TYPES_1_5)
}

/// Validate as CycloneDX 1.6.
#[must_use]
pub fn validate_1_6(raw: &RawTree) -> ValidationReport {
    validate(raw, "1.6", TYPES_1_6)
}

fn validate(raw: &RawTree, version: &str, component_types: &[&str]) -> ValidationReport {
    let mut report = ValidationReport::new();

    let RawTree::Json(root) = raw else {
        report.error("/", "CycloneDX documents must be JSON");
        return report;
    };
    let Some(root_obj) = root.as_object() else {
        report.error("/", "document root must be a JSON object");
        return report;
    };

    for field in REQUIRED_FIELDS {
        if !root_obj.contains_key(*field) {
            report.error(format!("/{field}"), format!("missing required field {field:?}"));
        }
    }

    if let Some(bom_format) = root_obj.get("bomFormat") {
        match bom_format.as_str() {
            Some("CycloneDX") => {}
            Some(other) => report.error(
                "/bomFormat",
                format!("bomFormat must be \"CycloneDX\", found {other:?}"),
            ),
            None => report.error("/bomFormat", "bomFormat must be a string"),
        }
    }

    if let Some(declared) = root_obj.get("specVersion").and_then(Value::as_str) {
        if declared != version {
            report.warning(
                "/specVersion",
                format!("document declares specVersion {declared:?}, validating as {version}"),
            );
        }
    }

    if let Some(metadata) = root_obj.get("metadata") {
        if !metadata.is_object() {
            report.error("/metadata", "metadata must be an object");
        } else if let Some(component) = metadata.get("component") {
            check_component(component, "/metadata/component", component_types, &mut report);
        }
    }

    match root_obj.get("components") {
        None => {}
        Some(Value::Array(components)) => {
            for (i, component) in components.iter().enumerate() {
                check_component(
                    component,
                    &format!("/components/{i}"),
                    component_types,
                    &mut report,
                );
            }
        }
        Some(_) => report.error("/components", "components must be an array"),
    }

    match root_obj.get("dependencies") {
        None => {}
        Some(Value::Array(dependencies)) => {
            for (i, dep) in dependencies.iter().enumerate() {
                if dep.get("ref").and_then(Value::as_str).is_none() {
                    report.error(
                        format!("/dependencies/{i}/ref"),
                        "dependency entry is missing its \"ref\"",
                    );
                }
            }
        }
        Some(_) => report.error("/dependencies", "dependencies must be an array"),
    }

    report
}

fn check_component(
    component: &Value,
    path: &str,
    component_types: &[&str],
    report: &mut ValidationReport,
) {
    let Some(obj) = component.as_object() else {
        report.error(path, "component must be an object");
        return;
    };

    if obj.get("name").and_then(Value::as_str).is_none() {
        report.error(format!("{path}/name"), "component is missing its name");
    }

    if let Some(ctype) = obj.get("type").and_then(Value::as_str) {
        if !component_types.contains(&ctype) {
            report.warning(
                format!("{path}/type"),
                format!("unknown component type {ctype:?}"),
            );
        }
    }

    if let Some(Value::Array(licenses)) = obj.get("licenses") {
        for (i, choice) in licenses.iter().enumerate() {
            if let Some(id) = choice
                .get("license")
                .and_then(|l| l.get("id"))
                .and_then(Value::as_str)
            {
                if spdx::license_id(id).is_none() {
                    report.warning(
                        format!("{path}/licenses/{i}/license/id"),
                        format!("license id {id:?} is not on the SPDX license list"),
                    );
                }
            }
            if let Some(expression) = choice.get("expression").and_then(Value::as_str) {
                if expression_ids(expression).is_none() {
                    report.warning(
                        format!("{path}/licenses/{i}/expression"),
                        format!("license expression {expression:?} is not valid SPDX"),
                    );
                }
            }
        }
    }

    if let Some(Value::Array(hashes)) = obj.get("hashes") {
        for (i, hash) in hashes.iter().enumerate() {
            if let Some(alg) = hash.get("alg").and_then(Value::as_str) {
                if !HASH_ALGS.contains(&alg) {
                    report.warning(
                        format!("{path}/hashes/{i}/alg"),
                        format!("unknown hash algorithm {alg:?}"),
                    );
                }
            }
        }
    }

    // Nested components validate with the same rules at their own paths.
    if let Some(Value::Array(nested)) = obj.get("components") {
        for (i, sub) in nested.iter().enumerate() {
            check_component(sub, &format!("{path}/components/{i}"), component_types, report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawTree {
        RawTree::Json(value)
    }

    #[test]
    fn complete_document_is_valid() {
        let report = validate_1_5(&raw(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "metadata": {"component": {"type": "application", "name": "app"}},
            "components": [{"type": "library", "name": "lib", "version": "1.0"}]
        })));
        assert!(report.is_valid());
        assert!(report.is_empty());
    }

    #[test]
    fn missing_required_fields_are_errors() {
        let report = validate_1_5(&raw(json!({"components": []})));
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn unknown_component_type_is_a_warning() {
        let report = validate_1_5(&raw(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "metadata": {},
            "components": [{"type": "quantum-widget", "name": "x"}]
        })));
        assert!(report.is_valid());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn cryptographic_asset_is_1_6_only() {
        let doc = json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "metadata": {},
            "components": [{"type": "cryptographic-asset", "name": "key"}]
        });
        assert_eq!(validate_1_6(&raw(doc.clone())).warning_count(), 0);
        // Same component under a 1.5 validation warns.
        assert_eq!(validate_1_5(&raw(doc)).warning_count(), 2);
    }

    #[test]
    fn off_list_license_id_warns() {
        let report = validate_1_6(&raw(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "metadata": {},
            "components": [{
                "name": "x",
                "licenses": [{"license": {"id": "Not-A-License"}}]
            }]
        })));
        assert!(report.is_valid());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn component_without_name_is_an_error() {
        let report = validate_1_6(&raw(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "metadata": {},
            "components": [{"type": "library"}]
        })));
        assert_eq!(report.error_count(), 1);
    }
}
