//! SPDX validators, one per supported schema version, covering both the
//! JSON and tag-value raw forms.

use serde_json::Value;

use crate::model::expression_ids;
use crate::parsers::{RawTree, TagValuePair};
use crate::report::ValidationReport;

const RELATIONSHIP_TYPES: &[&str] = &[
    "DESCRIBES",
    "DESCRIBED_BY",
    "CONTAINS",
    "CONTAINED_BY",
    "DEPENDS_ON",
    "DEPENDENCY_OF",
    "DEPENDENCY_MANIFEST_OF",
    "BUILD_DEPENDENCY_OF",
    "DEV_DEPENDENCY_OF",
    "OPTIONAL_DEPENDENCY_OF",
    "PROVIDED_DEPENDENCY_OF",
    "TEST_DEPENDENCY_OF",
    "RUNTIME_DEPENDENCY_OF",
    "GENERATES",
    "GENERATED_FROM",
    "ANCESTOR_OF",
    "DESCENDANT_OF",
    "VARIANT_OF",
    "DISTRIBUTION_ARTIFACT",
    "PATCH_FOR",
    "PATCH_APPLIED",
    "COPY_OF",
    "FILE_ADDED",
    "FILE_DELETED",
    "FILE_MODIFIED",
    "EXPANDED_FROM_ARCHIVE",
    "DYNAMIC_LINK",
    "STATIC_LINK",
    "DATA_FILE_OF",
    "TEST_CASE_OF",
    "BUILD_TOOL_OF",
    "DEV_TOOL_OF",
    "TEST_OF",
    "TEST_TOOL_OF",
    "DOCUMENTATION_OF",
    "OPTIONAL_COMPONENT_OF",
    "METAFILE_OF",
    "PACKAGE_OF",
    "AMENDS",
    "PREREQUISITE_FOR",
    "HAS_PREREQUISITE",
    "REQUIREMENT_DESCRIPTION_FOR",
    "SPECIFICATION_FOR",
    "OTHER",
];

const PURPOSES_2_3: &[&str] = &[
    "APPLICATION",
    "FRAMEWORK",
    "LIBRARY",
    "CONTAINER",
    "OPERATING-SYSTEM",
    "DEVICE",
    "FIRMWARE",
    "SOURCE",
    "ARCHIVE",
    "FILE",
    "INSTALL",
    "OTHER",
];

/// Validate as SPDX 2.2.
#[must_use]
pub fn validate_2_2(raw: &RawTree) -> ValidationReport {
    validate(raw, "2.2")
}

/// Validate as SPDX 2.3.
#[must_use]
pub fn validate_2_3(raw: &RawTree) -> ValidationReport {
    validate(raw, "2.3")
}

fn validate(raw: &RawTree, version: &str) -> ValidationReport {
    match raw {
        RawTree::Json(root) => validate_json(root, version),
        RawTree::TagValue(pairs) => validate_tag_value(pairs, version),
    }
}

fn check_license_value(value: &str, path: &str, report: &mut ValidationReport) {
    if value == "NOASSERTION" || value == "NONE" {
        return;
    }
    if expression_ids(value).is_none() {
        report.warning(
            path,
            format!("license value {value:?} is not a valid SPDX expression"),
        );
    }
}

fn check_relationship_type(value: &str, path: &str, report: &mut ValidationReport) {
    if !RELATIONSHIP_TYPES.contains(&value) {
        report.warning(path, format!("unknown relationship type {value:?}"));
    }
}

fn check_purpose(value: &str, version: &str, path: &str, report: &mut ValidationReport) {
    if version == "2.2" {
        report.warning(
            path,
            "primaryPackagePurpose is an SPDX 2.3 field, not valid in 2.2",
        );
    } else if !PURPOSES_2_3.contains(&value) {
        report.warning(path, format!("unknown package purpose {value:?}"));
    }
}

fn validate_json(root: &Value, version: &str) -> ValidationReport {
    let mut report = ValidationReport::new();

    let Some(obj) = root.as_object() else {
        report.error("/", "document root must be a JSON object");
        return report;
    };

    for (field, path) in [
        ("spdxVersion", "/spdxVersion"),
        ("SPDXID", "/SPDXID"),
        ("name", "/name"),
        ("dataLicense", "/dataLicense"),
    ] {
        if obj.get(field).and_then(Value::as_str).is_none() {
            report.error(path, format!("missing required field {field:?}"));
        }
    }

    if let Some(license) = obj.get("dataLicense").and_then(Value::as_str) {
        if license != "CC0-1.0" {
            report.warning(
                "/dataLicense",
                format!("dataLicense should be \"CC0-1.0\", found {license:?}"),
            );
        }
    }

    if let Some(declared) = obj.get("spdxVersion").and_then(Value::as_str) {
        let stripped = declared.strip_prefix("SPDX-").unwrap_or(declared);
        if stripped != version {
            report.warning(
                "/spdxVersion",
                format!("document declares {declared:?}, validating as SPDX {version}"),
            );
        }
    }

    match obj.get("packages") {
        None => {}
        Some(Value::Array(packages)) => {
            for (i, package) in packages.iter().enumerate() {
                let path = format!("/packages/{i}");
                let Some(pkg) = package.as_object() else {
                    report.error(&path, "package must be an object");
                    continue;
                };
                if pkg.get("name").and_then(Value::as_str).is_none() {
                    report.error(format!("{path}/name"), "package is missing its name");
                }
                if pkg.get("SPDXID").and_then(Value::as_str).is_none() {
                    report.error(format!("{path}/SPDXID"), "package is missing its SPDXID");
                }
                for field in ["licenseConcluded", "licenseDeclared"] {
                    if let Some(license) = pkg.get(field).and_then(Value::as_str) {
                        check_license_value(license, &format!("{path}/{field}"), &mut report);
                    }
                }
                if let Some(purpose) = pkg.get("primaryPackagePurpose").and_then(Value::as_str) {
                    check_purpose(
                        purpose,
                        version,
                        &format!("{path}/primaryPackagePurpose"),
                        &mut report,
                    );
                }
            }
        }
        Some(_) => report.error("/packages", "packages must be an array"),
    }

    match obj.get("relationships") {
        None => {}
        Some(Value::Array(relationships)) => {
            for (i, rel) in relationships.iter().enumerate() {
                let path = format!("/relationships/{i}");
                if let Some(rtype) = rel.get("relationshipType").and_then(Value::as_str) {
                    check_relationship_type(
                        rtype,
                        &format!("{path}/relationshipType"),
                        &mut report,
                    );
                } else {
                    report.error(
                        format!("{path}/relationshipType"),
                        "relationship is missing its type",
                    );
                }
            }
        }
        Some(_) => report.error("/relationships", "relationships must be an array"),
    }

    report
}

fn validate_tag_value(pairs: &[TagValuePair], version: &str) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (tag, label) in [
        ("SPDXVersion", "SPDXVersion"),
        ("SPDXID", "SPDXID"),
        ("DocumentName", "DocumentName"),
        ("DataLicense", "DataLicense"),
    ] {
        if !pairs.iter().any(|p| p.key == tag) {
            report.error("/", format!("missing required tag {label:?}"));
        }
    }

    let mut in_package = false;
    for pair in pairs {
        let path = format!("line {}", pair.line);
        match pair.key.as_str() {
            "PackageName" => in_package = true,
            "DataLicense" => {
                if pair.value != "CC0-1.0" {
                    report.warning(
                        &path,
                        format!("DataLicense should be \"CC0-1.0\", found {:?}", pair.value),
                    );
                }
            }
            "SPDXVersion" => {
                let stripped = pair.value.strip_prefix("SPDX-").unwrap_or(&pair.value);
                if stripped != version {
                    report.warning(
                        &path,
                        format!(
                            "document declares {:?}, validating as SPDX {version}",
                            pair.value
                        ),
                    );
                }
            }
            "PackageLicenseConcluded" | "PackageLicenseDeclared" => {
                check_license_value(&pair.value, &path, &mut report);
            }
            "PrimaryPackagePurpose" => {
                check_purpose(&pair.value, version, &path, &mut report);
            }
            "Relationship" => {
                let mut parts = pair.value.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(_), Some(rtype), Some(_)) => {
                        check_relationship_type(rtype, &path, &mut report);
                    }
                    _ => report.error(
                        &path,
                        "relationship must be \"<element> <TYPE> <element>\"",
                    ),
                }
            }
            "PackageVersion" | "PackageSupplier" | "PackageChecksum" | "ExternalRef" => {
                if !in_package {
                    report.error(&path, format!("{:?} tag before any PackageName", pair.key));
                }
            }
            _ => {}
        }
    }

    report
}
