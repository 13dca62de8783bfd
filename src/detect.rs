//! Format detection: raw bytes in, a resolved [`FormatSpec`] out.
//!
//! Detection reads discriminator fields only; it never validates. A caller
//! hint that contradicts document content produces a warning and the hint
//! wins, matching the behavior of format-scoped upload endpoints.

use serde_json::Value;
use tracing::debug;

use crate::error::DetectionError;
use crate::formats::{
    resolve_cdx_version, resolve_spdx_version, CdxVersion, FormatFamily, FormatHint, FormatSpec,
    Serialization, SpdxVersion,
};
use crate::report::Finding;

/// A successful detection: the resolved format plus any recoverable findings
/// (hint mismatch, version fallback).
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub spec: FormatSpec,
    pub warnings: Vec<Finding>,
}

/// Discriminators found by inspecting the raw document.
#[derive(Debug)]
enum Sniffed {
    CycloneDxJson { spec_version: Option<String> },
    SpdxJson { spdx_version: Option<String> },
    SpdxTagValue { spdx_version: Option<String> },
    /// Parseable JSON with no recognized discriminator.
    UnknownJson,
    /// Line-structured text with no recognized discriminator.
    UnknownText,
}

/// Determine the format family, schema version, and serialization of `bytes`.
///
/// # Errors
///
/// [`DetectionError::Malformed`] when the bytes are not valid UTF-8 or not
/// parseable as JSON or SPDX tag-value; [`DetectionError::Unrecognized`] when
/// they parse but carry no known discriminator and no hint was given.
pub fn detect(bytes: &[u8], hint: Option<&FormatHint>) -> Result<Detection, DetectionError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DetectionError::Malformed(format!("input is not valid UTF-8: {e}")))?;

    let sniffed = sniff(text)?;
    let mut warnings = Vec::new();

    let (family, declared_version, serialization) = match &sniffed {
        Sniffed::CycloneDxJson { spec_version } => (
            Some(FormatFamily::CycloneDx),
            spec_version.clone(),
            Serialization::Json,
        ),
        Sniffed::SpdxJson { spdx_version } => (
            Some(FormatFamily::Spdx),
            spdx_version.clone(),
            Serialization::Json,
        ),
        Sniffed::SpdxTagValue { spdx_version } => (
            Some(FormatFamily::Spdx),
            spdx_version.clone(),
            Serialization::TagValue,
        ),
        Sniffed::UnknownJson => (None, None, Serialization::Json),
        Sniffed::UnknownText => (None, None, Serialization::TagValue),
    };

    let family = match (hint, family) {
        (Some(hint), Some(found)) if hint.family != found => {
            warnings.push(Finding::warning(
                "/",
                format!(
                    "declared format {} does not match document content ({}); using declared format",
                    hint.family,
                    found
                ),
            ));
            hint.family
        }
        (Some(hint), None) => {
            warnings.push(Finding::warning(
                "/",
                format!(
                    "no {} discriminator found in document; trusting declared format",
                    hint.family
                ),
            ));
            hint.family
        }
        (_, Some(found)) => found,
        (None, None) => return Err(DetectionError::Unrecognized),
    };

    // Document-declared version wins over the hint's; either may be absent.
    let declared = declared_version.or_else(|| hint.and_then(|h| h.version.clone()));

    let spec = match family {
        FormatFamily::CycloneDx => {
            let version = match declared.as_deref() {
                Some(declared) => {
                    let resolved = resolve_cdx_version(declared);
                    if let Some(msg) = resolved.fallback_warning {
                        warnings.push(Finding::warning("/specVersion", msg));
                    }
                    resolved.version
                }
                None => {
                    warnings.push(Finding::warning(
                        "/specVersion",
                        format!(
                            "no schema version declared; assuming CycloneDX {}",
                            CdxVersion::V1_6
                        ),
                    ));
                    CdxVersion::V1_6
                }
            };
            FormatSpec::CycloneDx {
                version,
                serialization,
            }
        }
        FormatFamily::Spdx => {
            let version = match declared.as_deref() {
                Some(declared) => {
                    let resolved = resolve_spdx_version(declared);
                    if let Some(msg) = resolved.fallback_warning {
                        warnings.push(Finding::warning("/spdxVersion", msg));
                    }
                    resolved.version
                }
                None => {
                    warnings.push(Finding::warning(
                        "/spdxVersion",
                        format!(
                            "no schema version declared; assuming SPDX {}",
                            SpdxVersion::V2_3
                        ),
                    ));
                    SpdxVersion::V2_3
                }
            };
            FormatSpec::Spdx {
                version,
                serialization,
            }
        }
    };

    debug!(format = %spec, warnings = warnings.len(), "detected document format");
    Ok(Detection { spec, warnings })
}

fn sniff(text: &str) -> Result<Sniffed, DetectionError> {
    let trimmed = text.trim_start();

    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| DetectionError::Malformed(format!("invalid JSON: {e}")))?;

        if let Some(bom_format) = value.get("bomFormat").and_then(Value::as_str) {
            if bom_format.eq_ignore_ascii_case("cyclonedx") {
                return Ok(Sniffed::CycloneDxJson {
                    spec_version: value
                        .get("specVersion")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }
        if let Some(spdx_version) = value.get("spdxVersion").and_then(Value::as_str) {
            return Ok(Sniffed::SpdxJson {
                spdx_version: Some(spdx_version.to_string()),
            });
        }
        // CycloneDX documents occasionally omit bomFormat; specVersion
        // together with components is accepted as a weaker discriminator.
        if value.get("specVersion").is_some()
            && (value.get("components").is_some() || value.get("metadata").is_some())
        {
            return Ok(Sniffed::CycloneDxJson {
                spec_version: value
                    .get("specVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
        return Ok(Sniffed::UnknownJson);
    }

    // Tag-value: the SPDXVersion tag must appear on some non-comment line.
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim() == "SPDXVersion" {
                return Ok(Sniffed::SpdxTagValue {
                    spdx_version: Some(value.trim().to_string()),
                });
            }
        }
    }

    if trimmed.is_empty() {
        return Err(DetectionError::Malformed("empty input".to_string()));
    }
    // Undiscriminated text stays sniffable so a caller hint can still claim
    // it; without a hint the (None, None) arm rejects it as unrecognized.
    Ok(Sniffed::UnknownText)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cyclonedx_json() {
        let doc = br#"{"bomFormat": "CycloneDX", "specVersion": "1.5"}"#;
        let detection = detect(doc, None).unwrap();
        assert_eq!(
            detection.spec,
            FormatSpec::CycloneDx {
                version: CdxVersion::V1_5,
                serialization: Serialization::Json,
            }
        );
        assert!(detection.warnings.is_empty());
    }

    #[test]
    fn detects_spdx_json() {
        let doc = br#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT"}"#;
        let detection = detect(doc, None).unwrap();
        assert_eq!(
            detection.spec,
            FormatSpec::Spdx {
                version: SpdxVersion::V2_3,
                serialization: Serialization::Json,
            }
        );
    }

    #[test]
    fn detects_spdx_tag_value() {
        let doc = b"SPDXVersion: SPDX-2.2\nDataLicense: CC0-1.0\n";
        let detection = detect(doc, None).unwrap();
        assert_eq!(
            detection.spec,
            FormatSpec::Spdx {
                version: SpdxVersion::V2_2,
                serialization: Serialization::TagValue,
            }
        );
    }

    #[test]
    fn hint_mismatch_warns_and_hint_wins() {
        let doc = br#"{"bomFormat": "CycloneDX", "specVersion": "1.6"}"#;
        let hint = FormatHint::family(FormatFamily::Spdx);
        let detection = detect(doc, Some(&hint)).unwrap();
        assert_eq!(detection.spec.family(), FormatFamily::Spdx);
        assert!(!detection.warnings.is_empty());
    }

    #[test]
    fn hinted_tag_value_without_version_header_warns_and_proceeds() {
        let doc = b"DataLicense: CC0-1.0\nDocumentName: app-1.0.0\n";
        let hint = FormatHint::family(FormatFamily::Spdx);
        let detection = detect(doc, Some(&hint)).unwrap();
        assert_eq!(
            detection.spec,
            FormatSpec::Spdx {
                version: SpdxVersion::V2_3,
                serialization: Serialization::TagValue,
            }
        );
        // One warning for the missing discriminator, one for the assumed version.
        assert_eq!(detection.warnings.len(), 2);
    }

    #[test]
    fn plain_text_without_hint_is_unrecognized() {
        let doc = b"DataLicense: CC0-1.0\n";
        assert!(matches!(
            detect(doc, None),
            Err(DetectionError::Unrecognized)
        ));
    }

    #[test]
    fn unrecognized_json_without_hint() {
        let doc = br#"{"name": "not an sbom"}"#;
        assert!(matches!(
            detect(doc, None),
            Err(DetectionError::Unrecognized)
        ));
    }

    #[test]
    fn malformed_json_is_malformed() {
        let doc = br#"{"bomFormat": "#;
        assert!(matches!(detect(doc, None), Err(DetectionError::Malformed(_))));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let doc = [0xff, 0xfe, 0x00];
        assert!(matches!(
            detect(&doc, None),
            Err(DetectionError::Malformed(_))
        ));
    }

    #[test]
    fn unsupported_version_falls_back_with_warning() {
        let doc = br#"{"bomFormat": "CycloneDX", "specVersion": "1.7"}"#;
        let detection = detect(doc, None).unwrap();
        assert_eq!(
            detection.spec,
            FormatSpec::CycloneDx {
                version: CdxVersion::V1_6,
                serialization: Serialization::Json,
            }
        );
        assert_eq!(detection.warnings.len(), 1);
    }
}
