//! Schema validation against the detected (family, version) pair.
//!
//! Validators run on the raw tree, before typed parsing, and never abort:
//! every check appends a finding and moves on, so one pass reports all
//! problems. Missing required fields are errors; unknown enum values and
//! off-list license ids are warnings so vendor extensions degrade gracefully.

mod cyclonedx;
mod spdx;

use tracing::debug;

use crate::formats::{CdxVersion, FormatSpec, SpdxVersion};
use crate::parsers::RawTree;
use crate::report::ValidationReport;

/// Validate a raw tree against the schema rules for `spec`.
#[must_use]
pub fn validate(spec: FormatSpec, raw: &RawTree) -> ValidationReport {
    let report = match spec {
        FormatSpec::CycloneDx { version, .. } => match version {
            CdxVersion::V1_5 => cyclonedx::validate_1_5(raw),
            CdxVersion::V1_6 => cyclonedx::validate_1_6(raw),
        },
        FormatSpec::Spdx { version, .. } => match version {
            SpdxVersion::V2_2 => spdx::validate_2_2(raw),
            SpdxVersion::V2_3 => spdx::validate_2_3(raw),
        },
    };
    debug!(
        format = %spec,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validated document"
    );
    report
}
