//! Engine configuration: resource limits and normalization options.

use serde::{Deserialize, Serialize};

/// Resource limits enforced by the pipeline.
///
/// The size limit is checked before any parsing begins; the component and
/// relationship limits are checked on the parsed tree before normalization.
/// Exceeding any of them yields [`ParseError::TooLarge`](crate::error::ParseError).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestLimits {
    /// Maximum raw document size in bytes.
    pub max_document_bytes: usize,
    /// Maximum number of declared components (nested components included).
    pub max_components: usize,
    /// Maximum number of declared relationships/dependency edges.
    pub max_relationships: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_document_bytes: 64 * 1024 * 1024,
            max_components: 100_000,
            max_relationships: 500_000,
        }
    }
}

impl IngestLimits {
    /// Override the maximum raw document size.
    #[must_use]
    pub fn with_max_document_bytes(mut self, bytes: usize) -> Self {
        self.max_document_bytes = bytes;
        self
    }

    /// Override the maximum component count.
    #[must_use]
    pub fn with_max_components(mut self, count: usize) -> Self {
        self.max_components = count;
        self
    }

    /// Override the maximum relationship count.
    #[must_use]
    pub fn with_max_relationships(mut self, count: usize) -> Self {
        self.max_relationships = count;
        self
    }
}

/// Precedence when one document declares the same component twice
/// (duplicate name+version).
///
/// Set-valued fields (licenses, hashes, external references) union under
/// either policy; only scalar fields follow the precedence rule. A warning
/// finding is emitted for every duplicate regardless of policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later occurrence's scalar fields overwrite the earlier one's.
    #[default]
    LastWins,
    /// The earlier occurrence's scalar fields are kept.
    FirstWins,
}

/// Options controlling normalization behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Duplicate-component precedence rule.
    pub duplicate_policy: DuplicatePolicy,
    /// Append NTIA minimum-elements advisory warnings to the report.
    /// Advisory only; never produces error findings.
    pub ntia_advisory: bool,
}

impl NormalizeOptions {
    /// Override the duplicate-component policy.
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Enable NTIA minimum-elements advisory findings.
    #[must_use]
    pub fn with_ntia_advisory(mut self, enabled: bool) -> Self {
        self.ntia_advisory = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_nonzero() {
        let limits = IngestLimits::default();
        assert!(limits.max_document_bytes > 0);
        assert!(limits.max_components > 0);
        assert!(limits.max_relationships > 0);
    }

    #[test]
    fn builder_overrides() {
        let limits = IngestLimits::default()
            .with_max_document_bytes(1024)
            .with_max_components(10);
        assert_eq!(limits.max_document_bytes, 1024);
        assert_eq!(limits.max_components, 10);
    }

    #[test]
    fn default_policy_is_last_wins() {
        assert_eq!(
            NormalizeOptions::default().duplicate_policy,
            DuplicatePolicy::LastWins
        );
    }
}
