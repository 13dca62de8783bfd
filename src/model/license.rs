//! License normalization.
//!
//! Uses the `spdx` crate for license-expression parsing and license-list
//! membership. Unknown license strings are accepted as free text (with a
//! warning at normalization time), never rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single normalized license identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct License {
    /// SPDX identifier when recognized, otherwise the free-text name.
    pub id: String,
    /// Whether `id` is on the SPDX license list.
    pub is_spdx: bool,
}

impl License {
    /// Create a license, classifying it against the SPDX license list.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let is_spdx = spdx::license_id(&id).is_some();
        Self { id, is_spdx }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Ordered set of licenses for one component, plus the raw source expression
/// preserved for display and lossless export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSet {
    /// Normalized identifiers, sorted and deduplicated.
    pub licenses: Vec<License>,
    /// The raw SPDX-expression string from the source, when one was declared.
    pub raw_expression: Option<String>,
}

impl LicenseSet {
    /// Empty license set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single license identifier, keeping the set sorted and unique.
    pub fn add(&mut self, license: License) {
        if !self.licenses.contains(&license) {
            self.licenses.push(license);
            self.licenses.sort();
        }
    }

    /// Add every license named in an SPDX expression and remember the raw
    /// expression. Returns `false` when the expression did not parse as
    /// valid SPDX (the whole string is then kept as one free-text license).
    pub fn add_expression(&mut self, expression: &str) -> bool {
        let trimmed = expression.trim();
        if trimmed.is_empty() || trimmed == "NOASSERTION" || trimmed == "NONE" {
            return true;
        }
        match expression_ids(trimmed) {
            Some(ids) => {
                for id in ids {
                    self.add(License::new(id));
                }
                self.raw_expression = Some(trimmed.to_string());
                true
            }
            None => {
                self.add(License::new(trimmed));
                false
            }
        }
    }

    /// Union another set into this one. Raw expression follows first-set-wins
    /// so the subject's declared expression survives merges.
    pub fn union(&mut self, other: &LicenseSet) {
        for license in &other.licenses {
            self.add(license.clone());
        }
        if self.raw_expression.is_none() {
            self.raw_expression.clone_from(&other.raw_expression);
        }
    }

    /// True when no license information was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

/// Extract the license identifiers named in an SPDX expression.
///
/// Returns `None` when the expression is not valid SPDX syntax. Identifiers
/// are returned sorted and deduplicated; `LicenseRef-` and other non-list
/// items keep their literal spelling.
#[must_use]
pub fn expression_ids(expression: &str) -> Option<Vec<String>> {
    let parsed = spdx::Expression::parse_mode(expression, spdx::ParseMode::LAX).ok()?;
    let mut ids: Vec<String> = parsed
        .requirements()
        .map(|req| req.req.license.to_string())
        .collect();
    ids.sort();
    ids.dedup();
    Some(ids)
}
