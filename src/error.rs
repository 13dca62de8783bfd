//! Error types for the ingestion engine.
//!
//! Stage-local recoverable issues are never represented here; they become
//! [`Finding`](crate::report::Finding)s in the accumulated
//! [`ValidationReport`](crate::report::ValidationReport). The types in this
//! module cover structural failures that make further processing meaningless.

use thiserror::Error;

/// Errors from format detection.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DetectionError {
    /// The input is structured text, but carries no CycloneDX or SPDX
    /// discriminator.
    #[error("no CycloneDX or SPDX discriminator found in document")]
    Unrecognized,

    /// The input is not parseable as any supported serialization.
    #[error("input is not parseable as JSON or SPDX tag-value: {0}")]
    Malformed(String),
}

/// Errors from the per-version parsers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// Malformed JSON or tag-value syntax.
    #[error("{format} syntax error: {message}")]
    Syntax { format: String, message: String },

    /// The document does not carry the discriminators the detected
    /// [`FormatSpec`](crate::formats::FormatSpec) requires.
    #[error("document does not match detected format {expected}: {message}")]
    SchemaMismatch { expected: String, message: String },

    /// A configured resource limit was exceeded.
    #[error("document exceeds limit: {actual} {unit} > {limit} {unit}")]
    TooLarge {
        actual: usize,
        limit: usize,
        unit: &'static str,
    },
}

/// Errors from normalization.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NormalizeError {
    /// No resolvable subject component; even a partial Document would be
    /// meaningless without one.
    #[error("no resolvable subject component in document")]
    NoSubject,
}

/// Opaque failure surfaced from the blob-store collaborator.
///
/// The engine never retries storage failures; retry policy belongs to the
/// caller that owns persistence.
#[derive(Error, Debug)]
#[error("storage operation failed: {message}")]
pub struct StorageError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a storage error from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Unified error type for callers that want a single variant set.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IngestError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
