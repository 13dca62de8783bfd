//! Ingestion pipeline: the stage machine that ties detection, validation,
//! parsing, normalization, deduplication, and storage together.
//!
//! Stages run strictly forward. Hard errors stop the pipeline at the failing
//! stage; error-severity findings let processing continue best-effort so the
//! result still carries the normalized document and every finding, but the
//! upload is rejected and nothing is stored.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::config::{IngestLimits, NormalizeOptions};
use crate::detect;
use crate::error::{DetectionError, NormalizeError, ParseError, StorageError};
use crate::formats::FormatHint;
use crate::model::{ContentHash, Document};
use crate::normalize;
use crate::parsers;
use crate::report::ValidationReport;
use crate::validate;

/// Where a stored blob ended up, as named by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRef(String);

impl StorageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Content-addressed blob storage collaborator.
///
/// `put` must be idempotent: storing the same hash twice returns the same
/// reference. The pipeline treats every error as final; retries belong to
/// the implementation.
pub trait BlobStore {
    /// Store raw document bytes under their content hash.
    fn put(&self, hash: &ContentHash, bytes: &[u8]) -> Result<StorageRef, StorageError>;

    /// Whether a blob with this hash is already stored.
    fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Fetch stored bytes, `None` when absent.
    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>, StorageError>;
}

/// In-memory store for tests and embedding without a persistence layer.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, hash: &ContentHash, bytes: &[u8]) -> Result<StorageRef, StorageError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::new("blob store mutex poisoned"))?;
        blobs.insert(hash.as_str().to_string(), bytes.to_vec());
        Ok(StorageRef::new(format!("mem://{hash}")))
    }

    fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::new("blob store mutex poisoned"))?;
        Ok(blobs.contains_key(hash.as_str()))
    }

    fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>, StorageError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::new("blob store mutex poisoned"))?;
        Ok(blobs.get(hash.as_str()).cloned())
    }
}

/// The stage an ingestion reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Received,
    Detected,
    Validated,
    Parsed,
    Normalized,
    Deduped,
    Stored,
    Rejected,
}

/// Why an upload was rejected.
#[derive(Debug)]
pub enum RejectReason {
    Detection(DetectionError),
    Parse(ParseError),
    Normalize(NormalizeError),
    Storage(StorageError),
    /// Normalization completed but the report carries error findings.
    ValidationFailed { errors: usize },
}

/// Terminal outcome of one ingestion.
#[derive(Debug)]
pub enum IngestOutcome {
    Stored {
        storage_ref: StorageRef,
        /// True when the content hash was already present in the store.
        duplicate: bool,
    },
    Rejected(RejectReason),
}

/// Everything one ingestion produced, whatever the outcome.
#[derive(Debug)]
pub struct IngestResult {
    pub state: IngestState,
    pub outcome: IngestOutcome,
    /// Present from the Normalized stage onward, rejections included.
    pub document: Option<Document>,
    pub content_hash: Option<ContentHash>,
    pub report: ValidationReport,
}

impl IngestResult {
    fn rejected(reason: RejectReason, report: ValidationReport) -> Self {
        Self {
            state: IngestState::Rejected,
            outcome: IngestOutcome::Rejected(reason),
            document: None,
            content_hash: None,
            report,
        }
    }
}

/// The ingestion engine. Stateless apart from its collaborators; one
/// instance serves any number of uploads.
#[derive(Debug)]
pub struct IngestPipeline<S: BlobStore> {
    store: S,
    limits: IngestLimits,
    options: NormalizeOptions,
}

impl<S: BlobStore> IngestPipeline<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            limits: IngestLimits::default(),
            options: NormalizeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: IngestLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying blob store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one upload through the full pipeline.
    pub fn ingest(&self, bytes: &[u8], hint: Option<&FormatHint>) -> IngestResult {
        let mut report = ValidationReport::new();
        debug!(bytes = bytes.len(), "received document");

        // Size is checked before anything touches the bytes.
        if bytes.len() > self.limits.max_document_bytes {
            let reason = RejectReason::Parse(ParseError::TooLarge {
                actual: bytes.len(),
                limit: self.limits.max_document_bytes,
                unit: "bytes",
            });
            warn!(bytes = bytes.len(), "rejected oversized document");
            return IngestResult::rejected(reason, report);
        }

        let detection = match detect::detect(bytes, hint) {
            Ok(detection) => detection,
            Err(err) => {
                warn!(error = %err, "detection failed");
                return IngestResult::rejected(RejectReason::Detection(err), report);
            }
        };
        for finding in detection.warnings {
            report.push(finding);
        }
        let spec = detection.spec;
        debug!(format = %spec, "detected");

        let raw = match parsers::read_raw(spec, bytes) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "raw parse failed");
                return IngestResult::rejected(RejectReason::Parse(err), report);
            }
        };

        report.merge(validate::validate(spec, &raw));

        let tree = match parsers::parse(spec, raw) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(error = %err, "typed parse failed");
                return IngestResult::rejected(RejectReason::Parse(err), report);
            }
        };

        for (actual, limit, unit) in [
            (tree.component_count(), self.limits.max_components, "components"),
            (
                tree.relationship_count(),
                self.limits.max_relationships,
                "relationships",
            ),
        ] {
            if actual > limit {
                let reason = RejectReason::Parse(ParseError::TooLarge { actual, limit, unit });
                warn!(actual, limit, unit, "rejected oversized document");
                return IngestResult::rejected(reason, report);
            }
        }

        let (document, normalize_report) = match normalize::normalize(tree, &self.options) {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %err, "normalization failed");
                return IngestResult::rejected(RejectReason::Normalize(err), report);
            }
        };
        report.merge(normalize_report);
        let content_hash = document.content_hash.clone();

        // Error findings reject the upload, but the normalized document and
        // the full report are still returned for diagnosis.
        if !report.is_valid() {
            let errors = report.error_count();
            info!(errors, content_hash = %content_hash, "rejected invalid document");
            return IngestResult {
                state: IngestState::Rejected,
                outcome: IngestOutcome::Rejected(RejectReason::ValidationFailed { errors }),
                document: Some(document),
                content_hash: Some(content_hash),
                report,
            };
        }

        let duplicate = match self.store.exists(&content_hash) {
            Ok(duplicate) => duplicate,
            Err(err) => {
                warn!(error = %err, "storage lookup failed");
                return IngestResult {
                    state: IngestState::Rejected,
                    outcome: IngestOutcome::Rejected(RejectReason::Storage(err)),
                    document: Some(document),
                    content_hash: Some(content_hash),
                    report,
                };
            }
        };

        let storage_ref = match self.store.put(&content_hash, bytes) {
            Ok(storage_ref) => storage_ref,
            Err(err) => {
                warn!(error = %err, "storage write failed");
                return IngestResult {
                    state: IngestState::Rejected,
                    outcome: IngestOutcome::Rejected(RejectReason::Storage(err)),
                    document: Some(document),
                    content_hash: Some(content_hash),
                    report,
                };
            }
        };

        info!(
            content_hash = %content_hash,
            duplicate,
            warnings = report.warning_count(),
            "stored document"
        );
        IngestResult {
            state: IngestState::Stored,
            outcome: IngestOutcome::Stored {
                storage_ref,
                duplicate,
            },
            document: Some(document),
            content_hash: Some(content_hash),
            report,
        }
    }
}
