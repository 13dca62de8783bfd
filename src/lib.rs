//! **An ingestion and normalization engine for Software Bills of Materials (SBOMs).**
//!
//! `sbom-ingest` accepts raw SBOM uploads in **CycloneDX** (1.5/1.6, JSON) and
//! **SPDX** (2.2/2.3, JSON and tag-value), validates them against the declared
//! schema version, and normalizes every input into one canonical, queryable
//! [`Document`]. Normalized documents are content-addressed so byte-different
//! re-uploads of the same dependency graph deduplicate, whichever format they
//! arrived in.
//!
//! ## Pipeline
//!
//! Raw bytes flow strictly forward:
//!
//! ```text
//! bytes -> detect -> validate -> parse -> normalize -> dedup -> store
//! ```
//!
//! - **[`detect`]** determines the format family, schema version, and
//!   serialization from discriminator fields, honoring an optional caller
//!   hint.
//! - **[`validate`]** checks the raw tree against per-version schema rules,
//!   accumulating [`Finding`]s rather than failing fast: missing required
//!   fields are errors, unknown enum values and off-list licenses degrade to
//!   warnings.
//! - **[`parsers`]** deserialize into a typed tree per (family, version)
//!   pair, with unmapped fields captured in extension bags.
//! - **[`normalize`]** lowers typed trees into the canonical model:
//!   relationship directions are canonicalized, nested components flatten to
//!   `Contains` edges, duplicates merge, dangling references drop with a
//!   warning.
//! - **[`fingerprint`]** hashes the canonical graph (SHA-256), excluding
//!   source format and ingestion time, so the same graph converges to the
//!   same address across formats.
//! - **[`export`]** renders a normalized document back out as CycloneDX 1.6
//!   or SPDX 2.3 JSON; re-importing an export reproduces the content hash.
//!
//! ## Getting started
//!
//! ```no_run
//! use sbom_ingest::{IngestOutcome, IngestPipeline, MemoryBlobStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = IngestPipeline::new(MemoryBlobStore::new());
//!     let bytes = std::fs::read("path/to/sbom.json")?;
//!
//!     let result = pipeline.ingest(&bytes, None);
//!     match result.outcome {
//!         IngestOutcome::Stored { storage_ref, duplicate } => {
//!             println!("stored at {} (duplicate: {duplicate})", storage_ref.as_str());
//!         }
//!         IngestOutcome::Rejected(reason) => {
//!             eprintln!("rejected: {reason:?}");
//!             for finding in result.report.findings() {
//!                 eprintln!("  {finding}");
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Persistence is pluggable through the [`BlobStore`] trait;
//! [`MemoryBlobStore`] ships for tests and embedding.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Doc completeness: # Errors / # Panics sections are written where they
    // carry real information, not everywhere
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Lowering functions mirror whole schemas and are inherently long
    clippy::too_many_lines,
    // Variable names like `cdx`/`spdx` or `from`/`to` are clear in context
    clippy::similar_names
)]

pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod formats;
pub mod model;
pub mod normalize;
pub mod ntia;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod validate;

// Re-export the main types for convenience
pub use config::{DuplicatePolicy, IngestLimits, NormalizeOptions};
pub use detect::{detect, Detection};
pub use error::{DetectionError, IngestError, NormalizeError, ParseError, StorageError};
pub use export::{to_cyclonedx, to_spdx};
pub use fingerprint::fingerprint;
pub use formats::{CdxVersion, FormatFamily, FormatHint, FormatSpec, Serialization, SpdxVersion};
pub use model::{
    Component, ComponentHash, ComponentType, ContentHash, Document, ExternalRef, ExternalRefKind,
    HashAlgorithm, License, LicenseSet, LocalRef, RelationKind, Relationship,
};
pub use normalize::normalize;
pub use pipeline::{
    BlobStore, IngestOutcome, IngestPipeline, IngestResult, IngestState, MemoryBlobStore,
    RejectReason, StorageRef,
};
pub use report::{Finding, Severity, ValidationReport};
pub use validate::validate;
