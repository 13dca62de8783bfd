//! Canonical, format-agnostic representation of an ingested SBOM.
//!
//! Every supported input format normalizes into these structures. A
//! [`Document`] is created only by the normalizer, is immutable once
//! produced, and is handed off by value to the caller.

mod component;
mod document;
mod identifiers;
mod license;

pub use component::*;
pub use document::*;
pub use identifiers::*;
pub use license::*;
