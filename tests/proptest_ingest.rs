//! Property-based tests for detection and the full pipeline.
//!
//! Ensures the engine never panics on arbitrary input: random strings,
//! JSON-like fragments, tag-value-like lines, and partial documents of both
//! families. Random input is expected to be rejected, never to crash.

use proptest::prelude::*;
use sbom_ingest::{detect, IngestPipeline, IngestState, MemoryBlobStore};

fn pipeline() -> IngestPipeline<MemoryBlobStore> {
    IngestPipeline::new(MemoryBlobStore::new())
}

proptest! {
    // 500 cases balances coverage vs speed for fuzz-style tests.
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn detect_doesnt_panic(s in "\\PC{0,2000}") {
        let _ = detect(s.as_bytes(), None);
    }

    #[test]
    fn detect_doesnt_panic_on_raw_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = detect(&bytes, None);
    }

    #[test]
    fn pipeline_doesnt_panic_and_random_input_is_rejected(s in "\\PC{0,2000}") {
        let result = pipeline().ingest(s.as_bytes(), None);
        prop_assert_eq!(result.state, IngestState::Rejected);
    }

    #[test]
    fn json_like_input_doesnt_panic(
        s in prop::string::string_regex(r#"\{[^\}]{0,500}\}"#).unwrap()
    ) {
        let _ = pipeline().ingest(s.as_bytes(), None);
    }

    #[test]
    fn tag_value_like_input_doesnt_panic(
        key in "[A-Za-z]{1,20}",
        value in "\\PC{0,100}",
    ) {
        let input = format!("{key}: {value}");
        let _ = pipeline().ingest(input.as_bytes(), None);
    }

    #[test]
    fn cyclonedx_partial_json_doesnt_panic(
        version in "1\\.[0-9]",
        name in "[a-zA-Z0-9._-]{0,40}",
    ) {
        let input = format!(
            r#"{{"bomFormat": "CycloneDX", "specVersion": "{version}", "metadata": {{"component": {{"name": "{name}"}}}}}}"#
        );
        let _ = pipeline().ingest(input.as_bytes(), None);
    }

    #[test]
    fn spdx_partial_tag_value_doesnt_panic(
        version in "SPDX-[0-9]\\.[0-9]",
        lines in proptest::collection::vec("[A-Za-z]{1,20}: \\PC{0,60}", 0..20),
    ) {
        let input = format!("SPDXVersion: {version}\n{}", lines.join("\n"));
        let _ = pipeline().ingest(input.as_bytes(), None);
    }

    #[test]
    fn stored_documents_have_stable_hashes(
        app_version in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        lib_name in "[a-z][a-z0-9-]{0,30}",
    ) {
        let doc = format!(
            r#"{{
              "bomFormat": "CycloneDX",
              "specVersion": "1.6",
              "metadata": {{"component": {{"bom-ref": "app", "type": "application",
                                           "name": "app", "version": "{app_version}"}}}},
              "components": [{{"bom-ref": "lib", "type": "library", "name": "{lib_name}"}}],
              "dependencies": [{{"ref": "app", "dependsOn": ["lib"]}}]
            }}"#
        );
        let first = pipeline().ingest(doc.as_bytes(), None);
        let second = pipeline().ingest(doc.as_bytes(), None);
        prop_assert_eq!(first.state, IngestState::Stored);
        // Ingestion time differs between the two runs; the hash must not.
        prop_assert_eq!(first.content_hash, second.content_hash);
    }
}
