/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Drives every fixture under `conformance/` through the SigV4 implementation and compares each
//! derived artifact byte-for-byte against its expected file.

use kms_sigv4_signer::canonical;
use kms_sigv4_signer::conformance;
use std::path::Path;

#[test]
fn aws_sig_v4_corpus_matches_expected_artifacts() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("conformance");
    let cases = conformance::discover(&root, None).expect("corpus discovery");
    assert!(!cases.is_empty(), "expected at least one conformance case");

    for case in &cases {
        let request = case.build_request().unwrap_or_else(|e| {
            panic!("{}: failed to build request: {e}", case.name)
        });

        let canonical = canonical::get_canonical(&request).unwrap();
        assert_eq!(
            case.expected_canonical().unwrap().trim_end(),
            canonical.to_string_lossy().trim_end(),
            "{}: canonical request mismatch",
            case.name
        );

        let sts = canonical::get_string_to_sign(&request).unwrap();
        assert_eq!(
            case.expected_sts().unwrap().trim_end(),
            sts.to_string_lossy().trim_end(),
            "{}: string-to-sign mismatch",
            case.name
        );

        let signature = canonical::get_signature(&request).unwrap();
        assert_eq!(
            case.expected_authz().unwrap().trim_end(),
            signature.to_string_lossy().trim_end(),
            "{}: authorization header mismatch",
            case.name
        );

        let signed = canonical::get_signed(&request).unwrap();
        assert_eq!(
            case.expected_signed().unwrap().trim_end(),
            signed.to_string_lossy().trim_end(),
            "{}: signed request mismatch",
            case.name
        );
    }
}

#[test]
fn post_sts_token_is_skipped_by_default() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("conformance");
    let cases = conformance::discover(&root, None).expect("corpus discovery");
    assert!(!cases.iter().any(|c| c.name == "post-sts-token"));
}
