// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// sha256 of "hello\n"
const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

#[test]
fn sha256_match_passes() {
    assert!(verify_checksum("sha256", HELLO_SHA256, b"hello\n").is_ok());
}

#[test]
fn uppercase_expected_hex_is_accepted() {
    assert!(verify_checksum("sha256", &HELLO_SHA256.to_uppercase(), b"hello\n").is_ok());
}

#[test]
fn flipped_body_byte_is_a_mismatch() {
    let err = verify_checksum("sha256", HELLO_SHA256, b"hello!").unwrap_err();
    match err {
        BootstrapError::ChecksumMismatch {
            algorithm,
            expected,
            actual,
        } => {
            assert_eq!(algorithm, "sha256");
            assert_eq!(expected, HELLO_SHA256);
            assert_ne!(actual, expected);
        }
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }
}

#[test]
fn sha512_is_supported() {
    let expected = hex::encode(Sha512::digest(b"payload"));
    assert!(verify_checksum("sha512", &expected, b"payload").is_ok());
}

#[test]
fn unknown_algorithm_is_rejected() {
    assert!(matches!(
        verify_checksum("md5", "abc", b"x").unwrap_err(),
        BootstrapError::UnsupportedAlgorithm(_)
    ));
}

// ============================================================================
// Checksum file parsing
// ============================================================================

#[test]
fn parses_sha256sum_format() {
    let content = format!("{}  sink.json\n", HELLO_SHA256);
    assert_eq!(parse_checksum_file(&content).as_deref(), Some(HELLO_SHA256));
}

#[test]
fn skips_non_hex_prefix_tokens() {
    let content = format!("SHA256 (sink.json) = {}\n", HELLO_SHA256);
    assert_eq!(parse_checksum_file(&content).as_deref(), Some(HELLO_SHA256));
}

#[test]
fn lowercases_the_token() {
    let content = HELLO_SHA256.to_uppercase();
    assert_eq!(parse_checksum_file(&content).as_deref(), Some(HELLO_SHA256));
}

#[test]
fn empty_file_has_no_token() {
    assert_eq!(parse_checksum_file(""), None);
    assert_eq!(parse_checksum_file("no hex here\n"), None);
}

// ============================================================================
// Fake verifier
// ============================================================================

#[test]
fn fake_verifier_accepts_by_default() {
    let verifier = FakeVerifier::new();
    assert!(verifier.verify(b"body", b"sig", &[]).is_ok());
    assert_eq!(verifier.calls(), 1);
}

#[test]
fn fake_verifier_can_reject() {
    let verifier = FakeVerifier::new();
    verifier.reject_with("bad signature");
    assert_eq!(
        verifier.verify(b"body", b"sig", &[]).unwrap_err(),
        "bad signature"
    );
}
