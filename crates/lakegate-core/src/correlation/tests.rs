// crates/lakegate-core/src/correlation/tests.rs
// ============================================================================
// Module: Correlation Policy Unit Tests
// Description: Tests for correlation ID sanitization and generation.
// Purpose: Validate fail-closed handling of untrusted correlation input.
// Dependencies: lakegate-core
// ============================================================================

//! ## Overview
//! Exercises sanitization rejections and server ID uniqueness.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use super::*;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn absent_input_is_accepted_as_none() {
    assert_eq!(sanitize_client_correlation(None).unwrap(), None);
}

#[test]
fn valid_ids_are_trimmed_and_kept() {
    let result = sanitize_client_correlation(Some("  req-42:a/b.c  ")).unwrap();
    assert_eq!(result.as_deref(), Some("req-42:a/b.c"));
}

#[test]
fn empty_after_trim_is_rejected() {
    assert_eq!(sanitize_client_correlation(Some("   ")), Err(CorrelationRejection::Empty));
}

#[test]
fn overlong_ids_are_rejected() {
    let long = "x".repeat(MAX_CLIENT_CORRELATION_LEN + 1);
    assert_eq!(sanitize_client_correlation(Some(&long)), Err(CorrelationRejection::TooLong));
}

#[test]
fn control_and_non_ascii_input_is_rejected() {
    assert_eq!(
        sanitize_client_correlation(Some("id\u{7}")),
        Err(CorrelationRejection::DisallowedChar)
    );
    assert_eq!(
        sanitize_client_correlation(Some("idé")),
        Err(CorrelationRejection::DisallowedChar)
    );
    assert_eq!(
        sanitize_client_correlation(Some("id with space")),
        Err(CorrelationRejection::DisallowedChar)
    );
}

#[test]
fn generator_issues_unique_monotonic_ids() {
    let generator = CorrelationGenerator::new();
    let first = generator.issue();
    let second = generator.issue();
    assert_ne!(first, second);
    assert!(first.starts_with("lg-"));
    assert!(second > first);
}
