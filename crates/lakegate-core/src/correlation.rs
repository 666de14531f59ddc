// crates/lakegate-core/src/correlation.rs
// ============================================================================
// Module: Correlation Policy
// Description: Sanitization and generation for request correlation IDs.
// Purpose: Thread one trustworthy identifier through logs and error records.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! Client-supplied correlation identifiers are untrusted and are sanitized
//! before use; invalid input is rejected rather than repaired. The gateway
//! always issues its own server correlation identifier per request, built
//! from a boot-scoped random prefix plus a monotonic counter, so every
//! envelope and audit record is traceable even when the client sent nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted length for a client correlation identifier.
pub const MAX_CLIENT_CORRELATION_LEN: usize = 128;

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Rejection reason for an invalid client correlation identifier.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationRejection {
    /// Input was empty after trimming.
    Empty,
    /// Input exceeded [`MAX_CLIENT_CORRELATION_LEN`].
    TooLong,
    /// Input contained a character outside the allowed ASCII subset.
    DisallowedChar,
}

impl CorrelationRejection {
    /// Returns a stable label for this rejection reason.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooLong => "too_long",
            Self::DisallowedChar => "disallowed_char",
        }
    }
}

impl fmt::Display for CorrelationRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sanitizes an optional client correlation identifier.
///
/// Accepts ASCII alphanumerics plus `-`, `_`, `.`, `:` and `/` after
/// trimming; anything else is rejected rather than normalized.
///
/// # Errors
///
/// Returns [`CorrelationRejection`] when the input is present but invalid.
pub fn sanitize_client_correlation(
    input: Option<&str>,
) -> Result<Option<String>, CorrelationRejection> {
    let Some(raw) = input else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CorrelationRejection::Empty);
    }
    if trimmed.len() > MAX_CLIENT_CORRELATION_LEN {
        return Err(CorrelationRejection::TooLong);
    }
    let allowed = trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':' | '/'));
    if !allowed {
        return Err(CorrelationRejection::DisallowedChar);
    }
    Ok(Some(trimmed.to_string()))
}

// ============================================================================
// SECTION: Generation
// ============================================================================

/// Issues server correlation identifiers for the lifetime of one process.
///
/// # Invariants
/// - Identifiers are unique within a boot: random prefix + counter.
#[derive(Debug)]
pub struct CorrelationGenerator {
    /// Boot-scoped random prefix, hex encoded.
    prefix: String,
    /// Monotonic per-request counter.
    counter: AtomicU64,
}

impl CorrelationGenerator {
    /// Creates a generator with a fresh random boot prefix.
    #[must_use]
    pub fn new() -> Self {
        let seed = OsRng.next_u64();
        Self {
            prefix: format!("{seed:016x}"),
            counter: AtomicU64::new(0),
        }
    }

    /// Issues the next server correlation identifier.
    #[must_use]
    pub fn issue(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("lg-{}-{sequence:08x}", self.prefix)
    }
}

impl Default for CorrelationGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
