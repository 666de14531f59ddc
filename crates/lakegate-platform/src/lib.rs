// crates/lakegate-platform/src/lib.rs
// ============================================================================
// Module: Lakegate Platform
// Description: REST implementation of the Lakegate backend facade.
// Purpose: Connect the gateway core to a lakehouse workspace over HTTP.
// Dependencies: lakegate-core, base64, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Lakegate Platform implements every facade trait from `lakegate-core`
//! against the lakehouse workspace REST API. Transport failures and
//! non-success statuses are classified into [`lakegate_core::BackendFailure`]
//! shapes at this boundary; no raw platform payload crosses into the core.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::RestPlatformClient;
