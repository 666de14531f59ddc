// crates/lakegate-config/src/lib.rs
// ============================================================================
// Module: Lakegate Config
// Description: Configuration loading and validation for Lakegate.
// Purpose: Provide strict, fail-closed TOML configuration for the gateway.
// Dependencies: lakegate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Lakegate Config parses and validates the gateway's TOML configuration.
//! Every section has bounded defaults; any out-of-range or unknown setting
//! fails closed before the gateway starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

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

pub use config::CapabilitiesConfig;
pub use config::ConfigError;
pub use config::GatewayConfig;
pub use config::OperationsConfig;
pub use config::PlatformConfig;
pub use config::RateLimitConfig;
pub use config::RedactionConfig;
pub use config::ServerConfig;
pub use config::Transport;
pub use config::WaitStrategy;
