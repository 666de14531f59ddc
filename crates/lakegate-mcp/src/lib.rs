// crates/lakegate-mcp/src/lib.rs
// ============================================================================
// Module: Lakegate MCP
// Description: JSON-RPC gateway server over the Lakegate capability catalog.
// Purpose: Serve tools, resources, and prompts on stdio, HTTP, and SSE.
// Dependencies: lakegate-config, lakegate-core, axum, tokio
// ============================================================================

//! ## Overview
//! Lakegate MCP assembles the capability catalog over an injected platform
//! client and serves it through JSON-RPC 2.0. The crate depends only on the
//! gateway core and configuration; the concrete REST client is injected at
//! startup, keeping transport concerns out of the protocol layer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod catalog;
pub mod server;
pub mod telemetry;

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

pub use audit::FileDispatchAudit;
pub use audit::StderrDispatchAudit;
pub use catalog::Services;
pub use catalog::build_registry;
pub use server::GatewayServer;
pub use server::GatewayServerError;
pub use server::ServerState;
pub use telemetry::GatewayMetrics;
pub use telemetry::LATENCY_BUCKETS_MS;
pub use telemetry::NoopMetrics;
pub use telemetry::RpcMethod;
pub use telemetry::RpcMetricEvent;
pub use telemetry::RpcOutcome;
