// crates/lakegate-mcp/src/telemetry.rs
// ============================================================================
// Module: Gateway Telemetry
// Description: Observability hooks for protocol methods and dispatch.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: lakegate-core
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for request counters and
//! latency histograms. It is intentionally dependency-light so deployments
//! can plug in Prometheus or OpenTelemetry without redesign. Labels carry
//! only method and outcome classifications, never request payloads.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for request histograms.
pub const LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Protocol method classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RpcMethod {
    /// JSON-RPC tools/list.
    ToolsList,
    /// JSON-RPC tools/call.
    ToolsCall,
    /// JSON-RPC resources/list.
    ResourcesList,
    /// JSON-RPC resources/read.
    ResourcesRead,
    /// JSON-RPC prompts/list.
    PromptsList,
    /// JSON-RPC prompts/get.
    PromptsGet,
    /// Invalid or malformed JSON-RPC request.
    Invalid,
    /// Unsupported JSON-RPC method.
    Other,
}

impl RpcMethod {
    /// Returns a stable label for the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::ResourcesList => "resources/list",
            Self::ResourcesRead => "resources/read",
            Self::PromptsList => "prompts/list",
            Self::PromptsGet => "prompts/get",
            Self::Invalid => "invalid",
            Self::Other => "other",
        }
    }
}

/// Protocol request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RpcOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl RpcOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// One protocol request metric event.
#[derive(Debug, Clone)]
pub struct RpcMetricEvent {
    /// Method classification.
    pub method: RpcMethod,
    /// Outcome classification.
    pub outcome: RpcOutcome,
    /// Capability name for tools/call and resources/read, when parsed.
    pub capability: Option<String>,
    /// Request handling duration in milliseconds.
    pub duration_ms: u64,
}

// ============================================================================
// SECTION: Metrics Contract
// ============================================================================

/// Metrics sink for protocol request handling.
///
/// Implementations must not block the request path.
pub trait GatewayMetrics: Send + Sync {
    /// Records one request metric event.
    fn record(&self, event: &RpcMetricEvent);
}

/// Metrics sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl GatewayMetrics for NoopMetrics {
    fn record(&self, _event: &RpcMetricEvent) {}
}
