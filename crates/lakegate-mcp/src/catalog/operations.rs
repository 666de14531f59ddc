// crates/lakegate-mcp/src/catalog/operations.rs
// ============================================================================
// Module: Operation Tracker Capabilities
// Description: Poll and await surface over tracked operations.
// Purpose: Let token-strategy clients follow long-running work.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! `operations.poll` returns the current snapshot of a tracked operation,
//! querying the backend only when the cached snapshot has gone stale.
//! `operations.await` blocks until the operation reaches a terminal state
//! or the timeout elapses; on timeout the handle stays pollable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use lakegate_core::CapabilityDescriptor;
use lakegate_core::CapabilityHandler;
use lakegate_core::CapabilityKind;
use lakegate_core::CapabilityRegistry;
use lakegate_core::Enablement;
use lakegate_core::GatewayError;
use lakegate_core::InvocationContext;
use lakegate_core::OperationId;
use lakegate_core::ParameterSpec;
use lakegate_core::ParameterType;
use lakegate_core::RegistryError;
use serde_json::Value;

use super::Services;
use super::expect_str;
use super::opt_u64;
use super::snapshot_document;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Tracker operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum TrackerOp {
    /// Return the current snapshot.
    Poll,
    /// Block until terminal or timeout.
    Await,
}

/// Handler shared by the tracker capabilities.
struct TrackerHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: TrackerOp,
}

#[async_trait]
impl CapabilityHandler for TrackerHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        let id = OperationId::new(expect_str(&params, "operation_id")?);
        let snapshot = match self.op {
            TrackerOp::Poll => self.services.tracker.poll(&id).await?,
            TrackerOp::Await => {
                let timeout_ms = opt_u64(&params, "timeout_ms");
                self.services.tracker.await_completion(&id, timeout_ms).await?
            }
        };
        snapshot_document(&snapshot)
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the tracker capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    let operation_id = || {
        ParameterSpec::required(
            "operation_id",
            ParameterType::String,
            "Gateway operation identifier",
        )
    };
    registry.register(CapabilityDescriptor {
        name: "operations.poll".to_string(),
        kind: CapabilityKind::Tool,
        description: "Returns the current snapshot of a tracked operation".to_string(),
        params: vec![operation_id()],
        enablement: Enablement::Always,
        handler: Arc::new(TrackerHandler {
            services: Arc::clone(services),
            op: TrackerOp::Poll,
        }),
    })?;
    registry.register(CapabilityDescriptor {
        name: "operations.await".to_string(),
        kind: CapabilityKind::Tool,
        description: "Blocks until a tracked operation finishes or times out".to_string(),
        params: vec![
            operation_id(),
            ParameterSpec::optional(
                "timeout_ms",
                ParameterType::Integer,
                "Wait deadline in milliseconds",
            ),
        ],
        enablement: Enablement::Always,
        handler: Arc::new(TrackerHandler {
            services: Arc::clone(services),
            op: TrackerOp::Await,
        }),
    })?;
    Ok(())
}
