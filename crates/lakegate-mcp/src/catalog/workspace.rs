// crates/lakegate-mcp/src/catalog/workspace.rs
// ============================================================================
// Module: Workspace Capabilities
// Description: Workspace tree browsing and notebook export.
// Purpose: Expose read-only workspace resources.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! Both capabilities are read-only resources. Notebook export returns the
//! decoded source text; the platform layer handles the transport encoding.

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
use lakegate_core::ParameterSpec;
use lakegate_core::ParameterType;
use lakegate_core::RegistryError;
use serde_json::Value;
use serde_json::json;

use super::Services;
use super::expect_str;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Workspace operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum WorkspaceOp {
    /// List workspace items.
    Items,
    /// Export a notebook's source.
    Notebook,
}

/// Handler shared by the workspace capabilities.
struct WorkspaceHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: WorkspaceOp,
}

#[async_trait]
impl CapabilityHandler for WorkspaceHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        let path = expect_str(&params, "path")?;
        match self.op {
            WorkspaceOp::Items => {
                let items = self
                    .services
                    .platform
                    .list_items(&path)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "items": items }))
            }
            WorkspaceOp::Notebook => {
                let source = self
                    .services
                    .platform
                    .export_notebook(&path)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "path": path, "source": source }))
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the workspace capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    registry.register(CapabilityDescriptor {
        name: "workspace.items".to_string(),
        kind: CapabilityKind::Resource,
        description: "Lists workspace items under a path".to_string(),
        params: vec![ParameterSpec::with_default(
            "path",
            ParameterType::String,
            json!("/"),
            "Workspace path",
        )],
        enablement: Enablement::Always,
        handler: Arc::new(WorkspaceHandler {
            services: Arc::clone(services),
            op: WorkspaceOp::Items,
        }),
    })?;
    registry.register(CapabilityDescriptor {
        name: "workspace.notebook".to_string(),
        kind: CapabilityKind::Resource,
        description: "Exports a notebook's source text".to_string(),
        params: vec![ParameterSpec::required(
            "path",
            ParameterType::String,
            "Notebook path",
        )],
        enablement: Enablement::Always,
        handler: Arc::new(WorkspaceHandler {
            services: Arc::clone(services),
            op: WorkspaceOp::Notebook,
        }),
    })?;
    Ok(())
}
