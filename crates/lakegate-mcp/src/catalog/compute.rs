// crates/lakegate-mcp/src/catalog/compute.rs
// ============================================================================
// Module: Compute Capabilities
// Description: Cluster lifecycle tools and cluster state resources.
// Purpose: Expose cluster start/terminate and cluster listings.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! Cluster start and terminate are long-running: submissions go through the
//! operation tracker and answer per the configured wait strategy. Cluster
//! listings and detail are direct read-through resources.

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
use lakegate_core::OperationDomain;
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

/// Compute operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum ComputeOp {
    /// List clusters.
    Clusters,
    /// Fetch one cluster's detail.
    ClusterDetail,
    /// Start a cluster.
    StartCluster,
    /// Terminate a cluster.
    TerminateCluster,
}

/// Handler shared by every compute capability.
struct ComputeHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: ComputeOp,
}

#[async_trait]
impl CapabilityHandler for ComputeHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        match self.op {
            ComputeOp::Clusters => {
                let clusters = self
                    .services
                    .platform
                    .list_clusters()
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "clusters": clusters }))
            }
            ComputeOp::ClusterDetail => {
                let cluster_id = expect_str(&params, "cluster_id")?;
                let detail = self
                    .services
                    .platform
                    .get_cluster(&cluster_id)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                serde_json::to_value(detail).map_err(|err| GatewayError::InternalError {
                    message: format!("cluster detail serialization failed: {err}"),
                })
            }
            ComputeOp::StartCluster => {
                let cluster_id = expect_str(&params, "cluster_id")?;
                let backend_ref = self
                    .services
                    .platform
                    .start_cluster(&cluster_id)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                self.services.track_submission(OperationDomain::ClusterStart, backend_ref).await
            }
            ComputeOp::TerminateCluster => {
                let cluster_id = expect_str(&params, "cluster_id")?;
                let backend_ref = self
                    .services
                    .platform
                    .terminate_cluster(&cluster_id)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                self.services
                    .track_submission(OperationDomain::ClusterTerminate, backend_ref)
                    .await
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Builds one compute descriptor.
fn descriptor(
    services: &Arc<Services>,
    name: &str,
    kind: CapabilityKind,
    description: &str,
    params: Vec<ParameterSpec>,
    op: ComputeOp,
) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: name.to_string(),
        kind,
        description: description.to_string(),
        params,
        enablement: Enablement::Always,
        handler: Arc::new(ComputeHandler {
            services: Arc::clone(services),
            op,
        }),
    }
}

/// Registers the compute capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    let cluster_id =
        || ParameterSpec::required("cluster_id", ParameterType::String, "Cluster identifier");
    registry.register(descriptor(
        services,
        "compute.clusters",
        CapabilityKind::Resource,
        "Lists clusters in the workspace",
        Vec::new(),
        ComputeOp::Clusters,
    ))?;
    registry.register(descriptor(
        services,
        "compute.cluster_detail",
        CapabilityKind::Resource,
        "Fetches configuration and state of one cluster",
        vec![cluster_id()],
        ComputeOp::ClusterDetail,
    ))?;
    registry.register(descriptor(
        services,
        "compute.start_cluster",
        CapabilityKind::Tool,
        "Starts a terminated cluster and tracks the operation",
        vec![cluster_id()],
        ComputeOp::StartCluster,
    ))?;
    registry.register(descriptor(
        services,
        "compute.terminate_cluster",
        CapabilityKind::Tool,
        "Terminates a running cluster and tracks the operation",
        vec![cluster_id()],
        ComputeOp::TerminateCluster,
    ))?;
    Ok(())
}
