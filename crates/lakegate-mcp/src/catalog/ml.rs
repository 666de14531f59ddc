// crates/lakegate-mcp/src/catalog/ml.rs
// ============================================================================
// Module: ML Capabilities
// Description: Experiments, runs, serving endpoints, and vector search.
// Purpose: Expose the ML surface of the platform facade.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! Experiment and run browsing are resources; serving endpoint queries and
//! vector index operations are tools. Every call here is synchronous at the
//! backend, so nothing in this module goes through the operation tracker.

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
use lakegate_core::VectorDocument;
use serde_json::Value;
use serde_json::json;

use super::Services;
use super::expect_str;
use super::opt_str;
use super::opt_u64;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// ML operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum MlOp {
    /// List experiments.
    Experiments,
    /// List runs of an experiment.
    Runs,
    /// Fetch one run's detail.
    RunDetail,
    /// Query a serving endpoint.
    QueryServingEndpoint,
    /// Upsert documents into a vector index.
    UpsertVectorIndex,
    /// Query a vector index by text.
    QueryVectorIndex,
}

/// Handler shared by the ML capabilities.
struct MlHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: MlOp,
}

/// Parses the `documents` array into vector documents.
fn vector_documents(params: &Value) -> Result<Vec<VectorDocument>, GatewayError> {
    let malformed = || GatewayError::InvalidParameters {
        message: "documents must be objects with string id and text".to_string(),
        fields: vec!["documents".to_string()],
    };
    let items = params.get("documents").and_then(Value::as_array).ok_or_else(malformed)?;
    let mut docs = Vec::with_capacity(items.len());
    for item in items {
        let object = item.as_object().ok_or_else(malformed)?;
        let id = object.get("id").and_then(Value::as_str).ok_or_else(malformed)?;
        let text = object.get("text").and_then(Value::as_str).ok_or_else(malformed)?;
        docs.push(VectorDocument {
            id: id.to_string(),
            text: text.to_string(),
            metadata: object.get("metadata").cloned(),
        });
    }
    Ok(docs)
}

#[async_trait]
impl CapabilityHandler for MlHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        match self.op {
            MlOp::Experiments => {
                let experiments = self
                    .services
                    .platform
                    .list_experiments()
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "experiments": experiments }))
            }
            MlOp::Runs => {
                let experiment_id = expect_str(&params, "experiment_id")?;
                let filter = opt_str(&params, "filter");
                let runs = self
                    .services
                    .platform
                    .list_runs(&experiment_id, filter.as_deref())
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "runs": runs }))
            }
            MlOp::RunDetail => {
                let run_id = expect_str(&params, "run_id")?;
                let detail = self
                    .services
                    .platform
                    .get_run(&run_id)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                serde_json::to_value(detail).map_err(|err| GatewayError::InternalError {
                    message: format!("run detail serialization failed: {err}"),
                })
            }
            MlOp::QueryServingEndpoint => {
                let name = expect_str(&params, "name")?;
                let input = params.get("input").cloned().ok_or_else(|| {
                    GatewayError::InternalError {
                        message: "validated parameter missing: input".to_string(),
                    }
                })?;
                self.services
                    .platform
                    .query_serving_endpoint(&name, &input)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))
            }
            MlOp::UpsertVectorIndex => {
                let name = expect_str(&params, "name")?;
                let docs = vector_documents(&params)?;
                let upserted = self
                    .services
                    .platform
                    .upsert_vector_index(&name, &docs)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "upserted": upserted }))
            }
            MlOp::QueryVectorIndex => {
                let name = expect_str(&params, "name")?;
                let query = expect_str(&params, "query")?;
                let k = opt_u64(&params, "k").and_then(|k| u32::try_from(k).ok()).ok_or_else(
                    || GatewayError::InvalidParameters {
                        message: "k must be a positive 32-bit integer".to_string(),
                        fields: vec!["k".to_string()],
                    },
                )?;
                let matches = self
                    .services
                    .platform
                    .query_vector_index(&name, &query, k)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "matches": matches }))
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Builds one ML descriptor.
fn descriptor(
    services: &Arc<Services>,
    name: &str,
    kind: CapabilityKind,
    description: &str,
    params: Vec<ParameterSpec>,
    op: MlOp,
) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: name.to_string(),
        kind,
        description: description.to_string(),
        params,
        enablement: Enablement::Always,
        handler: Arc::new(MlHandler {
            services: Arc::clone(services),
            op,
        }),
    }
}

/// Registers the ML capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    registry.register(descriptor(
        services,
        "ml.experiments",
        CapabilityKind::Resource,
        "Lists tracking experiments",
        Vec::new(),
        MlOp::Experiments,
    ))?;
    registry.register(descriptor(
        services,
        "ml.runs",
        CapabilityKind::Resource,
        "Lists runs of an experiment with an optional filter",
        vec![
            ParameterSpec::required(
                "experiment_id",
                ParameterType::String,
                "Experiment identifier",
            ),
            ParameterSpec::optional("filter", ParameterType::String, "Backend filter expression"),
        ],
        MlOp::Runs,
    ))?;
    registry.register(descriptor(
        services,
        "ml.run_detail",
        CapabilityKind::Resource,
        "Fetches metrics and parameters of one run",
        vec![ParameterSpec::required("run_id", ParameterType::String, "Run identifier")],
        MlOp::RunDetail,
    ))?;
    registry.register(descriptor(
        services,
        "ml.query_serving_endpoint",
        CapabilityKind::Tool,
        "Sends input to a serving endpoint and returns its response",
        vec![
            ParameterSpec::required("name", ParameterType::String, "Serving endpoint name"),
            ParameterSpec::required("input", ParameterType::Object, "Model input document"),
        ],
        MlOp::QueryServingEndpoint,
    ))?;
    registry.register(descriptor(
        services,
        "ml.upsert_vector_index",
        CapabilityKind::Tool,
        "Upserts documents into a vector search index",
        vec![
            ParameterSpec::required("name", ParameterType::String, "Vector index name"),
            ParameterSpec::required(
                "documents",
                ParameterType::Array,
                "Documents with id, text, and optional metadata",
            ),
        ],
        MlOp::UpsertVectorIndex,
    ))?;
    registry.register(descriptor(
        services,
        "ml.query_vector_index",
        CapabilityKind::Tool,
        "Queries a vector search index by text",
        vec![
            ParameterSpec::required("name", ParameterType::String, "Vector index name"),
            ParameterSpec::required("query", ParameterType::String, "Query text"),
            ParameterSpec::with_default(
                "k",
                ParameterType::Integer,
                json!(10),
                "Number of matches to return",
            ),
        ],
        MlOp::QueryVectorIndex,
    ))?;
    Ok(())
}
