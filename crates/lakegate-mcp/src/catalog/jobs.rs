// crates/lakegate-mcp/src/catalog/jobs.rs
// ============================================================================
// Module: Jobs Capabilities
// Description: Job and notebook run triggering plus run status.
// Purpose: Expose run submission through the operation tracker.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! `jobs.run_now` triggers either a saved job (by id) or a one-off notebook
//! run (by path); exactly one target must be given. Submissions go through
//! the tracker under the `job_run` domain. `jobs.get_run_status` is a
//! direct status read for clients holding a backend run id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lakegate_core::BackendRef;
use lakegate_core::CapabilityDescriptor;
use lakegate_core::CapabilityHandler;
use lakegate_core::CapabilityKind;
use lakegate_core::CapabilityRegistry;
use lakegate_core::Enablement;
use lakegate_core::GatewayError;
use lakegate_core::InvocationContext;
use lakegate_core::JobRef;
use lakegate_core::OperationDomain;
use lakegate_core::ParameterSpec;
use lakegate_core::ParameterType;
use lakegate_core::RegistryError;
use serde_json::Value;
use serde_json::json;

use super::Services;
use super::expect_str;
use super::opt_str;
use super::opt_u64;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Jobs operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum JobsOp {
    /// Trigger a run.
    RunNow,
    /// Fetch run status.
    GetRunStatus,
}

/// Handler shared by the jobs capabilities.
struct JobsHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: JobsOp,
}

/// Resolves the run target from `job_id` / `notebook_path`.
///
/// Exactly one of the two must be present.
fn run_target(params: &Value) -> Result<JobRef, GatewayError> {
    let job_id = opt_u64(params, "job_id");
    let notebook_path = opt_str(params, "notebook_path");
    match (job_id, notebook_path) {
        (Some(id), None) => Ok(JobRef::JobId(id)),
        (None, Some(path)) => Ok(JobRef::NotebookPath(path)),
        _ => Err(GatewayError::InvalidParameters {
            message: "exactly one of job_id or notebook_path must be provided".to_string(),
            fields: vec!["job_id".to_string(), "notebook_path".to_string()],
        }),
    }
}

/// Converts the `params` object into the string map the backend accepts.
fn run_parameters(params: &Value) -> Result<BTreeMap<String, String>, GatewayError> {
    let Some(object) = params.get("params").and_then(Value::as_object) else {
        return Ok(BTreeMap::new());
    };
    let mut map = BTreeMap::new();
    for (key, value) in object {
        let Some(text) = value.as_str() else {
            return Err(GatewayError::InvalidParameters {
                message: "run parameter values must be strings".to_string(),
                fields: vec!["params".to_string()],
            });
        };
        map.insert(key.clone(), text.to_string());
    }
    Ok(map)
}

#[async_trait]
impl CapabilityHandler for JobsHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        match self.op {
            JobsOp::RunNow => {
                let target = run_target(&params)?;
                let run_params = run_parameters(&params)?;
                let backend_ref = self
                    .services
                    .platform
                    .trigger_run(&target, &run_params)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                self.services.track_submission(OperationDomain::JobRun, backend_ref).await
            }
            JobsOp::GetRunStatus => {
                let run_id = expect_str(&params, "run_id")?;
                let status = self
                    .services
                    .platform
                    .get_run_status(&BackendRef::new(run_id))
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                serde_json::to_value(status).map_err(|err| GatewayError::InternalError {
                    message: format!("run status serialization failed: {err}"),
                })
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the jobs capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    registry.register(CapabilityDescriptor {
        name: "jobs.run_now".to_string(),
        kind: CapabilityKind::Tool,
        description: "Triggers a saved job or a one-off notebook run".to_string(),
        params: vec![
            ParameterSpec::optional("job_id", ParameterType::Integer, "Saved job identifier"),
            ParameterSpec::optional(
                "notebook_path",
                ParameterType::String,
                "Workspace notebook path for a one-off run",
            ),
            ParameterSpec::with_default(
                "params",
                ParameterType::Object,
                json!({}),
                "String-valued run parameters",
            ),
        ],
        enablement: Enablement::Always,
        handler: Arc::new(JobsHandler {
            services: Arc::clone(services),
            op: JobsOp::RunNow,
        }),
    })?;
    registry.register(CapabilityDescriptor {
        name: "jobs.get_run_status".to_string(),
        kind: CapabilityKind::Tool,
        description: "Fetches the status of a triggered run".to_string(),
        params: vec![ParameterSpec::required(
            "run_id",
            ParameterType::String,
            "Backend run identifier",
        )],
        enablement: Enablement::Always,
        handler: Arc::new(JobsHandler {
            services: Arc::clone(services),
            op: JobsOp::GetRunStatus,
        }),
    })?;
    Ok(())
}
