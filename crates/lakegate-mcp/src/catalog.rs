// crates/lakegate-mcp/src/catalog.rs
// ============================================================================
// Module: Capability Catalog
// Description: Registration of every gateway tool, resource, and prompt.
// Purpose: Bind platform domains to the core registry and tracker.
// Dependencies: lakegate-config, lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! This module assembles the full capability catalog: compute, SQL, jobs,
//! files, ML, secrets, and workspace capabilities, plus the operation
//! tracker surface and prompt templates. Each domain registers through a
//! shared [`Services`] handle carrying the platform client, the tracker,
//! and the error mapper. Handlers receive validated parameters from the
//! dispatcher and return domain-shaped JSON documents; backend failures
//! are mapped and redacted before they leave a handler.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use lakegate_config::OperationsConfig;
use lakegate_config::WaitStrategy;
use lakegate_core::BackendRef;
use lakegate_core::CapabilityRegistry;
use lakegate_core::ErrorMapper;
use lakegate_core::FlagSet;
use lakegate_core::GatewayError;
use lakegate_core::OperationDomain;
use lakegate_core::OperationSnapshot;
use lakegate_core::OperationTracker;
use lakegate_core::PlatformClient;
use lakegate_core::RegistryError;
use serde_json::Value;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compute;
pub mod files;
pub mod jobs;
pub mod ml;
pub mod operations;
pub mod prompts;
pub mod secrets;
pub mod sql;
pub mod workspace;

// ============================================================================
// SECTION: Shared Services
// ============================================================================

/// Shared backend services handed to every capability handler.
pub struct Services {
    /// Platform facade for all backend calls.
    pub platform: Arc<dyn PlatformClient>,
    /// Tracker for long-running backend operations.
    pub tracker: Arc<OperationTracker>,
    /// Operation pacing and wait-strategy configuration.
    pub operations: OperationsConfig,
    /// Failure-to-error mapper with redaction.
    pub mapper: ErrorMapper,
}

impl Services {
    /// Maps a backend failure into a redacted gateway error.
    fn map_failure(&self, failure: &lakegate_core::BackendFailure) -> GatewayError {
        self.mapper.map(failure)
    }

    /// Registers a submitted backend operation and answers per the
    /// configured wait strategy for its domain.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when a blocking wait fails or times out.
    async fn track_submission(
        &self,
        domain: OperationDomain,
        backend_ref: BackendRef,
    ) -> Result<Value, GatewayError> {
        let id = self.tracker.submit(domain, backend_ref);
        match self.operations.strategy_for(domain.label()) {
            WaitStrategy::Token => Ok(serde_json::json!({
                "operation_id": id.as_str(),
                "state": "pending",
            })),
            WaitStrategy::Block => {
                let snapshot = self.tracker.await_completion(&id, None).await?;
                snapshot_document(&snapshot)
            }
        }
    }
}

// ============================================================================
// SECTION: Handler Helpers
// ============================================================================

/// Serializes an operation snapshot into a response document.
fn snapshot_document(snapshot: &OperationSnapshot) -> Result<Value, GatewayError> {
    serde_json::to_value(snapshot).map_err(|err| GatewayError::InternalError {
        message: format!("snapshot serialization failed: {err}"),
    })
}

/// Extracts a declared string parameter the dispatcher has validated.
fn expect_str(params: &Value, name: &str) -> Result<String, GatewayError> {
    params.get(name).and_then(Value::as_str).map(str::to_owned).ok_or_else(|| {
        GatewayError::InternalError {
            message: format!("validated parameter missing: {name}"),
        }
    })
}

/// Extracts an optional string parameter.
fn opt_str(params: &Value, name: &str) -> Option<String> {
    params.get(name).and_then(Value::as_str).map(str::to_owned)
}

/// Extracts an optional unsigned integer parameter.
fn opt_u64(params: &Value, name: &str) -> Option<u64> {
    params.get(name).and_then(Value::as_u64)
}

/// Extracts a declared boolean parameter the dispatcher has validated.
fn expect_bool(params: &Value, name: &str) -> Result<bool, GatewayError> {
    params.get(name).and_then(Value::as_bool).ok_or_else(|| GatewayError::InternalError {
        message: format!("validated parameter missing: {name}"),
    })
}

// ============================================================================
// SECTION: Registry Assembly
// ============================================================================

/// Builds the full capability registry over the shared services.
///
/// # Errors
///
/// Returns [`RegistryError`] when two capabilities collide, which indicates
/// a catalog programming error.
pub fn build_registry(
    services: &Arc<Services>,
    flags: Arc<FlagSet>,
) -> Result<CapabilityRegistry, RegistryError> {
    let mut registry = CapabilityRegistry::new(flags);
    compute::register(&mut registry, services)?;
    sql::register(&mut registry, services)?;
    jobs::register(&mut registry, services)?;
    files::register(&mut registry, services)?;
    ml::register(&mut registry, services)?;
    secrets::register(&mut registry, services)?;
    workspace::register(&mut registry, services)?;
    operations::register(&mut registry, services)?;
    prompts::register(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests;
