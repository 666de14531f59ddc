// crates/lakegate-mcp/src/catalog/sql.rs
// ============================================================================
// Module: SQL Capabilities
// Description: Warehouse statement execution and result retrieval.
// Purpose: Expose asynchronous SQL submission through the tracker.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! Statement execution submits asynchronously and answers per the configured
//! wait strategy for the `sql_statement` domain. Result retrieval is a
//! direct read against the backend statement reference, available to
//! clients that keep their own statement ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

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
use lakegate_core::OperationDomain;
use lakegate_core::ParameterSpec;
use lakegate_core::ParameterType;
use lakegate_core::RegistryError;
use lakegate_core::StatementSubmission;
use serde_json::Value;

use super::Services;
use super::expect_str;
use super::opt_str;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// SQL operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum SqlOp {
    /// Submit a statement.
    ExecuteStatement,
    /// Fetch status and results of a statement.
    GetStatementResult,
}

/// Handler shared by the SQL capabilities.
struct SqlHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: SqlOp,
}

#[async_trait]
impl CapabilityHandler for SqlHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        match self.op {
            SqlOp::ExecuteStatement => {
                let submission = StatementSubmission {
                    query: expect_str(&params, "query")?,
                    warehouse_id: expect_str(&params, "warehouse_id")?,
                    catalog: opt_str(&params, "catalog"),
                    schema: opt_str(&params, "schema"),
                };
                let backend_ref = self
                    .services
                    .platform
                    .submit_statement(&submission)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                self.services.track_submission(OperationDomain::SqlStatement, backend_ref).await
            }
            SqlOp::GetStatementResult => {
                let statement_id = expect_str(&params, "statement_id")?;
                let result = self
                    .services
                    .platform
                    .get_statement_result(&BackendRef::new(statement_id))
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                serde_json::to_value(result).map_err(|err| GatewayError::InternalError {
                    message: format!("statement result serialization failed: {err}"),
                })
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the SQL capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    registry.register(CapabilityDescriptor {
        name: "sql.execute_statement".to_string(),
        kind: CapabilityKind::Tool,
        description: "Submits a SQL statement to a warehouse".to_string(),
        params: vec![
            ParameterSpec::required("query", ParameterType::String, "SQL statement text"),
            ParameterSpec::required(
                "warehouse_id",
                ParameterType::String,
                "Warehouse identifier",
            ),
            ParameterSpec::optional("catalog", ParameterType::String, "Default catalog"),
            ParameterSpec::optional("schema", ParameterType::String, "Default schema"),
        ],
        enablement: Enablement::Always,
        handler: Arc::new(SqlHandler {
            services: Arc::clone(services),
            op: SqlOp::ExecuteStatement,
        }),
    })?;
    registry.register(CapabilityDescriptor {
        name: "sql.get_statement_result".to_string(),
        kind: CapabilityKind::Tool,
        description: "Fetches status and results of a submitted statement".to_string(),
        params: vec![ParameterSpec::required(
            "statement_id",
            ParameterType::String,
            "Backend statement identifier",
        )],
        enablement: Enablement::Always,
        handler: Arc::new(SqlHandler {
            services: Arc::clone(services),
            op: SqlOp::GetStatementResult,
        }),
    })?;
    Ok(())
}
