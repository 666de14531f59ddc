// crates/lakegate-mcp/src/catalog/prompts.rs
// ============================================================================
// Module: Prompt Capabilities
// Description: Server-rendered prompt templates.
// Purpose: Guide agents toward the catalog's analysis workflow.
// Dependencies: lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! Prompts render entirely on the server from validated parameters; no
//! backend call is involved. The rendered document carries a description
//! and a single-message conversation in protocol shape.

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

use super::expect_str;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Renders the table analysis prompt.
struct AnalyzeTableHandler;

#[async_trait]
impl CapabilityHandler for AnalyzeTableHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        let catalog = expect_str(&params, "catalog")?;
        let schema = expect_str(&params, "schema")?;
        let table = expect_str(&params, "table")?;
        let goal = expect_str(&params, "analysis_goal")?;
        let text = format!(
            "Analyze the table `{catalog}`.`{schema}`.`{table}` to achieve the \
             following goal: {goal}.\n\
             1. Inspect the columns with a `DESCRIBE TABLE` statement via \
             `sql.execute_statement`.\n\
             2. Preview sample rows with a `SELECT * ... LIMIT 10` statement.\n\
             3. Based on the schema and preview, formulate a SQL query using \
             relevant columns to address the goal.\n\
             4. Execute the query with `sql.execute_statement` and retrieve the \
             results with `sql.get_statement_result`.\n\
             5. Summarize the findings based on the query results."
        );
        Ok(json!({
            "description": "Guides an agent through analyzing a table with the SQL tools",
            "messages": [
                {
                    "role": "user",
                    "content": { "type": "text", "text": text },
                }
            ],
        }))
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers the prompt capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(registry: &mut CapabilityRegistry) -> Result<(), RegistryError> {
    registry.register(CapabilityDescriptor {
        name: "prompts.analyze_table".to_string(),
        kind: CapabilityKind::Prompt,
        description: "Template guiding an agent in analyzing a table".to_string(),
        params: vec![
            ParameterSpec::required("catalog", ParameterType::String, "Catalog name"),
            ParameterSpec::required("schema", ParameterType::String, "Schema name"),
            ParameterSpec::required("table", ParameterType::String, "Table name"),
            ParameterSpec::required(
                "analysis_goal",
                ParameterType::String,
                "What specific insight is needed",
            ),
        ],
        enablement: Enablement::Always,
        handler: Arc::new(AnalyzeTableHandler),
    })?;
    Ok(())
}
