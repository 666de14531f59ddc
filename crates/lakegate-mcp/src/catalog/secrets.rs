// crates/lakegate-mcp/src/catalog/secrets.rs
// ============================================================================
// Module: Secrets Capabilities
// Description: Secret scope browsing and value management.
// Purpose: Expose secret operations with value reads behind a flag.
// Dependencies: base64, lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! Scope and key listings plus write and delete are always available.
//! `secrets.get_value` is registered behind the `secrets.get_value` flag,
//! which defaults to off; while disabled the capability stays resolvable
//! so the dispatcher reports `capability_disabled` rather than unknown.
//! Secret bytes leave the gateway base64-encoded and are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
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
// SECTION: Constants
// ============================================================================

/// Flag gating secret value reads.
pub const GET_VALUE_FLAG: &str = "secrets.get_value";

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Secrets operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum SecretsOp {
    /// List scopes.
    Scopes,
    /// List keys in a scope.
    Keys,
    /// Read a secret value.
    GetValue,
    /// Create or replace a secret value.
    PutValue,
    /// Delete a secret.
    DeleteValue,
}

/// Handler shared by the secrets capabilities.
struct SecretsHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: SecretsOp,
}

#[async_trait]
impl CapabilityHandler for SecretsHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        match self.op {
            SecretsOp::Scopes => {
                let scopes = self
                    .services
                    .platform
                    .list_scopes()
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "scopes": scopes }))
            }
            SecretsOp::Keys => {
                let scope = expect_str(&params, "scope")?;
                let keys = self
                    .services
                    .platform
                    .list_keys(&scope)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "keys": keys }))
            }
            SecretsOp::GetValue => {
                let scope = expect_str(&params, "scope")?;
                let key = expect_str(&params, "key")?;
                let value = self
                    .services
                    .platform
                    .get_value(&scope, &key)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({
                    "scope": scope,
                    "key": key,
                    "value_base64": BASE64.encode(&value.bytes),
                }))
            }
            SecretsOp::PutValue => {
                let scope = expect_str(&params, "scope")?;
                let key = expect_str(&params, "key")?;
                let value = expect_str(&params, "value")?;
                self.services
                    .platform
                    .put_value(&scope, &key, &value)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "scope": scope, "key": key, "status": "stored" }))
            }
            SecretsOp::DeleteValue => {
                let scope = expect_str(&params, "scope")?;
                let key = expect_str(&params, "key")?;
                self.services
                    .platform
                    .delete_value(&scope, &key)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "scope": scope, "key": key, "status": "deleted" }))
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Builds one secrets descriptor.
fn descriptor(
    services: &Arc<Services>,
    name: &str,
    kind: CapabilityKind,
    description: &str,
    params: Vec<ParameterSpec>,
    enablement: Enablement,
    op: SecretsOp,
) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: name.to_string(),
        kind,
        description: description.to_string(),
        params,
        enablement,
        handler: Arc::new(SecretsHandler {
            services: Arc::clone(services),
            op,
        }),
    }
}

/// Registers the secrets capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    let scope = || ParameterSpec::required("scope", ParameterType::String, "Secret scope name");
    let key = || ParameterSpec::required("key", ParameterType::String, "Secret key name");
    registry.register(descriptor(
        services,
        "secrets.scopes",
        CapabilityKind::Resource,
        "Lists secret scopes",
        Vec::new(),
        Enablement::Always,
        SecretsOp::Scopes,
    ))?;
    registry.register(descriptor(
        services,
        "secrets.keys",
        CapabilityKind::Resource,
        "Lists secret keys in a scope",
        vec![scope()],
        Enablement::Always,
        SecretsOp::Keys,
    ))?;
    registry.register(descriptor(
        services,
        "secrets.get_value",
        CapabilityKind::Tool,
        "Reads a secret value as base64 (disabled unless explicitly enabled)",
        vec![scope(), key()],
        Enablement::Flag(GET_VALUE_FLAG.to_string()),
        SecretsOp::GetValue,
    ))?;
    registry.register(descriptor(
        services,
        "secrets.put_value",
        CapabilityKind::Tool,
        "Creates or replaces a secret value",
        vec![
            scope(),
            key(),
            ParameterSpec::required("value", ParameterType::String, "Secret value to store"),
        ],
        Enablement::Always,
        SecretsOp::PutValue,
    ))?;
    registry.register(descriptor(
        services,
        "secrets.delete_value",
        CapabilityKind::Tool,
        "Deletes a secret",
        vec![scope(), key()],
        Enablement::Always,
        SecretsOp::DeleteValue,
    ))?;
    Ok(())
}
