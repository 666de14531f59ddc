// crates/lakegate-core/src/dispatch.rs
// ============================================================================
// Module: Request Dispatcher
// Description: Single entry point turning capability requests into envelopes.
// Purpose: Enforce admission, enablement, and validation in one fixed order.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every capability invocation flows through [`Dispatcher::dispatch`], which
//! applies the pipeline in a fixed order: rate limiting, name resolution,
//! enablement, strict parameter validation, then the handler. Failures at
//! any stage short-circuit into the same envelope shape as success, so
//! transports never need a second error path. The dispatcher never panics
//! and never lets an unclassified error escape the closed taxonomy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::correlation::CorrelationGenerator;
use crate::correlation::sanitize_client_correlation;
use crate::error::ErrorKind;
use crate::error::ErrorMapper;
use crate::error::ErrorRecord;
use crate::error::GatewayError;
use crate::identifiers::Principal;
use crate::limiter::RateLimiter;
use crate::registry::CapabilityRegistry;
use crate::registry::InvocationContext;
use crate::registry::ParameterSpec;
use crate::time::Clock;

// ============================================================================
// SECTION: Request and Envelope
// ============================================================================

/// One capability invocation as received from a transport.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Requested capability name.
    pub capability: String,
    /// Raw request parameters; `Null` means no parameters.
    pub params: Value,
    /// Principal on whose behalf the request runs.
    pub principal: Principal,
    /// Untrusted client-supplied correlation identifier.
    pub client_correlation: Option<String>,
}

/// Uniform response envelope for every dispatch, success or failure.
///
/// # Invariants
/// - Exactly one of `result` and `error` is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEnvelope {
    /// Server-issued correlation identifier.
    pub correlation_id: String,
    /// Sanitized client correlation identifier, echoed when supplied.
    pub client_correlation_id: Option<String>,
    /// Wall-clock dispatch duration in milliseconds.
    pub duration_ms: u64,
    /// Handler result on success.
    pub result: Option<Value>,
    /// Normalized failure record on error.
    pub error: Option<ErrorRecord>,
}

// ============================================================================
// SECTION: Audit Contract
// ============================================================================

/// Outcome severity for audit routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Successful dispatch.
    Info,
    /// Classified client or backend failure.
    Warn,
    /// Unclassified internal failure.
    Error,
}

/// One dispatch outcome as handed to audit sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchAuditEvent {
    /// Server correlation identifier.
    pub correlation_id: String,
    /// Requesting principal.
    pub principal: String,
    /// Requested capability name.
    pub capability: String,
    /// Taxonomy code of the failure, or `ok` on success.
    pub outcome: String,
    /// Dispatch duration in milliseconds.
    pub duration_ms: u64,
    /// Outcome severity.
    pub severity: AuditSeverity,
}

/// Sink receiving one event per dispatch.
///
/// Implementations must not block the dispatch path.
pub trait DispatchAudit: Send + Sync {
    /// Records one dispatch outcome.
    fn record(&self, event: &DispatchAuditEvent);
}

/// Audit sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatchAudit;

impl DispatchAudit for NoopDispatchAudit {
    fn record(&self, _event: &DispatchAuditEvent) {}
}

/// Maps an optional failure kind to its audit severity.
const fn severity_for(kind: Option<ErrorKind>) -> AuditSeverity {
    match kind {
        None => AuditSeverity::Info,
        Some(ErrorKind::InternalError) => AuditSeverity::Error,
        Some(_) => AuditSeverity::Warn,
    }
}

// ============================================================================
// SECTION: Parameter Validation
// ============================================================================

/// Validates raw parameters against a capability's declaration.
///
/// Strict: unknown fields are rejected, required fields must be present,
/// every value must match its declared type, and defaults are applied for
/// absent optional fields. All offending fields are collected so one
/// response names every problem.
fn validate_params(specs: &[ParameterSpec], raw: Value) -> Result<Value, GatewayError> {
    let mut object = match raw {
        Value::Null => serde_json::Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(GatewayError::InvalidParameters {
                message: format!("parameters must be an object, got {}", json_type(&other)),
                fields: Vec::new(),
            });
        }
    };
    let mut offending: Vec<String> = Vec::new();
    for key in object.keys() {
        if !specs.iter().any(|spec| spec.name == *key) {
            offending.push(key.clone());
        }
    }
    for spec in specs {
        match object.get(&spec.name) {
            Some(value) => {
                if !spec.param_type.matches(value) {
                    offending.push(spec.name.clone());
                }
            }
            None => {
                if spec.required {
                    offending.push(spec.name.clone());
                } else if let Some(default) = &spec.default {
                    object.insert(spec.name.clone(), default.clone());
                }
            }
        }
    }
    if offending.is_empty() {
        Ok(Value::Object(object))
    } else {
        Err(GatewayError::InvalidParameters {
            message: format!("invalid or missing fields: {}", offending.join(", ")),
            fields: offending,
        })
    }
}

/// Returns the JSON type label of a value for error messages.
const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Gateway request pipeline shared by every transport.
pub struct Dispatcher {
    /// Capability catalog.
    registry: Arc<CapabilityRegistry>,
    /// Per-principal admission control.
    limiter: Arc<RateLimiter>,
    /// Failure normalization and redaction.
    mapper: ErrorMapper,
    /// Outcome sink.
    audit: Arc<dyn DispatchAudit>,
    /// Time source for durations.
    clock: Arc<dyn Clock>,
    /// Server correlation identifier source.
    correlation: CorrelationGenerator,
}

impl Dispatcher {
    /// Creates a dispatcher over shared gateway components.
    #[must_use]
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        limiter: Arc<RateLimiter>,
        mapper: ErrorMapper,
        audit: Arc<dyn DispatchAudit>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            limiter,
            mapper,
            audit,
            clock,
            correlation: CorrelationGenerator::new(),
        }
    }

    /// Returns the capability registry backing this dispatcher.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Runs one request through the full pipeline and returns its envelope.
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchEnvelope {
        let started_ms = self.clock.now_millis();
        let correlation_id = self.correlation.issue();
        let (client_correlation_id, outcome) =
            match sanitize_client_correlation(request.client_correlation.as_deref()) {
                Ok(sanitized) => (sanitized, self.run(&request, &correlation_id).await),
                Err(rejection) => (
                    None,
                    Err(GatewayError::InvalidParameters {
                        message: format!("invalid client correlation id: {rejection}"),
                        fields: vec!["correlation_id".to_string()],
                    }),
                ),
            };
        let duration_ms = self.clock.now_millis().saturating_sub(started_ms);
        let (result, error, failed_kind) = match outcome {
            Ok(value) => (Some(value), None, None),
            Err(err) => {
                let kind = err.kind();
                (None, Some(self.mapper.record(&err, &correlation_id)), Some(kind))
            }
        };
        self.audit.record(&DispatchAuditEvent {
            correlation_id: correlation_id.clone(),
            principal: request.principal.as_str().to_string(),
            capability: request.capability.clone(),
            outcome: failed_kind.map_or("ok", ErrorKind::code).to_string(),
            duration_ms,
            severity: severity_for(failed_kind),
        });
        DispatchEnvelope {
            correlation_id,
            client_correlation_id,
            duration_ms,
            result,
            error,
        }
    }

    /// Pipeline stages after correlation handling; any `Err` short-circuits.
    async fn run(
        &self,
        request: &DispatchRequest,
        correlation_id: &str,
    ) -> Result<Value, GatewayError> {
        self.limiter.try_admit(&request.principal)?;
        let descriptor = self.registry.resolve(&request.capability)?;
        if !self.registry.is_enabled(descriptor) {
            return Err(GatewayError::CapabilityDisabled {
                name: descriptor.name.clone(),
            });
        }
        let params = validate_params(&descriptor.params, request.params.clone())?;
        let ctx = InvocationContext {
            principal: &request.principal,
            correlation_id,
        };
        descriptor.handler.invoke(ctx, params).await
    }
}
