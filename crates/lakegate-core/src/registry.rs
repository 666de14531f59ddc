// crates/lakegate-core/src/registry.rs
// ============================================================================
// Module: Capability Registry
// Description: Declarative catalog of tools, resources, and prompt templates.
// Purpose: Resolve names to handlers with per-dispatch enablement checks.
// Dependencies: async-trait, serde_json
// ============================================================================

//! ## Overview
//! The registry is the gateway's capability catalog. Registration is
//! append-only and happens during single-threaded startup; afterwards the
//! registry is shared read-only across dispatch tasks. Enablement is a pure
//! predicate over a shared [`FlagSet`] and is re-evaluated on every resolve,
//! so a sensitive capability toggled off mid-session cannot be invoked even
//! if a client discovered it earlier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::error::GatewayError;
use crate::identifiers::Principal;

// ============================================================================
// SECTION: Capability Metadata
// ============================================================================

/// Kind of an invocable or readable capability.
///
/// # Invariants
/// - Variants are stable for discovery payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Invocable operation with side effects or backend calls.
    Tool,
    /// Readable accessor over backend state.
    Resource,
    /// Parameterized prompt template.
    Prompt,
}

/// Wire type of one declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// JSON string.
    String,
    /// JSON integer.
    Integer,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl ParameterType {
    /// Returns the JSON Schema type label for discovery documents.
    #[must_use]
    pub const fn schema_label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Returns whether the JSON value conforms to this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// One declared parameter of a capability.
///
/// # Invariants
/// - A required parameter never carries a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name as it appears in request payloads.
    pub name: String,
    /// Accepted JSON type.
    pub param_type: ParameterType,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Default applied when an optional parameter is absent.
    pub default: Option<Value>,
    /// Human-readable description for discovery.
    pub description: String,
}

impl ParameterSpec {
    /// Declares a required parameter.
    #[must_use]
    pub fn required(name: &str, param_type: ParameterType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: true,
            default: None,
            description: description.to_string(),
        }
    }

    /// Declares an optional parameter without a default.
    #[must_use]
    pub fn optional(name: &str, param_type: ParameterType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: false,
            default: None,
            description: description.to_string(),
        }
    }

    /// Declares an optional parameter with a default value.
    #[must_use]
    pub fn with_default(
        name: &str,
        param_type: ParameterType,
        default: Value,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: false,
            default: Some(default),
            description: description.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Enablement
// ============================================================================

/// Pure enablement predicate evaluated at registration and on every resolve.
///
/// # Invariants
/// - Evaluation has no side effects and is idempotent for a given flag state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enablement {
    /// Capability is always available.
    Always,
    /// Capability is available only while the named flag is true.
    Flag(String),
}

/// Shared, runtime-togglable boolean flags backing [`Enablement::Flag`].
///
/// # Invariants
/// - Unknown flags evaluate to false (fail closed).
#[derive(Debug, Default)]
pub struct FlagSet {
    /// Flag values keyed by name.
    flags: RwLock<BTreeMap<String, bool>>,
}

impl FlagSet {
    /// Creates a flag set from initial values.
    #[must_use]
    pub fn new(initial: BTreeMap<String, bool>) -> Self {
        Self {
            flags: RwLock::new(initial),
        }
    }

    /// Returns the current value of a flag; absent flags are false.
    #[must_use]
    pub fn get(&self, name: &str) -> bool {
        self.flags.read().map_or(false, |flags| flags.get(name).copied().unwrap_or(false))
    }

    /// Sets a flag value.
    pub fn set(&self, name: &str, value: bool) {
        if let Ok(mut flags) = self.flags.write() {
            flags.insert(name.to_string(), value);
        }
    }
}

// ============================================================================
// SECTION: Handler Contract
// ============================================================================

/// Per-request context passed to capability handlers.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext<'a> {
    /// Principal on whose behalf the request runs.
    pub principal: &'a Principal,
    /// Server correlation identifier for this request.
    pub correlation_id: &'a str,
}

/// Executable logic behind one capability.
///
/// Handlers receive validated parameters (defaults applied, unknown fields
/// rejected) and return either a JSON result or a gateway error; backend
/// failures must be mapped before they reach the dispatcher.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Invokes the capability.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the operation fails.
    async fn invoke(
        &self,
        ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError>;
}

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// One registered capability: metadata plus its handler.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    /// Unique name, namespaced by domain (`compute.start_cluster`).
    pub name: String,
    /// Capability kind.
    pub kind: CapabilityKind,
    /// Human-readable description for discovery.
    pub description: String,
    /// Ordered declared parameters.
    pub params: Vec<ParameterSpec>,
    /// Enablement predicate.
    pub enablement: Enablement,
    /// Executable logic; owned exclusively by the registry.
    pub handler: Arc<dyn CapabilityHandler>,
}

impl fmt::Debug for CapabilityDescriptor {
    // Handlers are opaque trait objects and are omitted from diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("params", &self.params)
            .field("enablement", &self.enablement)
            .finish_non_exhaustive()
    }
}

impl CapabilityDescriptor {
    /// Builds the discovery summary for this capability.
    #[must_use]
    pub fn summary(&self) -> CapabilitySummary {
        CapabilitySummary {
            name: self.name.clone(),
            kind: self.kind,
            description: self.description.clone(),
            parameter_schema: parameter_schema(&self.params),
        }
    }
}

/// Serializable discovery view of a capability (no handler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    /// Capability name.
    pub name: String,
    /// Capability kind.
    pub kind: CapabilityKind,
    /// Human-readable description.
    pub description: String,
    /// JSON-Schema-shaped parameter document.
    pub parameter_schema: Value,
}

/// Builds a JSON-Schema-shaped document from declared parameters.
fn parameter_schema(params: &[ParameterSpec]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for param in params {
        let mut spec = serde_json::Map::new();
        spec.insert("type".to_string(), json!(param.param_type.schema_label()));
        spec.insert("description".to_string(), json!(param.description));
        if let Some(default) = &param.default {
            spec.insert("default".to_string(), default.clone());
        }
        properties.insert(param.name.clone(), Value::Object(spec));
        if param.required {
            required.push(json!(param.name));
        }
    }
    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
        "additionalProperties": false,
    })
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registration-time errors.
///
/// # Invariants
/// - Registration failures abort startup; they never surface to clients.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A capability with this name is already registered.
    #[error("duplicate capability: {name}")]
    DuplicateCapability {
        /// Conflicting capability name.
        name: String,
    },
    /// A required parameter declared a default value.
    #[error("required parameter {param} of {name} must not declare a default")]
    RequiredWithDefault {
        /// Capability name.
        name: String,
        /// Offending parameter name.
        param: String,
    },
}

/// Append-only capability catalog shared read-only after startup.
pub struct CapabilityRegistry {
    /// Descriptors keyed by capability name.
    entries: BTreeMap<String, CapabilityDescriptor>,
    /// Shared flags backing enablement predicates.
    flags: Arc<FlagSet>,
}

impl CapabilityRegistry {
    /// Creates an empty registry over the given flag set.
    #[must_use]
    pub fn new(flags: Arc<FlagSet>) -> Self {
        Self {
            entries: BTreeMap::new(),
            flags,
        }
    }

    /// Registers a capability.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on duplicate names or malformed parameter
    /// declarations.
    pub fn register(&mut self, descriptor: CapabilityDescriptor) -> Result<(), RegistryError> {
        if self.entries.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateCapability {
                name: descriptor.name,
            });
        }
        for param in &descriptor.params {
            if param.required && param.default.is_some() {
                return Err(RegistryError::RequiredWithDefault {
                    name: descriptor.name.clone(),
                    param: param.name.clone(),
                });
            }
        }
        self.entries.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Resolves a capability by exact name regardless of enablement.
    ///
    /// Disabled capabilities resolve so the dispatcher can re-check
    /// enablement and fail with the precise `capability_disabled` kind.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownCapability`] when the name is absent.
    pub fn resolve(&self, name: &str) -> Result<&CapabilityDescriptor, GatewayError> {
        self.entries.get(name).ok_or_else(|| GatewayError::UnknownCapability {
            name: name.to_string(),
        })
    }

    /// Evaluates a descriptor's enablement against the current flag state.
    #[must_use]
    pub fn is_enabled(&self, descriptor: &CapabilityDescriptor) -> bool {
        match &descriptor.enablement {
            Enablement::Always => true,
            Enablement::Flag(flag) => self.flags.get(flag),
        }
    }

    /// Lists currently enabled capabilities, optionally filtered by kind.
    ///
    /// The returned iterator is lazy, finite, and restartable; disabled
    /// descriptors are invisible to discovery.
    pub fn list(
        &self,
        kind: Option<CapabilityKind>,
    ) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries
            .values()
            .filter(move |descriptor| kind.is_none_or(|wanted| descriptor.kind == wanted))
            .filter(|descriptor| self.is_enabled(descriptor))
    }

    /// Returns the shared flag set backing enablement predicates.
    #[must_use]
    pub fn flags(&self) -> Arc<FlagSet> {
        Arc::clone(&self.flags)
    }
}
