// crates/lakegate-core/src/error.rs
// ============================================================================
// Module: Gateway Error Taxonomy
// Description: Closed error taxonomy, backend failure shapes, and mapping.
// Purpose: Normalize every failure into one stable, redacted wire form.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every failure that leaves the gateway core is expressed in the closed
//! taxonomy defined here. Backend failures arrive as [`BackendFailure`]
//! shapes (never raw transport payloads) and pass through [`ErrorMapper`],
//! which classifies by shape rather than message text and redacts
//! credential-looking material before anything is returned or logged.
//! Security posture: error messages may embed untrusted backend text; treat
//! them as display-only and never parse them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Taxonomy
// ============================================================================

/// Closed classification for every failure the gateway can return.
///
/// # Invariants
/// - Variants are stable for programmatic client handling.
/// - `retryable` is a property of the kind, never of an individual message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Capability name not present in the registry.
    UnknownCapability,
    /// Capability registered but currently disabled by configuration.
    CapabilityDisabled,
    /// Request parameters failed strict schema validation.
    InvalidParameters,
    /// Principal exceeded its admission quota.
    RateLimited,
    /// Backend denied the operation for this identity.
    PermissionDenied,
    /// Backend entity does not exist.
    NotFound,
    /// Backend rejected the call due to throttling or quota pressure.
    BackendThrottled,
    /// Backend unreachable or transiently failing.
    BackendUnavailable,
    /// An `await` on a long-running operation exceeded its deadline.
    OperationTimedOut,
    /// Operation handle unknown, expired, or evicted.
    UnknownOperation,
    /// Unclassified failure; logged at elevated severity.
    InternalError,
}

impl ErrorKind {
    /// Returns the stable snake_case label for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnknownCapability => "unknown_capability",
            Self::CapabilityDisabled => "capability_disabled",
            Self::InvalidParameters => "invalid_parameters",
            Self::RateLimited => "rate_limited",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::BackendThrottled => "backend_throttled",
            Self::BackendUnavailable => "backend_unavailable",
            Self::OperationTimedOut => "operation_timed_out",
            Self::UnknownOperation => "unknown_operation",
            Self::InternalError => "internal_error",
        }
    }

    /// Returns whether clients may safely retry with backoff.
    #[must_use]
    pub const fn retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::BackendThrottled | Self::BackendUnavailable)
    }
}

/// Gateway failure carrying its taxonomy kind and a display message.
///
/// # Invariants
/// - `kind()` is total; no variant escapes the closed taxonomy.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Capability name not present in the registry.
    #[error("unknown capability: {name}")]
    UnknownCapability {
        /// Requested capability name.
        name: String,
    },
    /// Capability present but disabled by configuration.
    #[error("capability disabled: {name}")]
    CapabilityDisabled {
        /// Requested capability name.
        name: String,
    },
    /// Parameters failed strict validation.
    #[error("invalid parameters: {message}")]
    InvalidParameters {
        /// Validation summary naming the offending fields.
        message: String,
        /// Offending field names in request order.
        fields: Vec<String>,
    },
    /// Principal exceeded its admission quota.
    #[error("rate limited: {principal}")]
    RateLimited {
        /// Rejected principal.
        principal: String,
    },
    /// Backend denied the operation.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Redacted backend message.
        message: String,
    },
    /// Backend entity missing.
    #[error("not found: {message}")]
    NotFound {
        /// Redacted backend message.
        message: String,
    },
    /// Backend throttled the request.
    #[error("backend throttled: {message}")]
    BackendThrottled {
        /// Redacted backend message.
        message: String,
    },
    /// Backend unreachable or transiently failing.
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        /// Redacted backend message.
        message: String,
    },
    /// An awaited operation exceeded its deadline.
    #[error("operation still running after {timeout_ms}ms")]
    OperationTimedOut {
        /// Deadline that elapsed, in milliseconds.
        timeout_ms: u64,
    },
    /// Operation handle unknown or evicted.
    #[error("unknown operation: {id}")]
    UnknownOperation {
        /// Requested operation identifier.
        id: String,
    },
    /// Unclassified internal failure.
    #[error("internal error: {message}")]
    InternalError {
        /// Redacted failure summary.
        message: String,
    },
}

impl GatewayError {
    /// Returns the taxonomy kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCapability {
                ..
            } => ErrorKind::UnknownCapability,
            Self::CapabilityDisabled {
                ..
            } => ErrorKind::CapabilityDisabled,
            Self::InvalidParameters {
                ..
            } => ErrorKind::InvalidParameters,
            Self::RateLimited {
                ..
            } => ErrorKind::RateLimited,
            Self::PermissionDenied {
                ..
            } => ErrorKind::PermissionDenied,
            Self::NotFound {
                ..
            } => ErrorKind::NotFound,
            Self::BackendThrottled {
                ..
            } => ErrorKind::BackendThrottled,
            Self::BackendUnavailable {
                ..
            } => ErrorKind::BackendUnavailable,
            Self::OperationTimedOut {
                ..
            } => ErrorKind::OperationTimedOut,
            Self::UnknownOperation {
                ..
            } => ErrorKind::UnknownOperation,
            Self::InternalError {
                ..
            } => ErrorKind::InternalError,
        }
    }
}

/// Normalized failure record as placed in response envelopes and logs.
///
/// # Invariants
/// - `message` has already passed redaction; it is safe to log verbatim.
/// - `retryable` always equals `kind.retryable()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Taxonomy classification.
    pub kind: ErrorKind,
    /// Redacted human-readable message.
    pub message: String,
    /// Whether clients may retry with backoff.
    pub retryable: bool,
    /// Correlation identifier of the originating request.
    pub correlation_id: String,
}

// ============================================================================
// SECTION: Backend Failure Shapes
// ============================================================================

/// Failure shapes produced by backend facade implementations.
///
/// # Invariants
/// - Classification happens at the facade boundary by response shape
///   (status class, failure category), never by matching message text here.
#[derive(Debug, Clone, Error)]
pub enum BackendFailure {
    /// Backend denied the operation for this identity.
    #[error("backend denied access: {message}")]
    PermissionDenied {
        /// Backend-provided detail.
        message: String,
    },
    /// Requested backend entity does not exist.
    #[error("backend entity not found: {resource}")]
    NotFound {
        /// Missing resource description.
        resource: String,
    },
    /// Backend judged the request malformed.
    #[error("backend rejected request: {message}")]
    Malformed {
        /// Backend-provided detail.
        message: String,
    },
    /// Backend throttled the caller.
    #[error("backend throttled request: {message}")]
    Throttled {
        /// Backend-provided detail.
        message: String,
        /// Suggested retry delay when the backend provided one.
        retry_after_ms: Option<u64>,
    },
    /// Backend unreachable or transiently unavailable.
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// Transport or availability detail.
        message: String,
    },
    /// Failure shape the facade could not classify.
    #[error("unclassified backend failure: {message}")]
    Unclassified {
        /// Backend-provided detail.
        message: String,
    },
}

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Prefix of platform access tokens; any following token body is redacted.
const TOKEN_PREFIX: &str = "dapi";
/// Minimum token-body length treated as credential-shaped.
const TOKEN_MIN_BODY: usize = 8;
/// Replacement text for redacted material.
const REDACTED: &str = "[REDACTED]";

/// Strips sensitive field values and credential-shaped substrings from text.
///
/// # Invariants
/// - Field matching is case-insensitive on the configured names.
/// - Redaction never grows the set of sensitive data (pure text transform).
#[derive(Debug, Clone)]
pub struct Redactor {
    /// Lowercased sensitive field names.
    fields: Vec<String>,
}

impl Redactor {
    /// Creates a redactor for the given sensitive field names.
    #[must_use]
    pub fn new(fields: &[String]) -> Self {
        Self {
            fields: fields.iter().map(|field| field.to_ascii_lowercase()).collect(),
        }
    }

    /// Returns the message with sensitive values replaced.
    ///
    /// Two passes: values following a configured field name (separated by
    /// `=` or `:`), then credential-shaped platform tokens.
    #[must_use]
    pub fn redact(&self, message: &str) -> String {
        let mut output = redact_tokens(message);
        for field in &self.fields {
            output = redact_field(&output, field);
        }
        output
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(&[
            "token".to_string(),
            "password".to_string(),
            "secret".to_string(),
            "authorization".to_string(),
            "api_key".to_string(),
        ])
    }
}

/// Replaces the value following `field=` or `field:` with the redaction mark.
fn redact_field(message: &str, field: &str) -> String {
    let lowered = message.to_ascii_lowercase();
    let mut output = String::with_capacity(message.len());
    let mut cursor = 0;
    while let Some(found) = lowered[cursor..].find(field) {
        let start = cursor + found;
        let after_name = start + field.len();
        let rest = &message[after_name..];
        let Some(value_offset) = separator_length(rest) else {
            output.push_str(&message[cursor..after_name]);
            cursor = after_name;
            continue;
        };
        let value_start = after_name + value_offset;
        let value_len = message[value_start..]
            .find(|ch: char| ch.is_whitespace() || matches!(ch, ',' | ';' | '"' | '}' | ')'))
            .unwrap_or(message.len() - value_start);
        output.push_str(&message[cursor..value_start]);
        output.push_str(REDACTED);
        cursor = value_start + value_len;
    }
    output.push_str(&message[cursor..]);
    output
}

/// Returns the byte length of a `=`/`:` separator run, if one follows.
fn separator_length(rest: &str) -> Option<usize> {
    let mut len = 0;
    let mut saw_separator = false;
    for ch in rest.chars() {
        match ch {
            '"' | '\'' | ' ' if len == 0 || saw_separator => len += ch.len_utf8(),
            '=' | ':' if !saw_separator => {
                saw_separator = true;
                len += ch.len_utf8();
            }
            _ => break,
        }
    }
    saw_separator.then_some(len)
}

/// Replaces platform token bodies (`dapi` + hex) with the redaction mark.
fn redact_tokens(message: &str) -> String {
    let mut output = String::with_capacity(message.len());
    let mut cursor = 0;
    while let Some(found) = message[cursor..].find(TOKEN_PREFIX) {
        let start = cursor + found;
        let body_start = start + TOKEN_PREFIX.len();
        let body_len = message[body_start..]
            .find(|ch: char| !ch.is_ascii_alphanumeric())
            .unwrap_or(message.len() - body_start);
        if body_len >= TOKEN_MIN_BODY {
            output.push_str(&message[cursor..start]);
            output.push_str(REDACTED);
        } else {
            output.push_str(&message[cursor..body_start + body_len]);
        }
        cursor = body_start + body_len;
    }
    output.push_str(&message[cursor..]);
    output
}

// ============================================================================
// SECTION: Error Mapper
// ============================================================================

/// Translates backend failure shapes into the closed gateway taxonomy.
///
/// # Invariants
/// - Classification is shape-driven; message text is never inspected.
/// - Every produced message passes redaction exactly once.
#[derive(Debug, Clone, Default)]
pub struct ErrorMapper {
    /// Redactor applied to every outgoing message.
    redactor: Redactor,
}

impl ErrorMapper {
    /// Creates a mapper with the given redactor.
    #[must_use]
    pub const fn new(redactor: Redactor) -> Self {
        Self {
            redactor,
        }
    }

    /// Maps a backend failure into a gateway error with a redacted message.
    #[must_use]
    pub fn map(&self, failure: &BackendFailure) -> GatewayError {
        match failure {
            BackendFailure::PermissionDenied {
                message,
            } => GatewayError::PermissionDenied {
                message: self.redactor.redact(message),
            },
            BackendFailure::NotFound {
                resource,
            } => GatewayError::NotFound {
                message: self.redactor.redact(resource),
            },
            BackendFailure::Malformed {
                message,
            } => GatewayError::InvalidParameters {
                message: self.redactor.redact(message),
                fields: Vec::new(),
            },
            BackendFailure::Throttled {
                message,
                ..
            } => GatewayError::BackendThrottled {
                message: self.redactor.redact(message),
            },
            BackendFailure::Unavailable {
                message,
            } => GatewayError::BackendUnavailable {
                message: self.redactor.redact(message),
            },
            BackendFailure::Unclassified {
                message,
            } => GatewayError::InternalError {
                message: self.redactor.redact(message),
            },
        }
    }

    /// Builds the wire-form record for a gateway error.
    #[must_use]
    pub fn record(&self, error: &GatewayError, correlation_id: &str) -> ErrorRecord {
        let kind = error.kind();
        ErrorRecord {
            kind,
            message: self.redactor.redact(&error.to_string()),
            retryable: kind.retryable(),
            correlation_id: correlation_id.to_string(),
        }
    }
}
