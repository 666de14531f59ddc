// crates/lakegate-config/src/config.rs
// ============================================================================
// Module: Lakegate Configuration
// Description: Configuration loading and validation for the gateway.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: lakegate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits and
//! validated before the gateway starts; any invalid setting fails closed.
//! The platform access token is never part of the file: the file names an
//! environment variable, and the token is read from the process environment
//! at startup only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use lakegate_core::RateLimiterConfig;
use lakegate_core::TrackerConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "lakegate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "LAKEGATE_CONFIG";
/// Default environment variable holding the platform access token.
const DEFAULT_TOKEN_ENV: &str = "LAKEGATE_PLATFORM_TOKEN";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Minimum allowed rate limit burst capacity.
const MIN_RATE_LIMIT_CAPACITY: u32 = 1;
/// Maximum allowed rate limit burst capacity.
const MAX_RATE_LIMIT_CAPACITY: u32 = 100_000;
/// Maximum allowed sustained refill rate per second.
const MAX_RATE_LIMIT_REFILL: f64 = 10_000.0;
/// Default rate limit burst capacity.
const DEFAULT_RATE_LIMIT_CAPACITY: u32 = 20;
/// Default sustained refill rate per second.
const DEFAULT_RATE_LIMIT_REFILL: f64 = 5.0;
/// Default idle window before a principal bucket is evicted.
const DEFAULT_RATE_LIMIT_IDLE_MS: u64 = 300_000;
/// Minimum operation poll interval in milliseconds.
const MIN_POLL_INTERVAL_MS: u64 = 100;
/// Maximum operation poll interval in milliseconds.
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Default operation poll interval in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Default backoff ceiling for awaited operations in milliseconds.
const DEFAULT_MAX_POLL_INTERVAL_MS: u64 = 10_000;
/// Maximum await deadline in milliseconds.
const MAX_OPERATION_TIMEOUT_MS: u64 = 3_600_000;
/// Default await deadline in milliseconds.
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 120_000;
/// Maximum terminal-handle retention in milliseconds.
const MAX_RETENTION_MS: u64 = 86_400_000;
/// Default terminal-handle retention in milliseconds.
const DEFAULT_RETENTION_MS: u64 = 600_000;
/// Minimum platform connect timeout in milliseconds.
const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum platform connect timeout in milliseconds.
const MAX_CONNECT_TIMEOUT_MS: u64 = 30_000;
/// Default platform connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;
/// Minimum platform request timeout in milliseconds.
const MIN_REQUEST_TIMEOUT_MS: u64 = 500;
/// Maximum platform request timeout in milliseconds.
const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Default platform request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Default HTTP bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8170";
/// Default maximum accepted HTTP request body in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
/// Maximum accepted HTTP request body bound in bytes.
const MAX_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem failure while reading the config.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML syntax or shape failure.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Semantically invalid configuration.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// Required environment variable missing or empty.
    #[error("missing environment variable: {0}")]
    MissingEnv(String),
}

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Wire transport the gateway serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Length-framed JSON-RPC over stdin/stdout.
    Stdio,
    /// JSON-RPC over a single HTTP POST endpoint.
    Http,
    /// HTTP plus a server-sent-events notification stream.
    Sse,
}

/// How a submission-style capability responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Await the terminal snapshot inside the request, up to the default
    /// operation timeout.
    Block,
    /// Return an operation handle immediately.
    Token,
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport to serve.
    #[serde(default = "default_transport")]
    pub transport: Transport,
    /// Bind address for HTTP and SSE transports.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted HTTP request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_MAX_BODY_BYTES}"
            )));
        }
        if matches!(self.transport, Transport::Http | Transport::Sse) {
            self.bind
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::Invalid("server.bind must be a socket address".to_string()))?;
        }
        Ok(())
    }

    /// Returns the parsed bind address for network transports.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid("server.bind must be a socket address".to_string()))
    }
}

/// `[rate_limit]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum burst size per principal.
    #[serde(default = "default_rate_limit_capacity")]
    pub capacity: u32,
    /// Sustained tokens restored per second.
    #[serde(default = "default_rate_limit_refill")]
    pub refill_per_second: f64,
    /// Idle window before a principal bucket is evicted.
    #[serde(default = "default_rate_limit_idle_ms")]
    pub idle_eviction_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_rate_limit_capacity(),
            refill_per_second: default_rate_limit_refill(),
            idle_eviction_ms: default_rate_limit_idle_ms(),
        }
    }
}

impl RateLimitConfig {
    /// Validates rate limit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RATE_LIMIT_CAPACITY..=MAX_RATE_LIMIT_CAPACITY).contains(&self.capacity) {
            return Err(ConfigError::Invalid(format!(
                "rate_limit.capacity must be between {MIN_RATE_LIMIT_CAPACITY} and {MAX_RATE_LIMIT_CAPACITY}"
            )));
        }
        if !self.refill_per_second.is_finite()
            || self.refill_per_second <= 0.0
            || self.refill_per_second > MAX_RATE_LIMIT_REFILL
        {
            return Err(ConfigError::Invalid(format!(
                "rate_limit.refill_per_second must be positive and at most {MAX_RATE_LIMIT_REFILL}"
            )));
        }
        Ok(())
    }

    /// Converts to the core limiter configuration.
    #[must_use]
    pub const fn to_core(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            capacity: self.capacity,
            refill_per_second: self.refill_per_second,
            idle_eviction_ms: self.idle_eviction_ms,
        }
    }
}

/// `[operations]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationsConfig {
    /// Minimum spacing between backend status queries per handle.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Backoff ceiling for awaited operations.
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,
    /// Await deadline applied when the caller does not supply one.
    #[serde(default = "default_operation_timeout_ms")]
    pub default_timeout_ms: u64,
    /// How long terminal snapshots remain fetchable.
    #[serde(default = "default_retention_ms")]
    pub retention_ms: u64,
    /// Per-domain wait strategy overrides, keyed by domain label
    /// (`cluster_start`, `sql_statement`, ...). Unlisted domains use
    /// [`WaitStrategy::Token`].
    #[serde(default)]
    pub strategy: BTreeMap<String, WaitStrategy>,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            default_timeout_ms: default_operation_timeout_ms(),
            retention_ms: default_retention_ms(),
            strategy: BTreeMap::new(),
        }
    }
}

impl OperationsConfig {
    /// Validates operation tracker settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "operations.poll_interval_ms must be between {MIN_POLL_INTERVAL_MS} and {MAX_POLL_INTERVAL_MS}"
            )));
        }
        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(ConfigError::Invalid(
                "operations.max_poll_interval_ms must be at least poll_interval_ms".to_string(),
            ));
        }
        if self.default_timeout_ms == 0 || self.default_timeout_ms > MAX_OPERATION_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "operations.default_timeout_ms must be between 1 and {MAX_OPERATION_TIMEOUT_MS}"
            )));
        }
        if self.retention_ms == 0 || self.retention_ms > MAX_RETENTION_MS {
            return Err(ConfigError::Invalid(format!(
                "operations.retention_ms must be between 1 and {MAX_RETENTION_MS}"
            )));
        }
        for key in self.strategy.keys() {
            if !matches!(
                key.as_str(),
                "cluster_start" | "cluster_terminate" | "sql_statement" | "job_run"
            ) {
                return Err(ConfigError::Invalid(format!(
                    "operations.strategy has unknown domain: {key}"
                )));
            }
        }
        Ok(())
    }

    /// Converts to the core tracker configuration.
    #[must_use]
    pub const fn to_core(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval_ms: self.poll_interval_ms,
            max_poll_interval_ms: self.max_poll_interval_ms,
            default_timeout_ms: self.default_timeout_ms,
            retention_ms: self.retention_ms,
        }
    }

    /// Returns the wait strategy for a domain label.
    #[must_use]
    pub fn strategy_for(&self, domain: &str) -> WaitStrategy {
        self.strategy.get(domain).copied().unwrap_or(WaitStrategy::Token)
    }
}

/// `[capabilities]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilitiesConfig {
    /// Enablement flags keyed by flag name. Absent flags are false, so
    /// flag-gated capabilities ship disabled.
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

/// `[redaction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedactionConfig {
    /// Field names whose values are stripped from outgoing messages.
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            sensitive_fields: default_sensitive_fields(),
        }
    }
}

/// `[platform]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Base URL of the lakehouse workspace.
    pub base_url: String,
    /// Environment variable holding the platform access token. The token
    /// itself never appears in configuration.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl PlatformConfig {
    /// Validates platform connection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(format!("platform.base_url: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "platform.base_url must use http or https".to_string(),
            ));
        }
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::Invalid("platform.token_env must be set".to_string()));
        }
        if !(MIN_CONNECT_TIMEOUT_MS..=MAX_CONNECT_TIMEOUT_MS).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "platform.connect_timeout_ms must be between {MIN_CONNECT_TIMEOUT_MS} and {MAX_CONNECT_TIMEOUT_MS}"
            )));
        }
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "platform.request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Reads the platform access token from the configured environment
    /// variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when the variable is unset or
    /// empty.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        match env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ConfigError::MissingEnv(self.token_env.clone())),
        }
    }
}

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// Complete gateway configuration as loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Server transport settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Admission control settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Operation tracker settings.
    #[serde(default)]
    pub operations: OperationsConfig,
    /// Capability enablement flags.
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
    /// Message redaction settings.
    #[serde(default)]
    pub redaction: RedactionConfig,
    /// Lakehouse platform connection settings.
    pub platform: PlatformConfig,
}

impl GatewayConfig {
    /// Loads configuration from the given path, the `LAKEGATE_CONFIG`
    /// environment variable, or `./lakegate.toml`, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.rate_limit.validate()?;
        self.operations.validate()?;
        self.platform.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults and Resolution
// ============================================================================

/// Default transport.
const fn default_transport() -> Transport {
    Transport::Stdio
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum HTTP body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default rate limit capacity.
const fn default_rate_limit_capacity() -> u32 {
    DEFAULT_RATE_LIMIT_CAPACITY
}

/// Default rate limit refill rate.
const fn default_rate_limit_refill() -> f64 {
    DEFAULT_RATE_LIMIT_REFILL
}

/// Default rate limit idle eviction window.
const fn default_rate_limit_idle_ms() -> u64 {
    DEFAULT_RATE_LIMIT_IDLE_MS
}

/// Default poll interval.
const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Default poll backoff ceiling.
const fn default_max_poll_interval_ms() -> u64 {
    DEFAULT_MAX_POLL_INTERVAL_MS
}

/// Default await deadline.
const fn default_operation_timeout_ms() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_MS
}

/// Default terminal-handle retention.
const fn default_retention_ms() -> u64 {
    DEFAULT_RETENTION_MS
}

/// Default sensitive field names for redaction.
fn default_sensitive_fields() -> Vec<String> {
    vec![
        "token".to_string(),
        "password".to_string(),
        "secret".to_string(),
        "authorization".to_string(),
        "api_key".to_string(),
    ]
}

/// Default platform token environment variable.
fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

/// Default platform connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default platform request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Resolves the effective config path from argument, environment, or default.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(
        || {
            env::var(CONFIG_ENV_VAR)
                .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from)
        },
        Path::to_path_buf,
    )
}
