// crates/lakegate-core/src/lib.rs
// ============================================================================
// Module: Lakegate Core
// Description: Transport-independent gateway pipeline and contracts.
// Purpose: Define the registry, dispatcher, tracker, limiter, and facade.
// Dependencies: async-trait, serde, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! Lakegate Core is the protocol-independent heart of the gateway: a
//! capability registry, a fixed-order request dispatcher, an operation
//! tracker for slow backend work, a per-principal rate limiter, and the
//! narrow facade traits every backend implementation must satisfy. Nothing
//! in this crate knows about wire protocols; transports adapt requests into
//! [`dispatch::DispatchRequest`] values and envelopes back out.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod identifiers;
pub mod limiter;
pub mod registry;
pub mod time;
pub mod tracker;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use correlation::CorrelationGenerator;
pub use correlation::CorrelationRejection;
pub use correlation::sanitize_client_correlation;
pub use dispatch::AuditSeverity;
pub use dispatch::DispatchAudit;
pub use dispatch::DispatchAuditEvent;
pub use dispatch::DispatchEnvelope;
pub use dispatch::DispatchRequest;
pub use dispatch::Dispatcher;
pub use dispatch::NoopDispatchAudit;
pub use error::BackendFailure;
pub use error::ErrorKind;
pub use error::ErrorMapper;
pub use error::ErrorRecord;
pub use error::GatewayError;
pub use error::Redactor;
pub use facade::BackendPhase;
pub use facade::ClusterDetail;
pub use facade::ClusterSummary;
pub use facade::ComputeApi;
pub use facade::ExperimentSummary;
pub use facade::FileEntry;
pub use facade::FilesApi;
pub use facade::JobRef;
pub use facade::JobsApi;
pub use facade::MlApi;
pub use facade::MlRunDetail;
pub use facade::MlRunSummary;
pub use facade::PlatformClient;
pub use facade::RunStatus;
pub use facade::SecretValue;
pub use facade::SecretsApi;
pub use facade::SqlApi;
pub use facade::StatementResult;
pub use facade::StatementSubmission;
pub use facade::VectorDocument;
pub use facade::VectorMatch;
pub use facade::WorkspaceApi;
pub use facade::WorkspaceItem;
pub use identifiers::BackendRef;
pub use identifiers::OperationId;
pub use identifiers::Principal;
pub use limiter::RateLimiter;
pub use limiter::RateLimiterConfig;
pub use registry::CapabilityDescriptor;
pub use registry::CapabilityHandler;
pub use registry::CapabilityKind;
pub use registry::CapabilityRegistry;
pub use registry::CapabilitySummary;
pub use registry::Enablement;
pub use registry::FlagSet;
pub use registry::InvocationContext;
pub use registry::ParameterSpec;
pub use registry::ParameterType;
pub use registry::RegistryError;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SystemClock;
pub use tracker::BackendStatus;
pub use tracker::FacadeStatusPoller;
pub use tracker::OperationDomain;
pub use tracker::OperationSnapshot;
pub use tracker::OperationState;
pub use tracker::OperationTracker;
pub use tracker::StatusPoller;
pub use tracker::TrackerConfig;
