// crates/lakegate-core/src/facade.rs
// ============================================================================
// Module: Backend Client Facade
// Description: Narrow per-domain interfaces over the lakehouse platform.
// Purpose: Define the contract surfaces the gateway core consumes.
// Dependencies: async-trait, serde
// ============================================================================

//! ## Overview
//! The facade is the only path from the gateway to the backend platform.
//! Each domain gets one narrow trait; implementations translate transport
//! failures into [`BackendFailure`] shapes at this boundary so the core
//! never sees raw platform payloads. All methods are one-shot calls:
//! submission-style operations return a [`BackendRef`] that the operation
//! tracker re-queries, synchronous operations return their result directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::BackendFailure;
use crate::identifiers::BackendRef;

// ============================================================================
// SECTION: Shared Shapes
// ============================================================================

/// Backend-reported phase of a submitted statement or run.
///
/// # Invariants
/// - `Succeeded`, `Failed`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPhase {
    /// Queued, not yet running.
    Pending,
    /// Actively executing.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Completed with a failure.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl BackendPhase {
    /// Returns whether this phase is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

// ============================================================================
// SECTION: Compute
// ============================================================================

/// Cluster listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Backend cluster identifier.
    pub cluster_id: String,
    /// Display name.
    pub cluster_name: String,
    /// Backend lifecycle state label (e.g. `RUNNING`, `TERMINATED`).
    pub state: String,
}

/// Full cluster description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDetail {
    /// Backend cluster identifier.
    pub cluster_id: String,
    /// Display name.
    pub cluster_name: String,
    /// Backend lifecycle state label.
    pub state: String,
    /// Runtime version when reported.
    pub spark_version: Option<String>,
    /// Worker count when reported.
    pub num_workers: Option<u32>,
    /// Optional state detail message from the backend.
    pub state_message: Option<String>,
}

/// Compute lifecycle operations.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Lists all clusters visible to the gateway's platform identity.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, BackendFailure>;

    /// Fetches one cluster's detail.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterDetail, BackendFailure>;

    /// Requests a cluster start; the returned ref is pollable for terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when submission fails.
    async fn start_cluster(&self, cluster_id: &str) -> Result<BackendRef, BackendFailure>;

    /// Requests a cluster termination; the returned ref is pollable.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when submission fails.
    async fn terminate_cluster(&self, cluster_id: &str) -> Result<BackendRef, BackendFailure>;
}

// ============================================================================
// SECTION: SQL
// ============================================================================

/// Statement submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSubmission {
    /// SQL text to execute.
    pub query: String,
    /// Target warehouse identifier.
    pub warehouse_id: String,
    /// Optional catalog context.
    pub catalog: Option<String>,
    /// Optional schema context.
    pub schema: Option<String>,
}

/// Statement status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    /// Current phase.
    pub phase: BackendPhase,
    /// Result schema once available.
    pub schema: Option<Value>,
    /// Result rows once available.
    pub rows: Option<Value>,
    /// Failure detail when `phase` is `Failed`.
    pub error: Option<String>,
}

/// SQL statement execution.
#[async_trait]
pub trait SqlApi: Send + Sync {
    /// Submits a statement for asynchronous execution.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when submission fails.
    async fn submit_statement(
        &self,
        submission: &StatementSubmission,
    ) -> Result<BackendRef, BackendFailure>;

    /// Fetches the status and, when finished, results of a statement.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the status query fails.
    async fn get_statement_result(
        &self,
        backend_ref: &BackendRef,
    ) -> Result<StatementResult, BackendFailure>;
}

// ============================================================================
// SECTION: Jobs
// ============================================================================

/// Target of a job trigger: a saved job or a one-off notebook run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobRef {
    /// Saved job identifier.
    JobId(u64),
    /// Workspace notebook path for a one-off run.
    NotebookPath(String),
}

/// Run status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Current phase.
    pub phase: BackendPhase,
    /// Backend state detail when present.
    pub message: Option<String>,
    /// Run output once terminal, when the backend exposes it.
    pub output: Option<Value>,
}

/// Job and notebook run triggering.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Triggers a run; the returned ref is pollable via [`JobsApi::get_run_status`].
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when submission fails.
    async fn trigger_run(
        &self,
        job: &JobRef,
        params: &BTreeMap<String, String>,
    ) -> Result<BackendRef, BackendFailure>;

    /// Fetches the status of a triggered run.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the status query fails.
    async fn get_run_status(&self, backend_ref: &BackendRef)
    -> Result<RunStatus, BackendFailure>;
}

// ============================================================================
// SECTION: Files
// ============================================================================

/// File store listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path within the file store.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes for regular files.
    pub size: Option<u64>,
}

/// File store operations.
#[async_trait]
pub trait FilesApi: Send + Sync {
    /// Lists entries under a path.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, BackendFailure>;

    /// Reads a byte range of a file (whole file when offset/length are absent).
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn read(
        &self,
        path: &str,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<Vec<u8>, BackendFailure>;

    /// Writes bytes to a path.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn write(&self, path: &str, bytes: &[u8], overwrite: bool)
    -> Result<(), BackendFailure>;

    /// Deletes a path, optionally recursively.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn delete(&self, path: &str, recursive: bool) -> Result<(), BackendFailure>;

    /// Creates a directory (and missing parents).
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn mkdir(&self, path: &str) -> Result<(), BackendFailure>;
}

// ============================================================================
// SECTION: ML
// ============================================================================

/// Experiment listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    /// Backend experiment identifier.
    pub experiment_id: String,
    /// Display name.
    pub name: String,
}

/// Tracked-run listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlRunSummary {
    /// Backend run identifier.
    pub run_id: String,
    /// Backend status label when present.
    pub status: Option<String>,
}

/// Tracked-run detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlRunDetail {
    /// Backend run identifier.
    pub run_id: String,
    /// Backend status label when present.
    pub status: Option<String>,
    /// Logged metrics.
    pub metrics: Value,
    /// Logged parameters.
    pub params: Value,
}

/// Document upserted into a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    /// Caller-assigned document identifier.
    pub id: String,
    /// Document text.
    pub text: String,
    /// Optional structured metadata.
    pub metadata: Option<Value>,
}

/// Vector index query match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Matched document identifier.
    pub id: String,
    /// Similarity score.
    pub score: f64,
    /// Matched document text when the index stores it.
    pub text: Option<String>,
}

/// ML tracking, serving, and vector search operations.
#[async_trait]
pub trait MlApi: Send + Sync {
    /// Lists experiments.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list_experiments(&self) -> Result<Vec<ExperimentSummary>, BackendFailure>;

    /// Lists runs for an experiment with an optional backend filter string.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list_runs(
        &self,
        experiment_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<MlRunSummary>, BackendFailure>;

    /// Fetches one run's detail.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn get_run(&self, run_id: &str) -> Result<MlRunDetail, BackendFailure>;

    /// Sends input to a serving endpoint and returns its response.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn query_serving_endpoint(
        &self,
        name: &str,
        input: &Value,
    ) -> Result<Value, BackendFailure>;

    /// Upserts documents into a vector index; returns the accepted count.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn upsert_vector_index(
        &self,
        name: &str,
        docs: &[VectorDocument],
    ) -> Result<u64, BackendFailure>;

    /// Queries a vector index by text; returns the top `k` matches.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn query_vector_index(
        &self,
        name: &str,
        query: &str,
        k: u32,
    ) -> Result<Vec<VectorMatch>, BackendFailure>;
}

// ============================================================================
// SECTION: Secrets
// ============================================================================

/// Raw secret payload returned by the backend.
///
/// # Invariants
/// - Never logged, never embedded in error messages; only the enable-gated
///   `secrets.get_value` success path may carry it to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValue {
    /// Raw secret bytes.
    pub bytes: Vec<u8>,
}

/// Secret store operations.
#[async_trait]
pub trait SecretsApi: Send + Sync {
    /// Lists secret scopes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list_scopes(&self) -> Result<Vec<String>, BackendFailure>;

    /// Lists key names within a scope.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list_keys(&self, scope: &str) -> Result<Vec<String>, BackendFailure>;

    /// Fetches a secret value. Callers must enforce enable-gating upstream.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn get_value(&self, scope: &str, key: &str) -> Result<SecretValue, BackendFailure>;

    /// Creates or replaces a secret value.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn put_value(&self, scope: &str, key: &str, value: &str)
    -> Result<(), BackendFailure>;

    /// Deletes a secret.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn delete_value(&self, scope: &str, key: &str) -> Result<(), BackendFailure>;
}

// ============================================================================
// SECTION: Workspace
// ============================================================================

/// Workspace tree entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceItem {
    /// Absolute workspace path.
    pub path: String,
    /// Object type label (e.g. `NOTEBOOK`, `DIRECTORY`).
    pub object_type: String,
    /// Notebook language when applicable.
    pub language: Option<String>,
}

/// Workspace browsing operations.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Lists workspace items under a path.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn list_items(&self, path: &str) -> Result<Vec<WorkspaceItem>, BackendFailure>;

    /// Exports a notebook's source text.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the platform call fails.
    async fn export_notebook(&self, path: &str) -> Result<String, BackendFailure>;
}

// ============================================================================
// SECTION: Aggregate Client
// ============================================================================

/// The full platform surface consumed by the gateway, injected once at
/// startup and shared by every handler.
pub trait PlatformClient:
    ComputeApi + SqlApi + JobsApi + FilesApi + MlApi + SecretsApi + WorkspaceApi
{
}

impl<T> PlatformClient for T where
    T: ComputeApi + SqlApi + JobsApi + FilesApi + MlApi + SecretsApi + WorkspaceApi
{
}
