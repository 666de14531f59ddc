// crates/lakegate-platform/src/client.rs
// ============================================================================
// Module: REST Platform Client
// Description: Facade implementation over the lakehouse REST API.
// Purpose: Translate facade calls into HTTP and responses into shapes.
// Dependencies: base64, lakegate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! One `reqwest` client with bounded connect and request timeouts serves
//! every domain. Failure classification is shape-driven at this boundary:
//! the HTTP status class selects the [`BackendFailure`] variant, and the
//! response body only ever contributes display text. Nothing above this
//! module sees a raw platform payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lakegate_core::BackendFailure;
use lakegate_core::BackendRef;
use lakegate_core::facade::BackendPhase;
use lakegate_core::facade::ClusterDetail;
use lakegate_core::facade::ClusterSummary;
use lakegate_core::facade::ComputeApi;
use lakegate_core::facade::ExperimentSummary;
use lakegate_core::facade::FileEntry;
use lakegate_core::facade::FilesApi;
use lakegate_core::facade::JobRef;
use lakegate_core::facade::JobsApi;
use lakegate_core::facade::MlApi;
use lakegate_core::facade::MlRunDetail;
use lakegate_core::facade::MlRunSummary;
use lakegate_core::facade::RunStatus;
use lakegate_core::facade::SecretValue;
use lakegate_core::facade::SecretsApi;
use lakegate_core::facade::SqlApi;
use lakegate_core::facade::StatementResult;
use lakegate_core::facade::StatementSubmission;
use lakegate_core::facade::VectorDocument;
use lakegate_core::facade::VectorMatch;
use lakegate_core::facade::WorkspaceApi;
use lakegate_core::facade::WorkspaceItem;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Longest backend error body excerpt carried into failure messages.
const MAX_ERROR_EXCERPT: usize = 512;
/// Default page size for experiment and run searches.
const SEARCH_PAGE_SIZE: u32 = 100;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Facade implementation over the lakehouse workspace REST API.
pub struct RestPlatformClient {
    /// Workspace base URL, no trailing slash.
    base_url: String,
    /// Bearer token; never logged, never echoed into failures.
    token: String,
    /// HTTP client with connect and request timeouts applied.
    client: Client,
}

impl RestPlatformClient {
    /// Builds a client for the given workspace.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure::Unavailable`] when the HTTP client cannot
    /// be constructed.
    pub fn new(
        mut base_url: String,
        token: String,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, BackendFailure> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|err| BackendFailure::Unavailable {
                message: err.to_string(),
            })?;
        let trimmed_len = base_url.trim_end_matches('/').len();
        base_url.truncate(trimmed_len);
        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// Issues a GET with query parameters and decodes the JSON body.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, BackendFailure> {
        let builder = self.client.get(format!("{}{path}", self.base_url)).query(query);
        self.execute(builder).await
    }

    /// Issues a POST with a JSON body and decodes the JSON response.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendFailure> {
        let builder = self.client.post(format!("{}{path}", self.base_url)).json(body);
        self.execute(builder).await
    }

    /// Sends one request and classifies the response by status class.
    async fn execute(&self, builder: RequestBuilder) -> Result<Value, BackendFailure> {
        let response =
            builder.bearer_auth(&self.token).send().await.map_err(|err| {
                BackendFailure::Unavailable {
                    message: err.to_string(),
                }
            })?;
        let status = response.status();
        let retry_after_ms = retry_after_ms(&response);
        let bytes = response.bytes().await.map_err(|err| BackendFailure::Unavailable {
            message: err.to_string(),
        })?;
        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes).map_err(|err| BackendFailure::Unclassified {
                message: format!("malformed backend response: {err}"),
            });
        }
        Err(classify_status(status, retry_after_ms, &error_excerpt(&bytes)))
    }
}

/// Reads a `Retry-After` header in seconds, when present.
fn retry_after_ms(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(|seconds| seconds.saturating_mul(1_000))
}

/// Maps an HTTP status class to a failure shape.
fn classify_status(status: StatusCode, retry_after_ms: Option<u64>, detail: &str) -> BackendFailure {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendFailure::PermissionDenied {
            message: detail.to_string(),
        },
        StatusCode::NOT_FOUND => BackendFailure::NotFound {
            resource: detail.to_string(),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => BackendFailure::Malformed {
            message: detail.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => BackendFailure::Throttled {
            message: detail.to_string(),
            retry_after_ms,
        },
        status if status.is_server_error() => BackendFailure::Unavailable {
            message: detail.to_string(),
        },
        status => BackendFailure::Unclassified {
            message: format!("unexpected status {status}: {detail}"),
        },
    }
}

/// Extracts display text from an error body: the `message` field of a JSON
/// document when present, otherwise a bounded raw excerpt.
fn error_excerpt(bytes: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return truncate(message);
        }
    }
    truncate(&String::from_utf8_lossy(bytes))
}

/// Bounds an excerpt to [`MAX_ERROR_EXCERPT`] characters.
fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_EXCERPT).collect()
}

/// Decodes a typed wire document from a JSON value.
fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, BackendFailure> {
    serde_json::from_value(value).map_err(|err| BackendFailure::Unclassified {
        message: format!("malformed backend response: {err}"),
    })
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// `clusters/list` response.
#[derive(Debug, Deserialize)]
struct ClusterListDoc {
    /// Cluster entries; absent when the workspace has none.
    #[serde(default)]
    clusters: Vec<ClusterDoc>,
}

/// One cluster document.
#[derive(Debug, Deserialize)]
struct ClusterDoc {
    /// Backend cluster identifier.
    cluster_id: String,
    /// Display name.
    #[serde(default)]
    cluster_name: String,
    /// Lifecycle state label.
    #[serde(default)]
    state: String,
    /// Runtime version.
    #[serde(default)]
    spark_version: Option<String>,
    /// Worker count.
    #[serde(default)]
    num_workers: Option<u32>,
    /// State detail message.
    #[serde(default)]
    state_message: Option<String>,
}

/// `sql/statements` submission response.
#[derive(Debug, Deserialize)]
struct StatementSubmitDoc {
    /// Backend statement identifier.
    statement_id: String,
}

/// Statement status document.
#[derive(Debug, Deserialize)]
struct StatementStatusDoc {
    /// Status block.
    status: StatementStateDoc,
    /// Result schema manifest.
    #[serde(default)]
    manifest: Option<Value>,
    /// Result rows.
    #[serde(default)]
    result: Option<Value>,
}

/// Statement status block.
#[derive(Debug, Deserialize)]
struct StatementStateDoc {
    /// State label.
    state: String,
    /// Error block when failed.
    #[serde(default)]
    error: Option<StatementErrorDoc>,
}

/// Statement error block.
#[derive(Debug, Deserialize)]
struct StatementErrorDoc {
    /// Failure message.
    #[serde(default)]
    message: Option<String>,
}

/// Job trigger response.
#[derive(Debug, Deserialize)]
struct RunSubmitDoc {
    /// Backend run identifier.
    run_id: u64,
}

/// Job run status document.
#[derive(Debug, Deserialize)]
struct RunStatusDoc {
    /// Run state block.
    #[serde(default)]
    state: Option<RunStateDoc>,
    /// Run output when the backend includes it.
    #[serde(default)]
    output: Option<Value>,
}

/// Job run state block.
#[derive(Debug, Deserialize, Default)]
struct RunStateDoc {
    /// Coarse lifecycle label.
    #[serde(default)]
    life_cycle_state: String,
    /// Terminal result label.
    #[serde(default)]
    result_state: Option<String>,
    /// Human-readable state detail.
    #[serde(default)]
    state_message: Option<String>,
}

/// File store listing response.
#[derive(Debug, Deserialize)]
struct FileListDoc {
    /// Entries; absent for an empty directory.
    #[serde(default)]
    files: Vec<FileDoc>,
}

/// One file store entry.
#[derive(Debug, Deserialize)]
struct FileDoc {
    /// Absolute path.
    path: String,
    /// Directory marker.
    #[serde(default)]
    is_dir: bool,
    /// Size in bytes.
    #[serde(default)]
    file_size: Option<u64>,
}

/// File read response.
#[derive(Debug, Deserialize)]
struct FileReadDoc {
    /// Base64-encoded chunk.
    #[serde(default)]
    data: String,
}

/// Experiment search response.
#[derive(Debug, Deserialize)]
struct ExperimentSearchDoc {
    /// Experiment entries.
    #[serde(default)]
    experiments: Vec<ExperimentDoc>,
}

/// One experiment document.
#[derive(Debug, Deserialize)]
struct ExperimentDoc {
    /// Backend experiment identifier.
    experiment_id: String,
    /// Display name.
    #[serde(default)]
    name: String,
}

/// Run search response.
#[derive(Debug, Deserialize)]
struct RunSearchDoc {
    /// Run entries.
    #[serde(default)]
    runs: Vec<MlRunDoc>,
}

/// One tracked-run document.
#[derive(Debug, Deserialize)]
struct MlRunDoc {
    /// Run info block.
    info: MlRunInfoDoc,
    /// Run data block.
    #[serde(default)]
    data: Option<Value>,
}

/// Tracked-run info block.
#[derive(Debug, Deserialize)]
struct MlRunInfoDoc {
    /// Backend run identifier.
    run_id: String,
    /// Status label.
    #[serde(default)]
    status: Option<String>,
}

/// Single-run fetch response.
#[derive(Debug, Deserialize)]
struct MlRunGetDoc {
    /// The run document.
    run: MlRunDoc,
}

/// Vector upsert response.
#[derive(Debug, Deserialize)]
struct VectorUpsertDoc {
    /// Result block.
    #[serde(default)]
    result: VectorUpsertResultDoc,
}

/// Vector upsert result block.
#[derive(Debug, Deserialize, Default)]
struct VectorUpsertResultDoc {
    /// Accepted row count.
    #[serde(default)]
    success_row_count: u64,
}

/// Vector query response.
#[derive(Debug, Deserialize)]
struct VectorQueryDoc {
    /// Result block.
    #[serde(default)]
    result: VectorQueryResultDoc,
}

/// Vector query result block: rows of `[id, text, score]`.
#[derive(Debug, Deserialize, Default)]
struct VectorQueryResultDoc {
    /// Match rows.
    #[serde(default)]
    data_array: Vec<Vec<Value>>,
}

/// Secret scope listing response.
#[derive(Debug, Deserialize)]
struct ScopeListDoc {
    /// Scope entries.
    #[serde(default)]
    scopes: Vec<ScopeDoc>,
}

/// One secret scope.
#[derive(Debug, Deserialize)]
struct ScopeDoc {
    /// Scope name.
    name: String,
}

/// Secret key listing response.
#[derive(Debug, Deserialize)]
struct SecretListDoc {
    /// Key entries.
    #[serde(default)]
    secrets: Vec<SecretKeyDoc>,
}

/// One secret key entry.
#[derive(Debug, Deserialize)]
struct SecretKeyDoc {
    /// Key name.
    key: String,
}

/// Secret fetch response.
#[derive(Debug, Deserialize)]
struct SecretValueDoc {
    /// Base64-encoded value.
    value: String,
}

/// Workspace listing response.
#[derive(Debug, Deserialize)]
struct WorkspaceListDoc {
    /// Item entries.
    #[serde(default)]
    objects: Vec<WorkspaceObjectDoc>,
}

/// One workspace item.
#[derive(Debug, Deserialize)]
struct WorkspaceObjectDoc {
    /// Absolute workspace path.
    path: String,
    /// Object type label.
    #[serde(default)]
    object_type: String,
    /// Notebook language.
    #[serde(default)]
    language: Option<String>,
}

/// Notebook export response.
#[derive(Debug, Deserialize)]
struct NotebookExportDoc {
    /// Base64-encoded notebook source.
    #[serde(default)]
    content: String,
}

// ============================================================================
// SECTION: Phase Mapping
// ============================================================================

/// Maps a statement state label to a phase.
fn statement_phase(state: &str) -> BackendPhase {
    match state {
        "SUCCEEDED" => BackendPhase::Succeeded,
        "FAILED" => BackendPhase::Failed,
        "CANCELED" | "CLOSED" => BackendPhase::Cancelled,
        "PENDING" => BackendPhase::Pending,
        _ => BackendPhase::Running,
    }
}

/// Maps a run lifecycle and result label pair to a phase.
fn run_phase(state: &RunStateDoc) -> BackendPhase {
    match state.life_cycle_state.as_str() {
        "PENDING" | "QUEUED" | "BLOCKED" => BackendPhase::Pending,
        "TERMINATED" | "INTERNAL_ERROR" => match state.result_state.as_deref() {
            Some("SUCCESS") => BackendPhase::Succeeded,
            Some("CANCELED") | Some("TIMEDOUT") => BackendPhase::Cancelled,
            _ => BackendPhase::Failed,
        },
        "SKIPPED" => BackendPhase::Cancelled,
        _ => BackendPhase::Running,
    }
}

/// Decodes a base64 payload field.
fn decode_base64(data: &str, what: &str) -> Result<Vec<u8>, BackendFailure> {
    BASE64.decode(data).map_err(|err| BackendFailure::Unclassified {
        message: format!("malformed base64 {what}: {err}"),
    })
}

// ============================================================================
// SECTION: Compute
// ============================================================================

#[async_trait]
impl ComputeApi for RestPlatformClient {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, BackendFailure> {
        let doc: ClusterListDoc = decode(self.get_json("/api/2.1/clusters/list", &[]).await?)?;
        Ok(doc
            .clusters
            .into_iter()
            .map(|cluster| ClusterSummary {
                cluster_id: cluster.cluster_id,
                cluster_name: cluster.cluster_name,
                state: cluster.state,
            })
            .collect())
    }

    async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterDetail, BackendFailure> {
        let doc: ClusterDoc = decode(
            self.get_json("/api/2.1/clusters/get", &[("cluster_id", cluster_id.to_string())])
                .await?,
        )?;
        Ok(ClusterDetail {
            cluster_id: doc.cluster_id,
            cluster_name: doc.cluster_name,
            state: doc.state,
            spark_version: doc.spark_version,
            num_workers: doc.num_workers,
            state_message: doc.state_message,
        })
    }

    async fn start_cluster(&self, cluster_id: &str) -> Result<BackendRef, BackendFailure> {
        self.post_json("/api/2.1/clusters/start", &json!({"cluster_id": cluster_id})).await?;
        Ok(BackendRef::new(cluster_id))
    }

    async fn terminate_cluster(&self, cluster_id: &str) -> Result<BackendRef, BackendFailure> {
        self.post_json("/api/2.1/clusters/delete", &json!({"cluster_id": cluster_id})).await?;
        Ok(BackendRef::new(cluster_id))
    }
}

// ============================================================================
// SECTION: SQL
// ============================================================================

#[async_trait]
impl SqlApi for RestPlatformClient {
    async fn submit_statement(
        &self,
        submission: &StatementSubmission,
    ) -> Result<BackendRef, BackendFailure> {
        let mut body = json!({
            "statement": submission.query,
            "warehouse_id": submission.warehouse_id,
            // Always submit asynchronously; the tracker owns waiting.
            "wait_timeout": "0s",
        });
        if let Some(catalog) = &submission.catalog {
            body["catalog"] = json!(catalog);
        }
        if let Some(schema) = &submission.schema {
            body["schema"] = json!(schema);
        }
        let doc: StatementSubmitDoc =
            decode(self.post_json("/api/2.0/sql/statements", &body).await?)?;
        Ok(BackendRef::new(&doc.statement_id))
    }

    async fn get_statement_result(
        &self,
        backend_ref: &BackendRef,
    ) -> Result<StatementResult, BackendFailure> {
        let doc: StatementStatusDoc = decode(
            self.get_json(&format!("/api/2.0/sql/statements/{}", backend_ref.as_str()), &[])
                .await?,
        )?;
        let phase = statement_phase(&doc.status.state);
        Ok(StatementResult {
            phase,
            schema: doc.manifest.and_then(|manifest| manifest.get("schema").cloned()),
            rows: doc.result.and_then(|result| result.get("data_array").cloned()),
            error: doc.status.error.and_then(|error| error.message),
        })
    }
}

// ============================================================================
// SECTION: Jobs
// ============================================================================

#[async_trait]
impl JobsApi for RestPlatformClient {
    async fn trigger_run(
        &self,
        job: &JobRef,
        params: &BTreeMap<String, String>,
    ) -> Result<BackendRef, BackendFailure> {
        let doc: RunSubmitDoc = match job {
            JobRef::JobId(job_id) => decode(
                self.post_json(
                    "/api/2.2/jobs/run-now",
                    &json!({"job_id": job_id, "job_parameters": params}),
                )
                .await?,
            )?,
            JobRef::NotebookPath(path) => decode(
                self.post_json(
                    "/api/2.2/jobs/runs/submit",
                    &json!({
                        "run_name": format!("lakegate:{path}"),
                        "tasks": [{
                            "task_key": "main",
                            "notebook_task": {
                                "notebook_path": path,
                                "base_parameters": params,
                            },
                        }],
                    }),
                )
                .await?,
            )?,
        };
        Ok(BackendRef::new(&doc.run_id.to_string()))
    }

    async fn get_run_status(
        &self,
        backend_ref: &BackendRef,
    ) -> Result<RunStatus, BackendFailure> {
        let doc: RunStatusDoc = decode(
            self.get_json("/api/2.2/jobs/runs/get", &[("run_id", backend_ref.as_str().to_string())])
                .await?,
        )?;
        let state = doc.state.unwrap_or_default();
        Ok(RunStatus {
            phase: run_phase(&state),
            message: state.state_message,
            output: doc.output,
        })
    }
}

// ============================================================================
// SECTION: Files
// ============================================================================

#[async_trait]
impl FilesApi for RestPlatformClient {
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, BackendFailure> {
        let doc: FileListDoc =
            decode(self.get_json("/api/2.0/dbfs/list", &[("path", path.to_string())]).await?)?;
        Ok(doc
            .files
            .into_iter()
            .map(|file| FileEntry {
                path: file.path,
                is_dir: file.is_dir,
                size: file.file_size,
            })
            .collect())
    }

    async fn read(
        &self,
        path: &str,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<Vec<u8>, BackendFailure> {
        let mut query = vec![("path", path.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(length) = length {
            query.push(("length", length.to_string()));
        }
        let doc: FileReadDoc = decode(self.get_json("/api/2.0/dbfs/read", &query).await?)?;
        decode_base64(&doc.data, "file chunk")
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        overwrite: bool,
    ) -> Result<(), BackendFailure> {
        self.post_json(
            "/api/2.0/dbfs/put",
            &json!({
                "path": path,
                "contents": BASE64.encode(bytes),
                "overwrite": overwrite,
            }),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, path: &str, recursive: bool) -> Result<(), BackendFailure> {
        self.post_json("/api/2.0/dbfs/delete", &json!({"path": path, "recursive": recursive}))
            .await?;
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<(), BackendFailure> {
        self.post_json("/api/2.0/dbfs/mkdirs", &json!({"path": path})).await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: ML
// ============================================================================

#[async_trait]
impl MlApi for RestPlatformClient {
    async fn list_experiments(&self) -> Result<Vec<ExperimentSummary>, BackendFailure> {
        let doc: ExperimentSearchDoc = decode(
            self.post_json(
                "/api/2.0/mlflow/experiments/search",
                &json!({"max_results": SEARCH_PAGE_SIZE}),
            )
            .await?,
        )?;
        Ok(doc
            .experiments
            .into_iter()
            .map(|experiment| ExperimentSummary {
                experiment_id: experiment.experiment_id,
                name: experiment.name,
            })
            .collect())
    }

    async fn list_runs(
        &self,
        experiment_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<MlRunSummary>, BackendFailure> {
        let mut body = json!({
            "experiment_ids": [experiment_id],
            "max_results": SEARCH_PAGE_SIZE,
        });
        if let Some(filter) = filter {
            body["filter"] = json!(filter);
        }
        let doc: RunSearchDoc =
            decode(self.post_json("/api/2.0/mlflow/runs/search", &body).await?)?;
        Ok(doc
            .runs
            .into_iter()
            .map(|run| MlRunSummary {
                run_id: run.info.run_id,
                status: run.info.status,
            })
            .collect())
    }

    async fn get_run(&self, run_id: &str) -> Result<MlRunDetail, BackendFailure> {
        let doc: MlRunGetDoc = decode(
            self.get_json("/api/2.0/mlflow/runs/get", &[("run_id", run_id.to_string())]).await?,
        )?;
        let data = doc.run.data.unwrap_or(Value::Null);
        Ok(MlRunDetail {
            run_id: doc.run.info.run_id,
            status: doc.run.info.status,
            metrics: data.get("metrics").cloned().unwrap_or(Value::Null),
            params: data.get("params").cloned().unwrap_or(Value::Null),
        })
    }

    async fn query_serving_endpoint(
        &self,
        name: &str,
        input: &Value,
    ) -> Result<Value, BackendFailure> {
        self.post_json(&format!("/serving-endpoints/{name}/invocations"), input).await
    }

    async fn upsert_vector_index(
        &self,
        name: &str,
        docs: &[VectorDocument],
    ) -> Result<u64, BackendFailure> {
        let doc: VectorUpsertDoc = decode(
            self.post_json(
                &format!("/api/2.0/vector-search/indexes/{name}/upsert-data"),
                &json!({"inputs": docs}),
            )
            .await?,
        )?;
        Ok(doc.result.success_row_count)
    }

    async fn query_vector_index(
        &self,
        name: &str,
        query: &str,
        k: u32,
    ) -> Result<Vec<VectorMatch>, BackendFailure> {
        let doc: VectorQueryDoc = decode(
            self.post_json(
                &format!("/api/2.0/vector-search/indexes/{name}/query"),
                &json!({
                    "query_text": query,
                    "num_results": k,
                    "columns": ["id", "text"],
                }),
            )
            .await?,
        )?;
        Ok(doc.result.data_array.iter().filter_map(|row| vector_match_from_row(row)).collect())
    }
}

/// Parses one `[id, text, score]` row into a match; malformed rows are
/// dropped rather than failing the whole response.
fn vector_match_from_row(row: &[Value]) -> Option<VectorMatch> {
    let id = row.first()?.as_str()?.to_string();
    let score = row.last()?.as_f64()?;
    let text = (row.len() > 2)
        .then(|| row.get(1).and_then(Value::as_str).map(str::to_string))
        .flatten();
    Some(VectorMatch {
        id,
        score,
        text,
    })
}

// ============================================================================
// SECTION: Secrets
// ============================================================================

#[async_trait]
impl SecretsApi for RestPlatformClient {
    async fn list_scopes(&self) -> Result<Vec<String>, BackendFailure> {
        let doc: ScopeListDoc =
            decode(self.get_json("/api/2.0/secrets/scopes/list", &[]).await?)?;
        Ok(doc.scopes.into_iter().map(|scope| scope.name).collect())
    }

    async fn list_keys(&self, scope: &str) -> Result<Vec<String>, BackendFailure> {
        let doc: SecretListDoc =
            decode(self.get_json("/api/2.0/secrets/list", &[("scope", scope.to_string())]).await?)?;
        Ok(doc.secrets.into_iter().map(|secret| secret.key).collect())
    }

    async fn get_value(&self, scope: &str, key: &str) -> Result<SecretValue, BackendFailure> {
        let doc: SecretValueDoc = decode(
            self.get_json(
                "/api/2.0/secrets/get",
                &[("scope", scope.to_string()), ("key", key.to_string())],
            )
            .await?,
        )?;
        Ok(SecretValue {
            bytes: decode_base64(&doc.value, "secret value")?,
        })
    }

    async fn put_value(
        &self,
        scope: &str,
        key: &str,
        value: &str,
    ) -> Result<(), BackendFailure> {
        self.post_json(
            "/api/2.0/secrets/put",
            &json!({"scope": scope, "key": key, "string_value": value}),
        )
        .await?;
        Ok(())
    }

    async fn delete_value(&self, scope: &str, key: &str) -> Result<(), BackendFailure> {
        self.post_json("/api/2.0/secrets/delete", &json!({"scope": scope, "key": key})).await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Workspace
// ============================================================================

#[async_trait]
impl WorkspaceApi for RestPlatformClient {
    async fn list_items(&self, path: &str) -> Result<Vec<WorkspaceItem>, BackendFailure> {
        let doc: WorkspaceListDoc =
            decode(self.get_json("/api/2.0/workspace/list", &[("path", path.to_string())]).await?)?;
        Ok(doc
            .objects
            .into_iter()
            .map(|object| WorkspaceItem {
                path: object.path,
                object_type: object.object_type,
                language: object.language,
            })
            .collect())
    }

    async fn export_notebook(&self, path: &str) -> Result<String, BackendFailure> {
        let doc: NotebookExportDoc = decode(
            self.get_json(
                "/api/2.0/workspace/export",
                &[("path", path.to_string()), ("format", "SOURCE".to_string())],
            )
            .await?,
        )?;
        let bytes = decode_base64(&doc.content, "notebook content")?;
        String::from_utf8(bytes).map_err(|_| BackendFailure::Unclassified {
            message: "notebook content is not utf-8".to_string(),
        })
    }
}
