// crates/lakegate-mcp/src/catalog/tests.rs
// ============================================================================
// Module: Catalog Unit Tests
// Description: Tests for capability registration and handler behavior.
// Purpose: Validate catalog shape, wait strategies, and parameter rules.
// Dependencies: lakegate-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Exercises the assembled catalog against an in-memory platform fake:
//! discovery shape, token and block wait strategies, the one-of rule for
//! job targets, base64 handling, and the secrets value gate.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use lakegate_config::OperationsConfig;
use lakegate_config::WaitStrategy;
use lakegate_core::BackendFailure;
use lakegate_core::BackendPhase;
use lakegate_core::BackendRef;
use lakegate_core::CapabilityKind;
use lakegate_core::ClusterDetail;
use lakegate_core::ClusterSummary;
use lakegate_core::ComputeApi;
use lakegate_core::Enablement;
use lakegate_core::ErrorMapper;
use lakegate_core::ExperimentSummary;
use lakegate_core::FacadeStatusPoller;
use lakegate_core::FileEntry;
use lakegate_core::FilesApi;
use lakegate_core::FlagSet;
use lakegate_core::GatewayError;
use lakegate_core::InvocationContext;
use lakegate_core::JobRef;
use lakegate_core::JobsApi;
use lakegate_core::MlApi;
use lakegate_core::MlRunDetail;
use lakegate_core::MlRunSummary;
use lakegate_core::OperationTracker;
use lakegate_core::Principal;
use lakegate_core::Redactor;
use lakegate_core::RunStatus;
use lakegate_core::SecretValue;
use lakegate_core::SecretsApi;
use lakegate_core::SqlApi;
use lakegate_core::StatementResult;
use lakegate_core::StatementSubmission;
use lakegate_core::SystemClock;
use lakegate_core::VectorDocument;
use lakegate_core::VectorMatch;
use lakegate_core::WorkspaceApi;
use lakegate_core::WorkspaceItem;
use serde_json::Value;
use serde_json::json;

use super::Services;
use super::build_registry;

// ============================================================================
// SECTION: Platform Fake
// ============================================================================

/// In-memory platform with canned responses and recorded writes.
#[derive(Default)]
struct FakePlatform {
    /// Cluster states served by successive `get_cluster` calls; the last
    /// entry repeats once the script is exhausted.
    cluster_states: Mutex<VecDeque<String>>,
    /// Recorded job triggers.
    triggered: Mutex<Vec<JobRef>>,
    /// Recorded file writes as `(path, bytes, overwrite)`.
    written: Mutex<Vec<(String, Vec<u8>, bool)>>,
    /// Recorded secret puts as `(scope, key)`.
    stored_secrets: Mutex<Vec<(String, String)>>,
}

impl FakePlatform {
    /// Scripts the cluster states returned by `get_cluster`.
    fn with_cluster_states(states: &[&str]) -> Self {
        Self {
            cluster_states: Mutex::new(states.iter().map(|s| (*s).to_owned()).collect()),
            ..Self::default()
        }
    }

    /// Pops the next scripted cluster state, defaulting to `RUNNING`.
    fn next_cluster_state(&self) -> String {
        let mut states = self.cluster_states.lock().expect("states lock");
        if states.len() > 1 {
            states.pop_front().expect("scripted state")
        } else {
            states.front().cloned().unwrap_or_else(|| "RUNNING".to_owned())
        }
    }
}

#[async_trait]
impl ComputeApi for FakePlatform {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, BackendFailure> {
        Ok(vec![ClusterSummary {
            cluster_id: "c-1".to_owned(),
            cluster_name: "etl".to_owned(),
            state: "RUNNING".to_owned(),
        }])
    }

    async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterDetail, BackendFailure> {
        Ok(ClusterDetail {
            cluster_id: cluster_id.to_owned(),
            cluster_name: "etl".to_owned(),
            state: self.next_cluster_state(),
            spark_version: Some("15.4.x".to_owned()),
            num_workers: Some(2),
            state_message: None,
        })
    }

    async fn start_cluster(&self, cluster_id: &str) -> Result<BackendRef, BackendFailure> {
        Ok(BackendRef::new(cluster_id))
    }

    async fn terminate_cluster(&self, cluster_id: &str) -> Result<BackendRef, BackendFailure> {
        Ok(BackendRef::new(cluster_id))
    }
}

#[async_trait]
impl SqlApi for FakePlatform {
    async fn submit_statement(
        &self,
        _submission: &StatementSubmission,
    ) -> Result<BackendRef, BackendFailure> {
        Ok(BackendRef::new("stmt-1"))
    }

    async fn get_statement_result(
        &self,
        _backend_ref: &BackendRef,
    ) -> Result<StatementResult, BackendFailure> {
        Ok(StatementResult {
            phase: BackendPhase::Succeeded,
            schema: Some(json!([{ "name": "n", "type": "INT" }])),
            rows: Some(json!([["1"]])),
            error: None,
        })
    }
}

#[async_trait]
impl JobsApi for FakePlatform {
    async fn trigger_run(
        &self,
        job: &JobRef,
        _params: &BTreeMap<String, String>,
    ) -> Result<BackendRef, BackendFailure> {
        self.triggered.lock().expect("triggered lock").push(job.clone());
        Ok(BackendRef::new("run-1"))
    }

    async fn get_run_status(
        &self,
        _backend_ref: &BackendRef,
    ) -> Result<RunStatus, BackendFailure> {
        Ok(RunStatus {
            phase: BackendPhase::Succeeded,
            message: None,
            output: None,
        })
    }
}

#[async_trait]
impl FilesApi for FakePlatform {
    async fn list(&self, path: &str) -> Result<Vec<FileEntry>, BackendFailure> {
        Ok(vec![FileEntry {
            path: format!("{path}/data.csv"),
            is_dir: false,
            size: Some(42),
        }])
    }

    async fn read(
        &self,
        _path: &str,
        _offset: Option<u64>,
        _length: Option<u64>,
    ) -> Result<Vec<u8>, BackendFailure> {
        Ok(b"hello".to_vec())
    }

    async fn write(
        &self,
        path: &str,
        bytes: &[u8],
        overwrite: bool,
    ) -> Result<(), BackendFailure> {
        self.written
            .lock()
            .expect("written lock")
            .push((path.to_owned(), bytes.to_vec(), overwrite));
        Ok(())
    }

    async fn delete(&self, _path: &str, _recursive: bool) -> Result<(), BackendFailure> {
        Ok(())
    }

    async fn mkdir(&self, _path: &str) -> Result<(), BackendFailure> {
        Ok(())
    }
}

#[async_trait]
impl MlApi for FakePlatform {
    async fn list_experiments(&self) -> Result<Vec<ExperimentSummary>, BackendFailure> {
        Ok(vec![ExperimentSummary {
            experiment_id: "e-1".to_owned(),
            name: "churn".to_owned(),
        }])
    }

    async fn list_runs(
        &self,
        _experiment_id: &str,
        _filter: Option<&str>,
    ) -> Result<Vec<MlRunSummary>, BackendFailure> {
        Ok(vec![MlRunSummary {
            run_id: "r-1".to_owned(),
            status: Some("FINISHED".to_owned()),
        }])
    }

    async fn get_run(&self, run_id: &str) -> Result<MlRunDetail, BackendFailure> {
        Ok(MlRunDetail {
            run_id: run_id.to_owned(),
            status: Some("FINISHED".to_owned()),
            metrics: json!({ "auc": 0.91 }),
            params: json!({ "depth": "6" }),
        })
    }

    async fn query_serving_endpoint(
        &self,
        _name: &str,
        input: &Value,
    ) -> Result<Value, BackendFailure> {
        Ok(json!({ "echo": input }))
    }

    async fn upsert_vector_index(
        &self,
        _name: &str,
        docs: &[VectorDocument],
    ) -> Result<u64, BackendFailure> {
        Ok(docs.len() as u64)
    }

    async fn query_vector_index(
        &self,
        _name: &str,
        _query: &str,
        _k: u32,
    ) -> Result<Vec<VectorMatch>, BackendFailure> {
        Ok(vec![VectorMatch {
            id: "doc-1".to_owned(),
            score: 0.87,
            text: Some("first match".to_owned()),
        }])
    }
}

#[async_trait]
impl SecretsApi for FakePlatform {
    async fn list_scopes(&self) -> Result<Vec<String>, BackendFailure> {
        Ok(vec!["alpha".to_owned()])
    }

    async fn list_keys(&self, _scope: &str) -> Result<Vec<String>, BackendFailure> {
        Ok(vec!["api-key".to_owned()])
    }

    async fn get_value(&self, _scope: &str, _key: &str) -> Result<SecretValue, BackendFailure> {
        Ok(SecretValue {
            bytes: b"s3cret-bytes".to_vec(),
        })
    }

    async fn put_value(
        &self,
        scope: &str,
        key: &str,
        _value: &str,
    ) -> Result<(), BackendFailure> {
        self.stored_secrets
            .lock()
            .expect("secrets lock")
            .push((scope.to_owned(), key.to_owned()));
        Ok(())
    }

    async fn delete_value(&self, _scope: &str, _key: &str) -> Result<(), BackendFailure> {
        Ok(())
    }
}

#[async_trait]
impl WorkspaceApi for FakePlatform {
    async fn list_items(&self, path: &str) -> Result<Vec<WorkspaceItem>, BackendFailure> {
        Ok(vec![WorkspaceItem {
            path: format!("{path}/report"),
            object_type: "NOTEBOOK".to_owned(),
            language: Some("PYTHON".to_owned()),
        }])
    }

    async fn export_notebook(&self, _path: &str) -> Result<String, BackendFailure> {
        Ok("print(1)".to_owned())
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Builds services over a fake platform with the given strategy overrides.
fn services_with(
    platform: Arc<FakePlatform>,
    strategy: &[(&str, WaitStrategy)],
) -> Arc<Services> {
    let mapper = ErrorMapper::new(Redactor::new(&[]));
    let mut operations = OperationsConfig::default();
    for (domain, choice) in strategy {
        operations.strategy.insert((*domain).to_owned(), *choice);
    }
    let tracker = Arc::new(OperationTracker::new(
        operations.to_core(),
        Arc::new(FacadeStatusPoller::new(platform.clone())),
        mapper.clone(),
        Arc::new(SystemClock),
    ));
    Arc::new(Services {
        platform,
        tracker,
        operations,
        mapper,
    })
}

/// Invokes a capability directly through the registry.
async fn invoke(
    services: &Arc<Services>,
    name: &str,
    params: Value,
) -> Result<Value, GatewayError> {
    let registry =
        build_registry(services, Arc::new(FlagSet::new(BTreeMap::new()))).expect("registry");
    let descriptor = registry.resolve(name).expect("resolvable capability");
    let principal = Principal::new("tester");
    let ctx = InvocationContext {
        principal: &principal,
        correlation_id: "lg-test-00000001",
    };
    descriptor.handler.invoke(ctx, params).await
}

// ============================================================================
// SECTION: Discovery Tests
// ============================================================================

#[test]
fn catalog_registers_the_full_surface() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let registry =
        build_registry(&services, Arc::new(FlagSet::new(BTreeMap::new()))).expect("registry");

    let tool_names: Vec<&str> =
        registry.list(Some(CapabilityKind::Tool)).map(|t| t.name.as_str()).collect();
    assert!(tool_names.contains(&"compute.start_cluster"));
    assert!(tool_names.contains(&"sql.execute_statement"));
    assert!(tool_names.contains(&"jobs.run_now"));
    assert!(tool_names.contains(&"files.write"));
    assert!(tool_names.contains(&"ml.query_vector_index"));
    assert!(tool_names.contains(&"operations.await"));
    // Disabled by default, so absent from discovery.
    assert!(!tool_names.contains(&"secrets.get_value"));

    let resource_names: Vec<&str> =
        registry.list(Some(CapabilityKind::Resource)).map(|r| r.name.as_str()).collect();
    assert!(resource_names.contains(&"compute.clusters"));
    assert!(resource_names.contains(&"workspace.notebook"));
    assert_eq!(resource_names.len(), 9);

    let prompts: Vec<_> = registry.list(Some(CapabilityKind::Prompt)).collect();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].name, "prompts.analyze_table");
}

#[test]
fn secrets_get_value_is_resolvable_while_disabled() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let registry =
        build_registry(&services, Arc::new(FlagSet::new(BTreeMap::new()))).expect("registry");
    let descriptor = registry.resolve("secrets.get_value").expect("resolvable");
    assert_eq!(descriptor.enablement, Enablement::Flag("secrets.get_value".to_owned()));
    assert!(!registry.is_enabled(descriptor));
}

// ============================================================================
// SECTION: Wait Strategy Tests
// ============================================================================

#[tokio::test]
async fn start_cluster_returns_a_token_by_default() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result = invoke(&services, "compute.start_cluster", json!({ "cluster_id": "c-1" }))
        .await
        .expect("submission");
    assert_eq!(result["state"], "pending");
    let id = result["operation_id"].as_str().expect("operation id");
    assert!(id.starts_with("op-"));
    assert_eq!(services.tracker.tracked_operations(), 1);
}

#[tokio::test]
async fn start_cluster_blocks_to_terminal_when_configured() {
    let platform = Arc::new(FakePlatform::with_cluster_states(&["RUNNING"]));
    let services =
        services_with(platform, &[("cluster_start", WaitStrategy::Block)]);
    let result = invoke(&services, "compute.start_cluster", json!({ "cluster_id": "c-1" }))
        .await
        .expect("blocking submission");
    assert_eq!(result["state"], "succeeded");
    assert_eq!(result["result"]["state"], "RUNNING");
}

#[tokio::test]
async fn operations_poll_reads_a_submitted_handle() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let submitted = invoke(&services, "compute.start_cluster", json!({ "cluster_id": "c-1" }))
        .await
        .expect("submission");
    let id = submitted["operation_id"].as_str().expect("operation id");
    let snapshot = invoke(&services, "operations.poll", json!({ "operation_id": id }))
        .await
        .expect("poll");
    assert_eq!(snapshot["id"], id);
    assert_eq!(snapshot["domain"], "cluster_start");
}

// ============================================================================
// SECTION: Parameter Rule Tests
// ============================================================================

#[tokio::test]
async fn run_now_requires_exactly_one_target() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);

    let both = invoke(
        &services,
        "jobs.run_now",
        json!({ "job_id": 7, "notebook_path": "/nb", "params": {} }),
    )
    .await;
    let Err(GatewayError::InvalidParameters { fields, .. }) = both else {
        panic!("expected invalid parameters for double target");
    };
    assert_eq!(fields, vec!["job_id".to_owned(), "notebook_path".to_owned()]);

    let neither = invoke(&services, "jobs.run_now", json!({ "params": {} })).await;
    assert!(matches!(neither, Err(GatewayError::InvalidParameters { .. })));
}

#[tokio::test]
async fn run_now_rejects_non_string_parameter_values() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result = invoke(
        &services,
        "jobs.run_now",
        json!({ "job_id": 7, "params": { "limit": 5 } }),
    )
    .await;
    let Err(GatewayError::InvalidParameters { fields, .. }) = result else {
        panic!("expected invalid parameters for non-string value");
    };
    assert_eq!(fields, vec!["params".to_owned()]);
}

#[tokio::test]
async fn run_now_records_the_chosen_target() {
    let platform = Arc::new(FakePlatform::default());
    let services = services_with(platform.clone(), &[]);
    invoke(&services, "jobs.run_now", json!({ "notebook_path": "/nb/etl", "params": {} }))
        .await
        .expect("submission");
    let triggered = platform.triggered.lock().expect("triggered lock");
    assert_eq!(*triggered, vec![JobRef::NotebookPath("/nb/etl".to_owned())]);
}

#[tokio::test]
async fn files_write_decodes_base64_content() {
    let platform = Arc::new(FakePlatform::default());
    let services = services_with(platform.clone(), &[]);
    let result = invoke(
        &services,
        "files.write",
        json!({ "path": "/tmp/a.txt", "content": "aGVsbG8=", "overwrite": true }),
    )
    .await
    .expect("write");
    assert_eq!(result["bytes_written"], 5);
    let written = platform.written.lock().expect("written lock");
    assert_eq!(written[0], ("/tmp/a.txt".to_owned(), b"hello".to_vec(), true));
}

#[tokio::test]
async fn files_write_rejects_malformed_base64() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result = invoke(
        &services,
        "files.write",
        json!({ "path": "/tmp/a.txt", "content": "%%%", "overwrite": false }),
    )
    .await;
    let Err(GatewayError::InvalidParameters { fields, .. }) = result else {
        panic!("expected invalid parameters for malformed base64");
    };
    assert_eq!(fields, vec!["content".to_owned()]);
}

#[tokio::test]
async fn vector_upsert_rejects_malformed_documents() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result = invoke(
        &services,
        "ml.upsert_vector_index",
        json!({ "name": "idx", "documents": [{ "id": "d1" }] }),
    )
    .await;
    let Err(GatewayError::InvalidParameters { fields, .. }) = result else {
        panic!("expected invalid parameters for document without text");
    };
    assert_eq!(fields, vec!["documents".to_owned()]);
}

#[tokio::test]
async fn vector_query_returns_named_matches() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result = invoke(
        &services,
        "ml.query_vector_index",
        json!({ "name": "idx", "query": "churn drivers", "k": 10 }),
    )
    .await
    .expect("query");
    assert_eq!(result["matches"][0]["id"], "doc-1");
}

// ============================================================================
// SECTION: Secrets and Prompt Tests
// ============================================================================

#[tokio::test]
async fn secret_value_is_returned_as_base64() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result =
        invoke(&services, "secrets.get_value", json!({ "scope": "alpha", "key": "api-key" }))
            .await
            .expect("value read");
    assert_eq!(result["value_base64"], "czNjcmV0LWJ5dGVz");
    assert!(result.get("value").is_none());
}

#[tokio::test]
async fn secret_put_never_echoes_the_value() {
    let platform = Arc::new(FakePlatform::default());
    let services = services_with(platform.clone(), &[]);
    let result = invoke(
        &services,
        "secrets.put_value",
        json!({ "scope": "alpha", "key": "api-key", "value": "hunter2" }),
    )
    .await
    .expect("put");
    assert_eq!(result["status"], "stored");
    assert!(!result.to_string().contains("hunter2"));
    let stored = platform.stored_secrets.lock().expect("secrets lock");
    assert_eq!(*stored, vec![("alpha".to_owned(), "api-key".to_owned())]);
}

#[tokio::test]
async fn analyze_table_prompt_renders_the_workflow() {
    let services = services_with(Arc::new(FakePlatform::default()), &[]);
    let result = invoke(
        &services,
        "prompts.analyze_table",
        json!({
            "catalog": "main",
            "schema": "sales",
            "table": "orders",
            "analysis_goal": "find churn drivers",
        }),
    )
    .await
    .expect("prompt");
    let text = result["messages"][0]["content"]["text"].as_str().expect("text");
    assert!(text.contains("`main`.`sales`.`orders`"));
    assert!(text.contains("find churn drivers"));
    assert!(text.contains("sql.execute_statement"));
}
