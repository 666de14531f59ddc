// crates/lakegate-mcp/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared platform fake and server harness for gateway tests.
// Purpose: Drive the full server pipeline without a real backend.
// Dependencies: lakegate-config, lakegate-core, lakegate-mcp
// ============================================================================

//! ## Overview
//! Provides an in-memory platform client with scriptable cluster states and
//! a helper that assembles a [`GatewayServer`] over it from TOML snippets.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::cast_possible_truncation,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use lakegate_config::GatewayConfig;
use lakegate_core::BackendFailure;
use lakegate_core::BackendPhase;
use lakegate_core::BackendRef;
use lakegate_core::ClusterDetail;
use lakegate_core::ClusterSummary;
use lakegate_core::ComputeApi;
use lakegate_core::ExperimentSummary;
use lakegate_core::FileEntry;
use lakegate_core::FilesApi;
use lakegate_core::JobRef;
use lakegate_core::JobsApi;
use lakegate_core::MlApi;
use lakegate_core::MlRunDetail;
use lakegate_core::MlRunSummary;
use lakegate_core::RunStatus;
use lakegate_core::SecretValue;
use lakegate_core::SecretsApi;
use lakegate_core::SqlApi;
use lakegate_core::StatementResult;
use lakegate_core::StatementSubmission;
use lakegate_core::VectorDocument;
use lakegate_core::VectorMatch;
use lakegate_core::WorkspaceApi;
use lakegate_core::WorkspaceItem;
use lakegate_mcp::GatewayServer;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Platform Fake
// ============================================================================

/// In-memory platform with scriptable cluster states.
#[derive(Default)]
pub struct ScriptedPlatform {
    /// Cluster states served by successive `get_cluster` calls; the last
    /// entry repeats once the script is exhausted.
    cluster_states: Mutex<VecDeque<String>>,
    /// Number of `get_cluster` calls observed.
    cluster_queries: AtomicU64,
}

impl ScriptedPlatform {
    /// Scripts the states `get_cluster` walks through.
    #[must_use]
    pub fn with_cluster_states(states: &[&str]) -> Self {
        Self {
            cluster_states: Mutex::new(states.iter().map(|s| (*s).to_owned()).collect()),
            cluster_queries: AtomicU64::new(0),
        }
    }

    /// Returns how many times `get_cluster` ran.
    #[must_use]
    pub fn cluster_queries(&self) -> u64 {
        self.cluster_queries.load(Ordering::Relaxed)
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
impl ComputeApi for ScriptedPlatform {
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, BackendFailure> {
        Ok(vec![ClusterSummary {
            cluster_id: "c-1".to_owned(),
            cluster_name: "etl".to_owned(),
            state: "RUNNING".to_owned(),
        }])
    }

    async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterDetail, BackendFailure> {
        self.cluster_queries.fetch_add(1, Ordering::Relaxed);
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
impl SqlApi for ScriptedPlatform {
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
            schema: None,
            rows: Some(json!([["1"]])),
            error: None,
        })
    }
}

#[async_trait]
impl JobsApi for ScriptedPlatform {
    async fn trigger_run(
        &self,
        _job: &JobRef,
        _params: &BTreeMap<String, String>,
    ) -> Result<BackendRef, BackendFailure> {
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
impl FilesApi for ScriptedPlatform {
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
        _path: &str,
        _bytes: &[u8],
        _overwrite: bool,
    ) -> Result<(), BackendFailure> {
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
impl MlApi for ScriptedPlatform {
    async fn list_experiments(&self) -> Result<Vec<ExperimentSummary>, BackendFailure> {
        Ok(Vec::new())
    }

    async fn list_runs(
        &self,
        _experiment_id: &str,
        _filter: Option<&str>,
    ) -> Result<Vec<MlRunSummary>, BackendFailure> {
        Ok(Vec::new())
    }

    async fn get_run(&self, run_id: &str) -> Result<MlRunDetail, BackendFailure> {
        Ok(MlRunDetail {
            run_id: run_id.to_owned(),
            status: Some("FINISHED".to_owned()),
            metrics: json!({}),
            params: json!({}),
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
        Ok(Vec::new())
    }
}

#[async_trait]
impl SecretsApi for ScriptedPlatform {
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
        _scope: &str,
        _key: &str,
        _value: &str,
    ) -> Result<(), BackendFailure> {
        Ok(())
    }

    async fn delete_value(&self, _scope: &str, _key: &str) -> Result<(), BackendFailure> {
        Ok(())
    }
}

#[async_trait]
impl WorkspaceApi for ScriptedPlatform {
    async fn list_items(&self, _path: &str) -> Result<Vec<WorkspaceItem>, BackendFailure> {
        Ok(Vec::new())
    }

    async fn export_notebook(&self, _path: &str) -> Result<String, BackendFailure> {
        Ok("print(1)".to_owned())
    }
}

// ============================================================================
// SECTION: Server Harness
// ============================================================================

/// Baseline configuration with fast polling and a tiny rate budget knob.
pub const BASE_CONFIG: &str = r#"
[server]
transport = "stdio"

[operations]
poll_interval_ms = 100
max_poll_interval_ms = 200
default_timeout_ms = 5000

[platform]
base_url = "http://127.0.0.1:9"
"#;

/// Builds a gateway server over the scripted platform.
///
/// # Panics
///
/// Panics when the TOML snippet or the server assembly is invalid.
#[must_use]
pub fn server_over(platform: Arc<ScriptedPlatform>, config_toml: &str) -> GatewayServer {
    let config = GatewayConfig::from_toml(config_toml).expect("test config parses");
    GatewayServer::new(config, platform).expect("server assembles")
}

/// Builds a JSON-RPC request payload.
#[must_use]
pub fn rpc(id: u64, method: &str, params: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    }))
    .expect("request serializes")
}
