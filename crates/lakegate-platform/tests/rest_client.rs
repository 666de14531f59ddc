// crates/lakegate-platform/tests/rest_client.rs
// ============================================================================
// Module: REST Client Integration Tests
// Description: Tests for request shaping and status classification.
// Purpose: Validate the facade implementation against a local HTTP server.
// ============================================================================

//! ## Overview
//! Runs the REST client against a scripted `tiny_http` server: bearer auth,
//! endpoint paths, wire decoding per domain, and shape-driven failure
//! classification by status class.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use lakegate_core::BackendFailure;
use lakegate_core::BackendRef;
use lakegate_core::facade::BackendPhase;
use lakegate_core::facade::ComputeApi;
use lakegate_core::facade::FilesApi;
use lakegate_core::facade::JobRef;
use lakegate_core::facade::JobsApi;
use lakegate_core::facade::MlApi;
use lakegate_core::facade::SecretsApi;
use lakegate_core::facade::SqlApi;
use lakegate_core::facade::StatementSubmission;
use lakegate_core::facade::WorkspaceApi;
use lakegate_platform::RestPlatformClient;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Harness
// ============================================================================

/// One scripted response.
struct Scripted {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl Scripted {
    fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }
}

/// One request as observed by the fake backend.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    url: String,
    authorization: Option<String>,
    body: String,
}

/// Serves the scripted responses in order, recording each request.
fn serve(responses: Vec<Scripted>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", server.server_addr());
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recorded);
    thread::spawn(move || {
        for scripted in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.as_str().to_string());
            sink.lock().unwrap().push(Recorded {
                method: request.method().as_str().to_string(),
                url: request.url().to_string(),
                authorization,
                body,
            });
            let mut response =
                Response::from_string(scripted.body).with_status_code(scripted.status);
            for (name, value) in scripted.headers {
                response = response
                    .with_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap());
            }
            let _ = request.respond(response);
        }
    });
    (base_url, recorded)
}

/// Builds a client against the scripted server.
fn client(base_url: &str) -> RestPlatformClient {
    RestPlatformClient::new(
        base_url.to_string(),
        "dapi-test-token-0123456789".to_string(),
        Duration::from_secs(1),
        Duration::from_secs(5),
    )
    .unwrap()
}

// ============================================================================
// SECTION: Request Shaping Tests
// ============================================================================

#[tokio::test]
async fn requests_carry_bearer_auth_and_endpoint_paths() {
    let (base_url, recorded) = serve(vec![Scripted::json(
        200,
        &json!({"clusters": [{"cluster_id": "c-1", "cluster_name": "etl", "state": "RUNNING"}]}),
    )]);
    let clusters = client(&base_url).list_clusters().await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].cluster_id, "c-1");

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/api/2.1/clusters/list");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer dapi-test-token-0123456789")
    );
}

#[tokio::test]
async fn statement_submission_is_always_asynchronous() {
    let (base_url, recorded) =
        serve(vec![Scripted::json(200, &json!({"statement_id": "st-7"}))]);
    let backend_ref = client(&base_url)
        .submit_statement(&StatementSubmission {
            query: "SELECT 1".to_string(),
            warehouse_id: "wh-1".to_string(),
            catalog: Some("main".to_string()),
            schema: None,
        })
        .await
        .unwrap();
    assert_eq!(backend_ref.as_str(), "st-7");

    let requests = recorded.lock().unwrap();
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["statement"], "SELECT 1");
    assert_eq!(body["wait_timeout"], "0s");
    assert_eq!(body["catalog"], "main");
    assert!(body.get("schema").is_none());
}

#[tokio::test]
async fn notebook_runs_use_one_off_submission() {
    let (base_url, recorded) = serve(vec![Scripted::json(200, &json!({"run_id": 42}))]);
    let mut params = BTreeMap::new();
    params.insert("date".to_string(), "2026-08-25".to_string());
    let backend_ref = client(&base_url)
        .trigger_run(&JobRef::NotebookPath("/Repos/etl/daily".to_string()), &params)
        .await
        .unwrap();
    assert_eq!(backend_ref.as_str(), "42");

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0].url, "/api/2.2/jobs/runs/submit");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["tasks"][0]["notebook_task"]["notebook_path"], "/Repos/etl/daily");
    assert_eq!(body["tasks"][0]["notebook_task"]["base_parameters"]["date"], "2026-08-25");
}

// ============================================================================
// SECTION: Wire Decoding Tests
// ============================================================================

#[tokio::test]
async fn statement_results_map_phases_and_payloads() {
    let (base_url, _recorded) = serve(vec![Scripted::json(
        200,
        &json!({
            "status": {"state": "SUCCEEDED"},
            "manifest": {"schema": {"columns": [{"name": "id"}]}},
            "result": {"data_array": [["1"], ["2"]]},
        }),
    )]);
    let result = client(&base_url)
        .get_statement_result(&BackendRef::new("st-7"))
        .await
        .unwrap();
    assert_eq!(result.phase, BackendPhase::Succeeded);
    assert_eq!(result.schema, Some(json!({"columns": [{"name": "id"}]})));
    assert_eq!(result.rows, Some(json!([["1"], ["2"]])));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn run_status_maps_lifecycle_and_result_labels() {
    let (base_url, _recorded) = serve(vec![
        Scripted::json(
            200,
            &json!({"state": {"life_cycle_state": "RUNNING"}}),
        ),
        Scripted::json(
            200,
            &json!({
                "state": {
                    "life_cycle_state": "TERMINATED",
                    "result_state": "SUCCESS",
                    "state_message": "done",
                },
                "output": {"notebook_output": "ok"},
            }),
        ),
        Scripted::json(
            200,
            &json!({"state": {"life_cycle_state": "TERMINATED", "result_state": "FAILED"}}),
        ),
    ]);
    let client = client(&base_url);
    let running = client.get_run_status(&BackendRef::new("42")).await.unwrap();
    assert_eq!(running.phase, BackendPhase::Running);
    let succeeded = client.get_run_status(&BackendRef::new("42")).await.unwrap();
    assert_eq!(succeeded.phase, BackendPhase::Succeeded);
    assert_eq!(succeeded.message.as_deref(), Some("done"));
    assert!(succeeded.output.is_some());
    let failed = client.get_run_status(&BackendRef::new("42")).await.unwrap();
    assert_eq!(failed.phase, BackendPhase::Failed);
}

#[tokio::test]
async fn file_reads_decode_base64_chunks() {
    let (base_url, recorded) = serve(vec![Scripted::json(
        200,
        &json!({"bytes_read": 5, "data": "aGVsbG8="}),
    )]);
    let bytes = client(&base_url)
        .read("/data/greeting.txt", Some(0), Some(5))
        .await
        .unwrap();
    assert_eq!(bytes, b"hello");

    let requests = recorded.lock().unwrap();
    assert!(requests[0].url.starts_with("/api/2.0/dbfs/read?"));
    assert!(requests[0].url.contains("offset=0"));
    assert!(requests[0].url.contains("length=5"));
}

#[tokio::test]
async fn secret_values_decode_base64_payloads() {
    let (base_url, _recorded) =
        serve(vec![Scripted::json(200, &json!({"value": "cGFzc3dvcmQ="}))]);
    let secret = client(&base_url).get_value("prod", "db-password").await.unwrap();
    assert_eq!(secret.bytes, b"password");
}

#[tokio::test]
async fn notebook_export_decodes_source_text() {
    let (base_url, recorded) = serve(vec![Scripted::json(
        200,
        &json!({"content": "cHJpbnQoMSk="}),
    )]);
    let source = client(&base_url).export_notebook("/Repos/etl/daily").await.unwrap();
    assert_eq!(source, "print(1)");
    let requests = recorded.lock().unwrap();
    assert!(requests[0].url.contains("format=SOURCE"));
}

#[tokio::test]
async fn vector_queries_parse_match_rows() {
    let (base_url, _recorded) = serve(vec![Scripted::json(
        200,
        &json!({"result": {"data_array": [["doc-1", "some text", 0.93], ["doc-2", 0.5]]}}),
    )]);
    let matches = client(&base_url).query_vector_index("idx", "query", 5).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "doc-1");
    assert_eq!(matches[0].text.as_deref(), Some("some text"));
    assert!((matches[0].score - 0.93).abs() < 1e-9);
    assert!(matches[1].text.is_none());
}

// ============================================================================
// SECTION: Classification Tests
// ============================================================================

#[tokio::test]
async fn status_classes_select_failure_shapes() {
    let (base_url, _recorded) = serve(vec![
        Scripted::json(403, &json!({"message": "no access to cluster"})),
        Scripted::json(404, &json!({"message": "cluster does not exist"})),
        Scripted::json(400, &json!({"message": "num_workers must be positive"})),
        Scripted::json(500, &json!({"message": "internal"})),
    ]);
    let client = client(&base_url);

    let denied = client.get_cluster("c-1").await.unwrap_err();
    assert!(matches!(denied, BackendFailure::PermissionDenied { .. }));

    let missing = client.get_cluster("c-1").await.unwrap_err();
    assert!(matches!(missing, BackendFailure::NotFound { .. }));

    let malformed = client.get_cluster("c-1").await.unwrap_err();
    assert!(matches!(malformed, BackendFailure::Malformed { .. }));

    let unavailable = client.get_cluster("c-1").await.unwrap_err();
    assert!(matches!(unavailable, BackendFailure::Unavailable { .. }));
}

#[tokio::test]
async fn throttling_carries_the_retry_after_hint() {
    let (base_url, _recorded) = serve(vec![Scripted {
        status: 429,
        body: json!({"message": "too many requests"}).to_string(),
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Retry-After".to_string(), "3".to_string()),
        ],
    }]);
    let err = client(&base_url).list_scopes().await.unwrap_err();
    match err {
        BackendFailure::Throttled { retry_after_ms, .. } => {
            assert_eq!(retry_after_ms, Some(3_000));
        }
        other => panic!("expected throttled, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backends_classify_as_unavailable() {
    // Port 9 is discard; nothing listens there in the test environment.
    let client = RestPlatformClient::new(
        "http://127.0.0.1:9".to_string(),
        "dapi-test-token-0123456789".to_string(),
        Duration::from_millis(200),
        Duration::from_millis(500),
    )
    .unwrap();
    let err = client.list_clusters().await.unwrap_err();
    assert!(matches!(err, BackendFailure::Unavailable { .. }));
}

#[tokio::test]
async fn empty_success_bodies_are_accepted() {
    let (base_url, _recorded) = serve(vec![Scripted {
        status: 200,
        body: String::new(),
        headers: vec![],
    }]);
    client(&base_url).mkdir("/data/new").await.unwrap();
}

#[tokio::test]
async fn experiment_and_run_listings_decode() {
    let (base_url, _recorded) = serve(vec![
        Scripted::json(
            200,
            &json!({"experiments": [{"experiment_id": "e-1", "name": "churn"}]}),
        ),
        Scripted::json(
            200,
            &json!({"runs": [{"info": {"run_id": "r-1", "status": "FINISHED"}}]}),
        ),
        Scripted::json(
            200,
            &json!({
                "run": {
                    "info": {"run_id": "r-1", "status": "FINISHED"},
                    "data": {"metrics": [{"key": "auc", "value": 0.91}], "params": []},
                },
            }),
        ),
    ]);
    let client = client(&base_url);
    let experiments = client.list_experiments().await.unwrap();
    assert_eq!(experiments[0].experiment_id, "e-1");
    let runs = client.list_runs("e-1", Some("metrics.auc > 0.5")).await.unwrap();
    assert_eq!(runs[0].run_id, "r-1");
    let detail = client.get_run("r-1").await.unwrap();
    assert_eq!(detail.metrics, json!([{"key": "auc", "value": 0.91}]));
}
