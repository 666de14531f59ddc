// crates/lakegate-core/src/tracker.rs
// ============================================================================
// Module: Operation Tracker
// Description: Handles for long-running backend operations with coalesced
//              polling, capped backoff, and terminal-state retention.
// Purpose: Give clients one uniform poll/await surface over slow backends.
// Dependencies: async-trait, serde_json, tokio
// ============================================================================

//! ## Overview
//! Submission-style capabilities return an operation handle instead of
//! blocking the protocol loop. The tracker owns those handles: `poll`
//! re-queries the backend at most once per poll interval (callers inside
//! the window get the cached snapshot), and `await_completion` parks on a
//! per-handle gate so any number of concurrent waiters produce one backend
//! query per backoff step. Terminal snapshots are retained for a bounded
//! window and then evicted; an evicted handle answers `unknown_operation`.
//! Abandoning an await never touches the handle or the backend operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::sync::Notify;

use crate::error::BackendFailure;
use crate::error::ErrorMapper;
use crate::error::ErrorRecord;
use crate::error::GatewayError;
use crate::facade::BackendPhase;
use crate::facade::PlatformClient;
use crate::identifiers::BackendRef;
use crate::identifiers::OperationId;
use crate::time::Clock;

// ============================================================================
// SECTION: States and Domains
// ============================================================================

/// Lifecycle state of a tracked operation.
///
/// # Invariants
/// - `Succeeded`, `Failed`, and `Cancelled` are terminal; a terminal
///   snapshot never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Submitted, no backend status observed yet.
    Pending,
    /// Backend reports the operation in progress.
    Running,
    /// Backend reports success.
    Succeeded,
    /// Backend reports failure.
    Failed,
    /// Backend reports cancellation.
    Cancelled,
}

impl OperationState {
    /// Returns whether this state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// Kind of backend operation a handle tracks; selects the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationDomain {
    /// Cluster start request.
    ClusterStart,
    /// Cluster termination request.
    ClusterTerminate,
    /// SQL statement execution.
    SqlStatement,
    /// Job or notebook run.
    JobRun,
}

impl OperationDomain {
    /// Returns the stable snake_case label for this domain.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ClusterStart => "cluster_start",
            Self::ClusterTerminate => "cluster_terminate",
            Self::SqlStatement => "sql_statement",
            Self::JobRun => "job_run",
        }
    }
}

// ============================================================================
// SECTION: Status Poller Contract
// ============================================================================

/// One observed backend status for a tracked operation.
#[derive(Debug, Clone)]
pub enum BackendStatus {
    /// Still in progress.
    Running,
    /// Finished successfully with a result payload.
    Succeeded {
        /// Domain-shaped result document.
        result: Value,
    },
    /// Finished with a backend-reported failure.
    Failed {
        /// Failure shape for mapping.
        failure: BackendFailure,
    },
    /// Cancelled on the backend before completion.
    Cancelled,
}

/// Queries one backend status for a domain and reference.
#[async_trait]
pub trait StatusPoller: Send + Sync {
    /// Fetches the current backend status.
    ///
    /// # Errors
    ///
    /// Returns [`BackendFailure`] when the status query itself fails; a
    /// retryable failure leaves the handle unchanged.
    async fn poll(
        &self,
        domain: OperationDomain,
        backend_ref: &BackendRef,
    ) -> Result<BackendStatus, BackendFailure>;
}

// ============================================================================
// SECTION: Configuration and Snapshot
// ============================================================================

/// Tracker pacing and retention policy.
///
/// # Invariants
/// - `poll_interval_ms <= max_poll_interval_ms`; enforced by config loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Minimum spacing between backend status queries per handle.
    pub poll_interval_ms: u64,
    /// Backoff ceiling for `await_completion` re-queries.
    pub max_poll_interval_ms: u64,
    /// Await deadline applied when the caller does not supply one.
    pub default_timeout_ms: u64,
    /// How long terminal snapshots remain fetchable before eviction.
    pub retention_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            max_poll_interval_ms: 10_000,
            default_timeout_ms: 120_000,
            retention_ms: 600_000,
        }
    }
}

/// Point-in-time view of one tracked operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSnapshot {
    /// Gateway-issued operation identifier.
    pub id: OperationId,
    /// Operation kind.
    pub domain: OperationDomain,
    /// Current lifecycle state.
    pub state: OperationState,
    /// Submission timestamp, milliseconds since epoch.
    pub submitted_at_ms: u64,
    /// Timestamp of the last backend status query, when one has happened.
    pub last_polled_at_ms: Option<u64>,
    /// Backend reference the tracker re-queries.
    pub backend_ref: BackendRef,
    /// Result document once `state` is `Succeeded`.
    pub result: Option<Value>,
    /// Failure record once `state` is `Failed`.
    pub error: Option<ErrorRecord>,
}

// ============================================================================
// SECTION: Handle Internals
// ============================================================================

/// Mutable per-handle state behind the snapshot lock.
#[derive(Debug)]
struct HandleState {
    /// Current snapshot served to callers.
    snapshot: OperationSnapshot,
    /// Timestamp the handle entered a terminal state, for eviction.
    terminal_at_ms: Option<u64>,
}

/// Shared per-operation cell: snapshot plus waiter coordination.
struct HandleCell {
    /// Snapshot and eviction bookkeeping.
    state: Mutex<HandleState>,
    /// Held by the single task currently allowed to query the backend.
    poll_gate: tokio::sync::Mutex<()>,
    /// Signalled after every applied backend status.
    changed: Notify,
}

impl HandleCell {
    /// Returns the current snapshot, or `None` if the state lock poisoned.
    fn snapshot(&self) -> Option<OperationSnapshot> {
        self.state.lock().ok().map(|state| state.snapshot.clone())
    }

    /// Returns the snapshot only when it is terminal.
    fn terminal_snapshot(&self) -> Option<OperationSnapshot> {
        self.snapshot().filter(|snapshot| snapshot.state.is_terminal())
    }
}

// ============================================================================
// SECTION: Tracker
// ============================================================================

/// Registry of in-flight and recently finished backend operations.
pub struct OperationTracker {
    /// Pacing and retention policy.
    config: TrackerConfig,
    /// Backend status source.
    poller: Arc<dyn StatusPoller>,
    /// Mapper for failures recorded into snapshots.
    mapper: ErrorMapper,
    /// Time source for pacing and retention.
    clock: Arc<dyn Clock>,
    /// Handles keyed by operation identifier.
    handles: Mutex<BTreeMap<String, Arc<HandleCell>>>,
    /// Monotonic identifier counter.
    counter: AtomicU64,
}

impl OperationTracker {
    /// Creates a tracker over the given poller, mapper, and clock.
    #[must_use]
    pub fn new(
        config: TrackerConfig,
        poller: Arc<dyn StatusPoller>,
        mapper: ErrorMapper,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            poller,
            mapper,
            clock,
            handles: Mutex::new(BTreeMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Registers a freshly submitted backend operation and issues its handle.
    #[must_use]
    pub fn submit(&self, domain: OperationDomain, backend_ref: BackendRef) -> OperationId {
        let now_ms = self.clock.now_millis();
        self.sweep_expired(now_ms);
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = OperationId::new(&format!("op-{sequence:08x}"));
        let cell = Arc::new(HandleCell {
            state: Mutex::new(HandleState {
                snapshot: OperationSnapshot {
                    id: id.clone(),
                    domain,
                    state: OperationState::Pending,
                    submitted_at_ms: now_ms,
                    last_polled_at_ms: None,
                    backend_ref,
                    result: None,
                    error: None,
                },
                terminal_at_ms: None,
            }),
            poll_gate: tokio::sync::Mutex::new(()),
            changed: Notify::new(),
        });
        if let Ok(mut handles) = self.handles.lock() {
            handles.insert(id.as_str().to_string(), cell);
        }
        id
    }

    /// Returns the current snapshot, querying the backend when the cached
    /// one is stale and the operation is not yet terminal.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownOperation`] for unknown or evicted
    /// handles.
    pub async fn poll(&self, id: &OperationId) -> Result<OperationSnapshot, GatewayError> {
        let cell = self.cell(id)?;
        if let Some(snapshot) = cell.terminal_snapshot() {
            return Ok(snapshot);
        }
        if let Some(snapshot) = self.fresh_snapshot(&cell) {
            return Ok(snapshot);
        }
        let _gate = cell.poll_gate.lock().await;
        // Another poller may have refreshed while this task waited.
        if let Some(snapshot) = cell.terminal_snapshot().or_else(|| self.fresh_snapshot(&cell)) {
            return Ok(snapshot);
        }
        self.query_backend(&cell).await;
        cell.snapshot().ok_or_else(|| unknown_operation(id))
    }

    /// Blocks until the operation reaches a terminal state or the deadline
    /// elapses. Concurrent waiters on one handle coalesce behind a single
    /// backend query per backoff step; a timeout leaves the handle intact.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownOperation`] for unknown handles and
    /// [`GatewayError::OperationTimedOut`] when the deadline elapses first.
    pub async fn await_completion(
        &self,
        id: &OperationId,
        timeout_ms: Option<u64>,
    ) -> Result<OperationSnapshot, GatewayError> {
        let timeout_ms = timeout_ms.unwrap_or(self.config.default_timeout_ms);
        let cell = self.cell(id)?;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        let mut backoff_ms = self.config.poll_interval_ms;
        loop {
            if let Some(snapshot) = cell.terminal_snapshot() {
                return Ok(snapshot);
            }
            tokio::select! {
                gate = cell.poll_gate.lock() => {
                    if let Some(snapshot) = cell.terminal_snapshot() {
                        return Ok(snapshot);
                    }
                    self.query_backend(&cell).await;
                    if let Some(snapshot) = cell.terminal_snapshot() {
                        return Ok(snapshot);
                    }
                    let now = tokio::time::Instant::now();
                    if now >= deadline {
                        return Err(GatewayError::OperationTimedOut { timeout_ms });
                    }
                    // Hold the gate through the pause so waiters coalesce
                    // behind this task's next query.
                    tokio::time::sleep(Duration::from_millis(backoff_ms).min(deadline - now))
                        .await;
                    drop(gate);
                    backoff_ms = backoff_ms
                        .saturating_mul(2)
                        .min(self.config.max_poll_interval_ms);
                }
                () = cell.changed.notified() => {}
                () = tokio::time::sleep_until(deadline) => {
                    return Err(GatewayError::OperationTimedOut { timeout_ms });
                }
            }
        }
    }

    /// Returns the number of currently tracked handles.
    #[must_use]
    pub fn tracked_operations(&self) -> usize {
        self.handles.lock().map_or(0, |handles| handles.len())
    }

    /// Looks up a handle, sweeping expired terminal handles first.
    fn cell(&self, id: &OperationId) -> Result<Arc<HandleCell>, GatewayError> {
        let now_ms = self.clock.now_millis();
        self.sweep_expired(now_ms);
        self.handles
            .lock()
            .ok()
            .and_then(|handles| handles.get(id.as_str()).cloned())
            .ok_or_else(|| unknown_operation(id))
    }

    /// Returns the cached snapshot when the last backend query is recent.
    fn fresh_snapshot(&self, cell: &HandleCell) -> Option<OperationSnapshot> {
        let now_ms = self.clock.now_millis();
        cell.snapshot().filter(|snapshot| {
            snapshot
                .last_polled_at_ms
                .is_some_and(|at| now_ms.saturating_sub(at) < self.config.poll_interval_ms)
        })
    }

    /// Queries the backend once and applies the outcome to the handle.
    ///
    /// Retryable query failures only advance the pacing timestamp; the
    /// snapshot state is untouched so the operation can still complete.
    async fn query_backend(&self, cell: &HandleCell) {
        let Some(current) = cell.snapshot() else {
            return;
        };
        let outcome = self.poller.poll(current.domain, &current.backend_ref).await;
        let now_ms = self.clock.now_millis();
        if let Ok(mut state) = cell.state.lock() {
            state.snapshot.last_polled_at_ms = Some(now_ms);
            match outcome {
                Ok(BackendStatus::Running) => {
                    state.snapshot.state = OperationState::Running;
                }
                Ok(BackendStatus::Succeeded { result }) => {
                    state.snapshot.state = OperationState::Succeeded;
                    state.snapshot.result = Some(result);
                    state.terminal_at_ms = Some(now_ms);
                }
                Ok(BackendStatus::Cancelled) => {
                    state.snapshot.state = OperationState::Cancelled;
                    state.terminal_at_ms = Some(now_ms);
                }
                Ok(BackendStatus::Failed { failure }) => {
                    let error = self.mapper.map(&failure);
                    state.snapshot.state = OperationState::Failed;
                    state.snapshot.error =
                        Some(self.mapper.record(&error, current.id.as_str()));
                    state.terminal_at_ms = Some(now_ms);
                }
                Err(failure) => {
                    let error = self.mapper.map(&failure);
                    if !error.kind().retryable() {
                        state.snapshot.state = OperationState::Failed;
                        state.snapshot.error =
                            Some(self.mapper.record(&error, current.id.as_str()));
                        state.terminal_at_ms = Some(now_ms);
                    }
                }
            }
        }
        cell.changed.notify_waiters();
    }

    /// Drops terminal handles older than the retention window.
    fn sweep_expired(&self, now_ms: u64) {
        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|_, cell| {
                cell.state.lock().ok().is_none_or(|state| {
                    state
                        .terminal_at_ms
                        .is_none_or(|at| now_ms.saturating_sub(at) < self.config.retention_ms)
                })
            });
        }
    }
}

/// Builds the unknown-operation error for a handle identifier.
fn unknown_operation(id: &OperationId) -> GatewayError {
    GatewayError::UnknownOperation {
        id: id.as_str().to_string(),
    }
}

// ============================================================================
// SECTION: Facade Status Poller
// ============================================================================

/// Backend cluster state label that means a start request finished.
const CLUSTER_STATE_RUNNING: &str = "RUNNING";
/// Backend cluster state label that means the cluster is down.
const CLUSTER_STATE_TERMINATED: &str = "TERMINATED";
/// Backend cluster state label for provisioning failures.
const CLUSTER_STATE_ERROR: &str = "ERROR";

/// [`StatusPoller`] implemented over the platform facade: each domain maps
/// to the matching status query.
pub struct FacadeStatusPoller {
    /// Shared platform surface.
    client: Arc<dyn PlatformClient>,
}

impl FacadeStatusPoller {
    /// Creates a poller over the shared platform client.
    #[must_use]
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl StatusPoller for FacadeStatusPoller {
    async fn poll(
        &self,
        domain: OperationDomain,
        backend_ref: &BackendRef,
    ) -> Result<BackendStatus, BackendFailure> {
        match domain {
            OperationDomain::ClusterStart => {
                let detail = self.client.get_cluster(backend_ref.as_str()).await?;
                Ok(match detail.state.as_str() {
                    CLUSTER_STATE_RUNNING => BackendStatus::Succeeded {
                        result: serde_json::to_value(&detail).unwrap_or(Value::Null),
                    },
                    CLUSTER_STATE_TERMINATED | CLUSTER_STATE_ERROR => BackendStatus::Failed {
                        failure: BackendFailure::Unclassified {
                            message: detail.state_message.unwrap_or_else(|| {
                                format!("cluster start ended in state {}", detail.state)
                            }),
                        },
                    },
                    _ => BackendStatus::Running,
                })
            }
            OperationDomain::ClusterTerminate => {
                let detail = self.client.get_cluster(backend_ref.as_str()).await?;
                Ok(match detail.state.as_str() {
                    CLUSTER_STATE_TERMINATED => BackendStatus::Succeeded {
                        result: json!({
                            "cluster_id": detail.cluster_id,
                            "state": detail.state,
                        }),
                    },
                    CLUSTER_STATE_ERROR => BackendStatus::Failed {
                        failure: BackendFailure::Unclassified {
                            message: detail.state_message.unwrap_or_else(|| {
                                "cluster termination ended in state ERROR".to_string()
                            }),
                        },
                    },
                    _ => BackendStatus::Running,
                })
            }
            OperationDomain::SqlStatement => {
                let result = self.client.get_statement_result(backend_ref).await?;
                Ok(match result.phase {
                    BackendPhase::Succeeded => BackendStatus::Succeeded {
                        result: json!({
                            "schema": result.schema,
                            "rows": result.rows,
                        }),
                    },
                    BackendPhase::Failed => BackendStatus::Failed {
                        failure: BackendFailure::Unclassified {
                            message: result
                                .error
                                .unwrap_or_else(|| "statement failed".to_string()),
                        },
                    },
                    BackendPhase::Cancelled => BackendStatus::Cancelled,
                    BackendPhase::Pending | BackendPhase::Running => BackendStatus::Running,
                })
            }
            OperationDomain::JobRun => {
                let status = self.client.get_run_status(backend_ref).await?;
                Ok(match status.phase {
                    BackendPhase::Succeeded => BackendStatus::Succeeded {
                        result: json!({
                            "message": status.message,
                            "output": status.output,
                        }),
                    },
                    BackendPhase::Failed => BackendStatus::Failed {
                        failure: BackendFailure::Unclassified {
                            message: status.message.unwrap_or_else(|| "run failed".to_string()),
                        },
                    },
                    BackendPhase::Cancelled => BackendStatus::Cancelled,
                    BackendPhase::Pending | BackendPhase::Running => BackendStatus::Running,
                })
            }
        }
    }
}
