// crates/lakegate-mcp/src/audit/tests.rs
// ============================================================================
// Module: Audit Sink Unit Tests
// Description: Tests for JSON-line audit emission.
// Purpose: Validate line shape and append behavior of the file sink.
// Dependencies: lakegate-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Writes dispatch events through the file sink and checks that each event
//! produces one parseable JSON line with the expected fields and no payload
//! material.

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

use std::fs;

use lakegate_core::AuditSeverity;
use lakegate_core::DispatchAudit;
use lakegate_core::DispatchAuditEvent;
use serde_json::Value;

use super::FileDispatchAudit;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a representative dispatch event.
fn sample_event(outcome: &str, severity: AuditSeverity) -> DispatchAuditEvent {
    DispatchAuditEvent {
        correlation_id: "lg-a1b2c3d4-00000001".to_owned(),
        principal: "svc-notebooks".to_owned(),
        capability: "compute.start_cluster".to_owned(),
        outcome: outcome.to_owned(),
        duration_ms: 12,
        severity,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn file_sink_writes_one_json_line_per_event() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("audit.log");
    let sink = FileDispatchAudit::new(&path).expect("open sink");

    sink.record(&sample_event("ok", AuditSeverity::Info));
    sink.record(&sample_event("rate_limited", AuditSeverity::Warn));

    let contents = fs::read_to_string(&path).expect("read log");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: Value = serde_json::from_str(lines[0]).expect("parse first line");
    assert_eq!(first["event"], "gateway_dispatch");
    assert_eq!(first["correlation_id"], "lg-a1b2c3d4-00000001");
    assert_eq!(first["principal"], "svc-notebooks");
    assert_eq!(first["capability"], "compute.start_cluster");
    assert_eq!(first["outcome"], "ok");
    assert!(first["timestamp_ms"].as_u64().is_some());

    let second: Value = serde_json::from_str(lines[1]).expect("parse second line");
    assert_eq!(second["outcome"], "rate_limited");
}

#[test]
fn file_sink_appends_across_reopens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("audit.log");

    {
        let sink = FileDispatchAudit::new(&path).expect("open sink");
        sink.record(&sample_event("ok", AuditSeverity::Info));
    }
    {
        let sink = FileDispatchAudit::new(&path).expect("reopen sink");
        sink.record(&sample_event("internal_error", AuditSeverity::Error));
    }

    let contents = fs::read_to_string(&path).expect("read log");
    assert_eq!(contents.lines().count(), 2);
}

#[test]
fn audit_lines_never_carry_parameters() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("audit.log");
    let sink = FileDispatchAudit::new(&path).expect("open sink");

    sink.record(&sample_event("ok", AuditSeverity::Info));

    let contents = fs::read_to_string(&path).expect("read log");
    let line: Value = serde_json::from_str(contents.lines().next().expect("line"))
        .expect("parse line");
    let object = line.as_object().expect("object line");
    assert!(!object.contains_key("params"));
    assert!(!object.contains_key("result"));
}
