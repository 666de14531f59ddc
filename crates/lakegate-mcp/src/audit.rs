// crates/lakegate-mcp/src/audit.rs
// ============================================================================
// Module: Gateway Audit Logging
// Description: JSON-line audit sinks for dispatch outcomes.
// Purpose: Emit redacted audit logs without hard dependencies.
// Dependencies: lakegate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! This module provides concrete sinks for the dispatch audit contract
//! defined in `lakegate-core`. Each dispatch produces exactly one JSON line
//! containing correlation identifier, principal, capability, outcome code,
//! duration, and severity. Request parameters and result payloads are never
//! written; secret material cannot reach the audit stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use lakegate_core::DispatchAudit;
use lakegate_core::DispatchAuditEvent;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One serialized audit line.
#[derive(Debug, Clone, Serialize)]
struct AuditLine<'a> {
    /// Event identifier.
    event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    timestamp_ms: u128,
    /// Dispatch outcome fields.
    #[serde(flatten)]
    dispatch: &'a DispatchAuditEvent,
}

impl<'a> AuditLine<'a> {
    /// Wraps a dispatch event with a consistent timestamp.
    fn new(dispatch: &'a DispatchAuditEvent) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "gateway_dispatch",
            timestamp_ms,
            dispatch,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrDispatchAudit;

impl DispatchAudit for StderrDispatchAudit {
    fn record(&self, event: &DispatchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(&AuditLine::new(event)) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to an append-only file.
pub struct FileDispatchAudit {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileDispatchAudit {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DispatchAudit for FileDispatchAudit {
    fn record(&self, event: &DispatchAuditEvent) {
        if let Ok(payload) = serde_json::to_string(&AuditLine::new(event))
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests;
