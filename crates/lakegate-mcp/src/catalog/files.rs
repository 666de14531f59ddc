// crates/lakegate-mcp/src/catalog/files.rs
// ============================================================================
// Module: Files Capabilities
// Description: File store listing, transfer, and directory management.
// Purpose: Expose the platform file store with base64 content transport.
// Dependencies: base64, lakegate-core, serde_json
// ============================================================================

//! ## Overview
//! File content crosses the protocol as base64 text in both directions.
//! Reads accept an optional byte range; writes decode the payload before
//! the backend call and reject malformed base64 as a parameter error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lakegate_core::CapabilityDescriptor;
use lakegate_core::CapabilityHandler;
use lakegate_core::CapabilityKind;
use lakegate_core::CapabilityRegistry;
use lakegate_core::Enablement;
use lakegate_core::GatewayError;
use lakegate_core::InvocationContext;
use lakegate_core::ParameterSpec;
use lakegate_core::ParameterType;
use lakegate_core::RegistryError;
use serde_json::Value;
use serde_json::json;

use super::Services;
use super::expect_bool;
use super::expect_str;
use super::opt_u64;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Files operation selected at registration.
#[derive(Debug, Clone, Copy)]
enum FilesOp {
    /// List entries under a path.
    List,
    /// Read file content.
    Read,
    /// Write file content.
    Write,
    /// Delete a path.
    Delete,
    /// Create a directory.
    Mkdir,
}

/// Handler shared by the files capabilities.
struct FilesHandler {
    /// Shared backend services.
    services: Arc<Services>,
    /// Operation this registration performs.
    op: FilesOp,
}

#[async_trait]
impl CapabilityHandler for FilesHandler {
    async fn invoke(
        &self,
        _ctx: InvocationContext<'_>,
        params: Value,
    ) -> Result<Value, GatewayError> {
        let path = expect_str(&params, "path")?;
        match self.op {
            FilesOp::List => {
                let entries = self
                    .services
                    .platform
                    .list(&path)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "entries": entries }))
            }
            FilesOp::Read => {
                let offset = opt_u64(&params, "offset");
                let length = opt_u64(&params, "length");
                let bytes = self
                    .services
                    .platform
                    .read(&path, offset, length)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({
                    "path": path,
                    "content": BASE64.encode(&bytes),
                    "length": bytes.len(),
                }))
            }
            FilesOp::Write => {
                let content = expect_str(&params, "content")?;
                let overwrite = expect_bool(&params, "overwrite")?;
                let bytes = BASE64.decode(content.as_bytes()).map_err(|err| {
                    GatewayError::InvalidParameters {
                        message: format!("content is not valid base64: {err}"),
                        fields: vec!["content".to_string()],
                    }
                })?;
                self.services
                    .platform
                    .write(&path, &bytes, overwrite)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "path": path, "bytes_written": bytes.len() }))
            }
            FilesOp::Delete => {
                let recursive = expect_bool(&params, "recursive")?;
                self.services
                    .platform
                    .delete(&path, recursive)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "path": path, "status": "deleted" }))
            }
            FilesOp::Mkdir => {
                self.services
                    .platform
                    .mkdir(&path)
                    .await
                    .map_err(|failure| self.services.map_failure(&failure))?;
                Ok(json!({ "path": path, "status": "created" }))
            }
        }
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Builds one files descriptor.
fn descriptor(
    services: &Arc<Services>,
    name: &str,
    description: &str,
    params: Vec<ParameterSpec>,
    op: FilesOp,
) -> CapabilityDescriptor {
    CapabilityDescriptor {
        name: name.to_string(),
        kind: CapabilityKind::Tool,
        description: description.to_string(),
        params,
        enablement: Enablement::Always,
        handler: Arc::new(FilesHandler {
            services: Arc::clone(services),
            op,
        }),
    }
}

/// Registers the files capabilities.
///
/// # Errors
///
/// Returns [`RegistryError`] on catalog collisions.
pub fn register(
    registry: &mut CapabilityRegistry,
    services: &Arc<Services>,
) -> Result<(), RegistryError> {
    let path = || ParameterSpec::required("path", ParameterType::String, "File store path");
    registry.register(descriptor(
        services,
        "files.list",
        "Lists entries under a file store path",
        vec![path()],
        FilesOp::List,
    ))?;
    registry.register(descriptor(
        services,
        "files.read",
        "Reads file content as base64, optionally a byte range",
        vec![
            path(),
            ParameterSpec::optional("offset", ParameterType::Integer, "Starting byte offset"),
            ParameterSpec::optional("length", ParameterType::Integer, "Number of bytes to read"),
        ],
        FilesOp::Read,
    ))?;
    registry.register(descriptor(
        services,
        "files.write",
        "Writes base64-encoded content to a path",
        vec![
            path(),
            ParameterSpec::required("content", ParameterType::String, "Base64 file content"),
            ParameterSpec::with_default(
                "overwrite",
                ParameterType::Boolean,
                json!(false),
                "Replace an existing file",
            ),
        ],
        FilesOp::Write,
    ))?;
    registry.register(descriptor(
        services,
        "files.delete",
        "Deletes a path, optionally recursively",
        vec![
            path(),
            ParameterSpec::with_default(
                "recursive",
                ParameterType::Boolean,
                json!(false),
                "Delete directory contents as well",
            ),
        ],
        FilesOp::Delete,
    ))?;
    registry.register(descriptor(
        services,
        "files.mkdir",
        "Creates a directory and missing parents",
        vec![path()],
        FilesOp::Mkdir,
    ))?;
    Ok(())
}
