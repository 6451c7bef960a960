//! File encoding: transient PDF → base64 text for the JSON request body.
//!
//! The remote API takes attachments inline as base64 strings. The whole file
//! is read at once; the 10 MiB ceiling enforced upstream bounds the memory
//! cost at roughly 24 MiB per in-flight request (raw bytes plus encoding).

use crate::error::GatewayError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Read `path` fully and return its standard (padded) base64 encoding.
///
/// A read failure is fatal for the request and surfaces as HTTP 500.
pub async fn encode_file(path: &Path) -> Result<String, GatewayError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| GatewayError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let b64 = STANDARD.encode(&bytes);
    debug!(
        "Encoded {} → {} bytes base64 ({} raw)",
        path.display(),
        b64.len(),
        bytes.len()
    );
    Ok(b64)
}
