//! Request orchestration: Upload Gateway → Response Normalizer → cleanup.
//!
//! ```text
//! multipart ─▶ upload::receive ─▶ upload::validate ─▶ analyze ─▶ result
//!                    │                                            │
//!                    └────────── TransientFile::discard ◀─────────┘
//! ```
//!
//! [`process_upload`] is the only place that owns the transient file across
//! both stages. It discards it once `analyze` has resolved, whichever way it
//! resolved. Errors raised while the multipart body is still streaming drop
//! the half-written file, whose `Drop` removes it.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::output::InferenceResult;
use crate::pipeline::remote::{InferenceClient, InferenceRequest};
use crate::pipeline::{encode, normalize, upload};
use axum::extract::Multipart;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Response Normalizer: encode the file at `path`, call the remote once, and
/// shape the reply.
pub async fn analyze(
    client: &InferenceClient,
    config: &GatewayConfig,
    path: &Path,
) -> Result<InferenceResult, GatewayError> {
    let pdf_base64 = encode::encode_file(path).await?;
    let request = InferenceRequest::for_pdf(config, pdf_base64);
    let reply = client.send(&request).await?;
    debug!(
        "Shaping {} byte reply (HTTP {}, {}ms)",
        reply.body.len(),
        reply.status,
        reply.duration_ms
    );
    normalize::shape(&reply.body)
}

/// Handle one `/process` upload end to end.
pub async fn process_upload(
    multipart: Multipart,
    config: &GatewayConfig,
    client: &InferenceClient,
) -> Result<InferenceResult, GatewayError> {
    let received = upload::receive(multipart, config).await?;

    let outcome = match upload::validate(received.as_ref(), config) {
        Ok(file) => {
            info!("Processing '{}'", file.original_name);
            analyze(client, config, file.path()).await
        }
        Err(e) => Err(e),
    };

    if let Some(file) = received {
        file.discard();
    }
    outcome
}

/// One-shot analysis of a local PDF, used by `pdfgate extract`.
///
/// There is no declared MIME type for a local file, so the `%PDF` magic bytes
/// stand in for the type check. The file belongs to the caller and is never
/// deleted.
pub async fn extract_local(
    path: &Path,
    config: &GatewayConfig,
    client: &InferenceClient,
) -> Result<InferenceResult, GatewayError> {
    let read_err = |source| GatewayError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(read_err)?.len();

    let mut magic = [0u8; 4];
    let mut f = tokio::fs::File::open(path).await.map_err(read_err)?;
    let mut n = 0;
    while n < magic.len() {
        match f.read(&mut magic[n..]).await.map_err(read_err)? {
            0 => break,
            read => n += read,
        }
    }
    if &magic[..n] != b"%PDF" {
        return Err(GatewayError::WrongType {
            mime: format!("file starting with {:?}", &magic[..n]),
        });
    }

    if size > config.max_upload_bytes {
        return Err(GatewayError::TooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    info!("Processing local file {} ({} bytes)", path.display(), size);
    analyze(client, config, path).await
}
