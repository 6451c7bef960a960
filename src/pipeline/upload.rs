//! Upload Gateway: materialise the multipart file, then validate it.
//!
//! ## Why write before validating?
//!
//! The MIME type arrives in the part headers but the size is only known once
//! the whole part has been read. Streaming straight to disk keeps memory flat
//! for 10 MiB uploads, so by the time validation runs the file already exists
//! and every exit path, rejection included, has to remove it. That is what
//! [`TransientFile`] is for: it owns the path and deletes it exactly once,
//! either through [`TransientFile::discard`] or, failing that, on drop.
//!
//! Bytes beyond the size ceiling are counted but not written, so an oversized
//! upload reports its true length without filling the disk.

use crate::config::{GatewayConfig, PDF_MIME_TYPE, UPLOAD_FIELD};
use crate::error::GatewayError;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// A file on local disk that lives exactly as long as one request.
///
/// Names are allocated by `tempfile`, so concurrent requests never collide.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl TransientFile {
    /// Allocate a fresh, empty file inside `dir`.
    fn create_in(dir: &Path) -> Result<(Self, tokio::fs::File), GatewayError> {
        let named = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(|source| GatewayError::FileStore {
                path: dir.to_path_buf(),
                source,
            })?;
        let (file, temp) = named.into_parts();
        let path = temp.to_path_buf();
        Ok((
            Self {
                path,
                temp: Some(temp),
            },
            tokio::fs::File::from_std(file),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A failure is logged, never returned.
    pub fn discard(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        match temp.close() {
            Ok(()) => debug!("Transient file removed: {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Transient file already gone: {}", self.path.display())
            }
            Err(e) => warn!(
                "Failed to remove transient file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        self.remove();
    }
}

/// The `pdfFile` part after it has been written to disk.
#[derive(Debug)]
pub struct UploadedFile {
    pub file: TransientFile,
    /// Client-supplied filename, for logging only.
    pub original_name: String,
    /// Declared `Content-Type` of the part, if any.
    pub mime_type: Option<String>,
    /// Total byte length of the part as received.
    pub size: u64,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Release the transient file.
    pub fn discard(self) {
        self.file.discard();
    }
}

/// Read the multipart body and materialise the first `pdfFile` part.
///
/// Returns `Ok(None)` when no such file part exists. Parts with other names,
/// and `pdfFile` parts without a filename (what a browser sends when nothing
/// was selected), are skipped.
pub async fn receive(
    mut multipart: Multipart,
    config: &GatewayConfig,
) -> Result<Option<UploadedFile>, GatewayError> {
    let mut uploaded: Option<UploadedFile> = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // The file is already complete; only trailing parts were cut off.
            Err(e) if is_body_limit(&e) && uploaded.is_some() => break,
            Err(e) => return Err(GatewayError::Multipart(e.to_string())),
        };
        if uploaded.is_some() || field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                debug!("Skipping '{}' part without a filename", UPLOAD_FIELD);
                continue;
            }
        };
        let mime_type = field.content_type().map(str::to_string);

        let (transient, mut out) = TransientFile::create_in(&config.upload_dir)?;
        let mut size: u64 = 0;
        let mut cut_off = false;

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) if is_body_limit(&e) => {
                    warn!(
                        "Upload '{}' cut off by the request body limit after {} bytes",
                        original_name, size
                    );
                    cut_off = true;
                    break;
                }
                Err(e) => return Err(GatewayError::Multipart(e.to_string())),
            };
            let room = config.max_upload_bytes.saturating_sub(size);
            let keep = (chunk.len() as u64).min(room) as usize;
            if keep > 0 {
                out.write_all(&chunk[..keep])
                    .await
                    .map_err(|source| GatewayError::FileStore {
                        path: transient.path().to_path_buf(),
                        source,
                    })?;
            }
            size += chunk.len() as u64;
        }
        out.flush().await.map_err(|source| GatewayError::FileStore {
            path: transient.path().to_path_buf(),
            source,
        })?;

        info!(
            "Received upload '{}' ({} bytes, {}) → {}",
            original_name,
            size,
            mime_type.as_deref().unwrap_or("no content type"),
            transient.path().display()
        );

        // A part cut off by the body ceiling is oversized however few of its
        // bytes arrived before the cut.
        if cut_off {
            size = size.max(config.max_upload_bytes + 1);
        }

        uploaded = Some(UploadedFile {
            file: transient,
            original_name,
            mime_type,
            size,
        });

        if cut_off {
            break;
        }
    }

    Ok(uploaded)
}

/// Apply the upload policy, in order: presence, MIME type, size.
///
/// Short-circuits on the first failure. The caller still owns the file and
/// remains responsible for discarding it.
pub fn validate<'a>(
    upload: Option<&'a UploadedFile>,
    config: &GatewayConfig,
) -> Result<&'a UploadedFile, GatewayError> {
    let upload = upload.ok_or(GatewayError::MissingFile)?;

    let declared = upload.mime_type.as_deref().unwrap_or("");
    if !is_pdf_mime(declared) {
        return Err(GatewayError::WrongType {
            mime: declared.to_string(),
        });
    }

    if upload.size > config.max_upload_bytes {
        return Err(GatewayError::TooLarge {
            size: upload.size,
            limit: config.max_upload_bytes,
        });
    }

    Ok(upload)
}

/// The request body ran past `DefaultBodyLimit`.
fn is_body_limit(e: &MultipartError) -> bool {
    e.status() == StatusCode::PAYLOAD_TOO_LARGE
}

/// Media type comparison ignores case and any `;` parameters.
fn is_pdf_mime(declared: &str) -> bool {
    let essence = declared.split(';').next().unwrap_or("").trim();
    essence.eq_ignore_ascii_case(PDF_MIME_TYPE)
}
