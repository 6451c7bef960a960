//! Error types for the edgequake-pdfgate library.
//!
//! Every request that does not end in a normalised result ends in exactly one
//! [`GatewayError`]. The variants fall into four classes:
//!
//! * **Validation**: the client sent no file, a non-PDF, or an oversized
//!   file. HTTP 400. The remote API is never contacted.
//! * **Remote call**: transport failure, timeout, non-2xx status, or a
//!   reply that lacks its `choices` array. HTTP 500.
//! * **Local I/O**: the transient file could not be read back. HTTP 500.
//! * **Internal / config**: everything else.
//!
//! On the wire every variant becomes the same [`ErrorEnvelope`] shape:
//! `{ "error": <summary>, "details": <cause> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// No `pdfFile` field was present in the multipart body.
    #[error("no file")]
    MissingFile,

    /// The declared MIME type is not `application/pdf`.
    #[error("wrong type: expected application/pdf, got '{mime}'")]
    WrongType { mime: String },

    /// The file is larger than the configured ceiling.
    #[error("too large: {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// The multipart body itself could not be parsed.
    #[error("malformed multipart body: {0}")]
    Multipart(String),

    // ── Local I/O errors ──────────────────────────────────────────────────
    /// The transient file could not be created or written during upload.
    #[error("Failed to store upload in '{path}': {source}")]
    FileStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transient file could not be read back for encoding.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote call errors ────────────────────────────────────────────────
    /// The request never produced an HTTP response (DNS, TLS, reset, timeout).
    #[error("{detail}")]
    RemoteTransport { detail: String, timed_out: bool },

    /// The remote endpoint answered with a non-2xx status.
    ///
    /// `detail` carries the remote's own `error.message` when it sent one.
    #[error("{detail}")]
    RemoteStatus { status: u16, detail: String },

    /// A 2xx reply whose body is empty, not JSON, or has no `choices` array.
    #[error("{0}")]
    RemoteFormat(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

/// JSON body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable summary.
    pub error: String,
    /// Underlying cause.
    pub details: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingFile
            | GatewayError::WrongType { .. }
            | GatewayError::TooLarge { .. }
            | GatewayError::Multipart(_) => StatusCode::BAD_REQUEST,
            GatewayError::FileStore { .. }
            | GatewayError::FileRead { .. }
            | GatewayError::RemoteTransport { .. }
            | GatewayError::RemoteStatus { .. }
            | GatewayError::RemoteFormat(_)
            | GatewayError::InvalidConfig(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the client-caused validation failures.
    pub fn is_validation(&self) -> bool {
        self.status_code() == StatusCode::BAD_REQUEST
    }

    /// True when the remote call was abandoned because the timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::RemoteTransport { timed_out: true, .. })
    }

    /// The user-facing summary placed in `ErrorEnvelope::error`.
    pub fn summary(&self) -> &'static str {
        match self {
            GatewayError::MissingFile => "please upload a PDF file",
            GatewayError::WrongType { .. } => "only PDF files are accepted",
            GatewayError::TooLarge { .. } => "file exceeds the 10 MB limit",
            GatewayError::Multipart(_) => "invalid upload",
            GatewayError::RemoteTransport { .. } | GatewayError::RemoteStatus { .. } => {
                "API call failed"
            }
            GatewayError::RemoteFormat(_) => "API response format is invalid",
            GatewayError::FileStore { .. } | GatewayError::FileRead { .. } => {
                "error while processing the request"
            }
            GatewayError::InvalidConfig(_) | GatewayError::Internal(_) => "internal server error",
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.summary(), self.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if self.is_validation() {
            tracing::info!("Rejected upload: {}", self);
        } else if matches!(
            self,
            GatewayError::RemoteTransport { .. }
                | GatewayError::RemoteStatus { .. }
                | GatewayError::RemoteFormat(_)
        ) {
            tracing::error!("API error: {}", self);
        } else {
            tracing::error!("Server error: {:#}", self);
        }

        (self.status_code(), Json(self.to_envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_request() {
        assert_eq!(GatewayError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert!(GatewayError::WrongType {
            mime: "text/plain".into()
        }
        .is_validation());
        assert!(GatewayError::TooLarge {
            size: 11,
            limit: 10
        }
        .is_validation());
    }

    #[test]
    fn remote_errors_are_internal() {
        let e = GatewayError::RemoteStatus {
            status: 401,
            detail: "Authentication Fails".into(),
        };
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.is_validation());
    }

    #[test]
    fn envelope_carries_remote_detail() {
        let e = GatewayError::RemoteStatus {
            status: 402,
            detail: "Insufficient Balance".into(),
        };
        let env = e.to_envelope();
        assert_eq!(env.error, "API call failed");
        assert_eq!(env.details, "Insufficient Balance");
    }

    #[test]
    fn missing_file_envelope() {
        let env = GatewayError::MissingFile.to_envelope();
        assert_eq!(env.error, "please upload a PDF file");
        assert_eq!(env.details, "no file");
    }

    #[test]
    fn too_large_display() {
        let e = GatewayError::TooLarge {
            size: 10_485_761,
            limit: 10_485_760,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("too large"), "got: {msg}");
        assert!(msg.contains("10485761"), "got: {msg}");
    }

    #[test]
    fn timeout_flag() {
        let e = GatewayError::RemoteTransport {
            detail: "operation timed out".into(),
            timed_out: true,
        };
        assert!(e.is_timeout());
        assert!(!GatewayError::RemoteFormat("x".into()).is_timeout());
    }
}
