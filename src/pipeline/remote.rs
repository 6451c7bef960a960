//! Outbound call: build the fixed-shape request and send it once.
//!
//! The request body is always
//!
//! ```json
//! { "model": "...",
//!   "messages": [{ "role": "user", "content": "<instruction>",
//!                  "files": [{ "type": "pdf", "content": "<base64>" }] }],
//!   "temperature": 0.7, "max_tokens": 2000 }
//! ```
//!
//! Only `files[0].content` varies per request. There is no retry: a transport
//! failure, timeout, or non-2xx status ends the request with a
//! [`GatewayError`]. A 2xx body is handed back untouched for
//! [`crate::pipeline::normalize`] to shape.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Request body sent to the chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
    pub files: Vec<FileAttachment>,
}

/// An inline attachment: type tag plus base64 content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl InferenceRequest {
    /// Assemble the request for one encoded PDF.
    pub fn for_pdf(config: &GatewayConfig, pdf_base64: String) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![RequestMessage {
                role: "user".to_string(),
                content: config.instruction.clone(),
                files: vec![FileAttachment {
                    kind: "pdf".to_string(),
                    content: pdf_base64,
                }],
            }],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A successful (2xx) reply, body not yet interpreted.
#[derive(Debug, Clone)]
pub struct RemoteReply {
    pub status: u16,
    pub body: Vec<u8>,
    pub duration_ms: u64,
}

/// HTTP client for the remote endpoint.
///
/// Cheap to clone: `reqwest::Client` is reference-counted internally, so one
/// instance built at startup serves every request.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl InferenceClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let timeout = config.api_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    /// Issue the single outbound call.
    pub async fn send(&self, request: &InferenceRequest) -> Result<RemoteReply, GatewayError> {
        info!("Sending request to {} (model {})", self.endpoint, request.model);
        let start = Instant::now();

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Remote replied {} in {}ms: {}",
            status,
            duration_ms,
            String::from_utf8_lossy(&body)
        );

        if !status.is_success() {
            let detail = remote_error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            warn!("Remote returned {}: {}", status, detail);
            return Err(GatewayError::RemoteStatus {
                status: status.as_u16(),
                detail,
            });
        }

        info!("Remote replied {} in {}ms", status, duration_ms);
        Ok(RemoteReply {
            status: status.as_u16(),
            body: body.to_vec(),
            duration_ms,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::RemoteTransport {
                detail: format!("timeout of {}ms exceeded", self.timeout.as_millis()),
                timed_out: true,
            }
        } else {
            GatewayError::RemoteTransport {
                detail: error_chain(&e),
                timed_out: false,
            }
        }
    }
}

/// The remote's own `error.message`, when the body carries one.
fn remote_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// `reqwest` hides the useful part (connection refused, DNS failure) in the
/// source chain; flatten it into one line.
fn error_chain(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GatewayConfig {
        GatewayConfig::builder().api_key("sk-test").build().unwrap()
    }

    #[test]
    fn request_has_fixed_shape() {
        let req = InferenceRequest::for_pdf(&config(), "QUJD".into());
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "deepseek-chat",
                "messages": [{
                    "role": "user",
                    "content": crate::prompts::DEFAULT_INSTRUCTION,
                    "files": [{ "type": "pdf", "content": "QUJD" }]
                }],
                "temperature": 0.7f32,
                "max_tokens": 2000
            })
        );
    }

    #[test]
    fn remote_message_is_extracted() {
        let body = br#"{"error":{"message":"Authentication Fails","type":"authentication_error"}}"#;
        assert_eq!(
            remote_error_message(body).as_deref(),
            Some("Authentication Fails")
        );
    }

    #[test]
    fn remote_message_absent() {
        assert_eq!(remote_error_message(b"<html>502</html>"), None);
        assert_eq!(remote_error_message(br#"{"error":"flat string"}"#), None);
        assert_eq!(remote_error_message(br#"{"error":{"message":""}}"#), None);
    }
}
