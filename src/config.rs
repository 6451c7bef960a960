//! Gateway configuration.
//!
//! Everything the two request-path stages need is held in one immutable
//! [`GatewayConfig`], built once at startup through [`GatewayConfigBuilder`]
//! and shared by reference (behind an `Arc` in the router state). Nothing in
//! the request path reads the environment.
//!
//! The defaults reproduce the fixed policy of the service: `application/pdf`
//! only, 10 MiB ceiling, `deepseek-chat`, temperature 0.7, 2000 output tokens,
//! 60-second timeout. The builder exists so deployments can swap the API key
//! and endpoint, and so tests can point at a local mock.

use crate::error::GatewayError;
use crate::prompts::{DEFAULT_INSTRUCTION, DEFAULT_MODEL};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The only accepted upload media type.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Upload size ceiling: 10 × 1024 × 1024 bytes.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Name of the multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "pdfFile";

/// Default remote chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";

/// Configuration for the upload gateway.
///
/// Built via [`GatewayConfig::builder()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfgate::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .api_key("sk-test")
///     .upload_dir("/tmp/pdfgate")
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, 60);
/// ```
#[derive(Clone)]
pub struct GatewayConfig {
    /// Bearer token sent to the remote endpoint.
    pub api_key: String,

    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,

    /// Model identifier placed in every request.
    pub model: String,

    /// Instruction sent alongside every file. Never contains user input.
    pub instruction: String,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum output tokens. Default: 2000.
    pub max_tokens: usize,

    /// Timeout for the single outbound call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Largest accepted file in bytes. Default: [`MAX_UPLOAD_BYTES`].
    pub max_upload_bytes: u64,

    /// Ceiling on the whole request body, multipart framing included.
    ///
    /// Must comfortably exceed `max_upload_bytes` so that an oversized file
    /// is still received and rejected with a validation error rather than
    /// cut off mid-stream. Default: 64 MiB.
    pub max_body_bytes: usize,

    /// Directory that holds transient uploads. Default: `uploads`.
    pub upload_dir: PathBuf,

    /// Optional directory of static assets served for unmatched GET paths.
    pub static_dir: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            api_timeout_secs: 60,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_body_bytes: 64 * 1024 * 1024,
            upload_dir: PathBuf::from("uploads"),
            static_dir: None,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("upload_dir", &self.upload_dir)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl GatewayConfig {
    /// Create a new builder for `GatewayConfig`.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.instruction = instruction.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, n: u64) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.config.max_body_bytes = n;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.static_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GatewayConfig, GatewayError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "API key is empty; set DEEPSEEK_API_KEY or pass --api-key".into(),
            ));
        }
        match reqwest::Url::parse(&c.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(GatewayError::InvalidConfig(format!(
                    "endpoint must be http or https, got '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(GatewayError::InvalidConfig(format!(
                    "endpoint '{}' is not a valid URL: {}",
                    c.endpoint, e
                )))
            }
        }
        if c.api_timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(GatewayError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(GatewayError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if (c.max_body_bytes as u64) <= c.max_upload_bytes {
            return Err(GatewayError::InvalidConfig(format!(
                "max_body_bytes ({}) must exceed max_upload_bytes ({})",
                c.max_body_bytes, c.max_upload_bytes
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_policy() {
        let c = GatewayConfig::default();
        assert_eq!(c.model, "deepseek-chat");
        assert_eq!(c.temperature, 0.7);
        assert_eq!(c.max_tokens, 2000);
        assert_eq!(c.api_timeout(), Duration::from_secs(60));
        assert_eq!(c.max_upload_bytes, 10_485_760);
        assert_eq!(c.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn build_requires_api_key() {
        let err = GatewayConfig::builder().build().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_bad_endpoint() {
        let err = GatewayConfig::builder()
            .api_key("k")
            .endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a valid URL"), "got: {err}");

        let err = GatewayConfig::builder()
            .api_key("k")
            .endpoint("ftp://example.com/x")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp"), "got: {err}");
    }

    #[test]
    fn build_rejects_zero_timeout() {
        let err = GatewayConfig::builder()
            .api_key("k")
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn build_rejects_body_limit_below_upload_limit() {
        let err = GatewayConfig::builder()
            .api_key("k")
            .max_upload_bytes(1024)
            .max_body_bytes(1024)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_body_bytes"));
    }

    #[test]
    fn debug_redacts_key() {
        let c = GatewayConfig::builder()
            .api_key("sk-very-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
