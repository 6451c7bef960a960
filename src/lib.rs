//! # edgequake-pdfgate
//!
//! A small HTTP gateway that accepts a PDF upload, forwards it to an LLM
//! chat-completions API together with a fixed instruction, and returns the
//! model's answer in one stable JSON shape.
//!
//! The gateway never looks inside the PDF. It is a transport and
//! normalisation layer: validate the upload, base64 it, make one remote call
//! with a bounded timeout, map whatever comes back onto a uniform contract,
//! and delete the transient file on every path.
//!
//! ## Request Flow
//!
//! ```text
//! POST /process (multipart pdfFile)
//!  │
//!  ├─ 1. Upload     stream part to a transient file under upload_dir
//!  ├─ 2. Validate   present? application/pdf? ≤ 10 MiB?      ──▶ 400
//!  ├─ 3. Encode     read back, base64
//!  ├─ 4. Remote     one POST, bearer auth, 60 s timeout      ──▶ 500
//!  ├─ 5. Normalize  choices[0].message.content or sentinel   ──▶ 200 / 500
//!  └─ 6. Cleanup    transient file removed, whatever happened
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfgate::{server, AppState, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::builder()
//!         .api_key(std::env::var("DEEPSEEK_API_KEY")?)
//!         .build()?;
//!     std::fs::create_dir_all(&config.upload_dir)?;
//!     let state = AppState::new(config)?;
//!     server::serve("0.0.0.0:3000".parse()?, state, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfgate` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    GatewayConfig, GatewayConfigBuilder, MAX_UPLOAD_BYTES, PDF_MIME_TYPE, UPLOAD_FIELD,
};
pub use error::{ErrorEnvelope, GatewayError};
pub use output::InferenceResult;
pub use pipeline::remote::{InferenceClient, InferenceRequest};
pub use process::{analyze, extract_local, process_upload};
pub use server::AppState;
