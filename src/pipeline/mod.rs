//! Request-path stages.
//!
//! Each submodule implements exactly one step of turning an uploaded PDF
//! into the normalised reply. Keeping them apart lets the HTTP handler and
//! the `extract` CLI mode share the same encode → remote → normalize chain
//! while entering it from different places.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ encode ──▶ remote ──▶ normalize
//! (multipart  (base64)   (HTTPS,    (choices[0].message.content
//!  → temp)               bearer)     or sentinel / error)
//! ```
//!
//! 1. [`upload`]   : stream the `pdfFile` field to a transient file, then
//!    validate presence, MIME type and size
//! 2. [`encode`]   : read the transient file back and base64 it
//! 3. [`remote`]   : build the fixed-shape request and issue the single call
//! 4. [`normalize`]: map the remote body onto the local result contract

pub mod encode;
pub mod normalize;
pub mod remote;
pub mod upload;
