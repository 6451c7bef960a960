//! HTTP surface.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET  | `/health`  | `{"status":"ok"}` |
//! | POST | `/process` | multipart `pdfFile` → [`InferenceResult`] or [`ErrorEnvelope`] |
//! | GET  | anything else | static assets, when `static_dir` is configured |
//!
//! A panic in any handler is caught and turned into a 500 envelope, so the
//! client always receives JSON no matter which route failed.

use crate::config::GatewayConfig;
use crate::error::{ErrorEnvelope, GatewayError};
use crate::output::InferenceResult;
use crate::pipeline::remote::InferenceClient;
use crate::process;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

/// State shared by every handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub client: InferenceClient,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = InferenceClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /process`
///
/// A body that is not multipart at all is treated the same as a multipart
/// body without a file.
pub async fn process(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InferenceResult>, GatewayError> {
    let multipart = multipart.map_err(|rejection| {
        warn!("Not a multipart upload: {}", rejection.body_text());
        GatewayError::MissingFile
    })?;

    let result = process::process_upload(multipart, &state.config, &state.client).await?;
    info!("Sending result to client");
    Ok(Json(result))
}

/// Routes and state, without middleware.
pub fn routes(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;
    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/process",
            post(process).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state);

    match static_dir {
        Some(dir) => {
            info!("Serving static assets from {}", dir.display());
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}

/// Wrap a router with the panic catch-all and request tracing.
pub fn with_middleware(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(panic_response)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::DEBUG))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The complete application router.
pub fn app(state: AppState) -> Router {
    with_middleware(routes(state))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown error".to_string()
    };
    tracing::error!("Handler panicked: {}", details);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::new("internal server error", details)),
    )
        .into_response()
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server is running on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_details() {
        let resp = panic_response(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = panic_response(Box::new(String::from("owned boom")));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = panic_response(Box::new(17u8));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
