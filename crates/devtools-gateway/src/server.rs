//! Axum-based HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use devtools_core::ServePort;
use devtools_tools::artifact::ARTIFACT_ROUTE;
use devtools_tools::{ToolError, ToolOutput};

use crate::state::GatewayState;

/// Routes: `/health`, `/tools`, `/tools/{name}`, and the artifact directory under `/tmp`.
pub fn router(state: Arc<GatewayState>) -> Router {
    let artifacts = ServeDir::new(state.context.artifacts.dir());

    Router::new()
        .route("/health", get(health_handler))
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(call_tool_handler))
        .nest_service(ARTIFACT_ROUTE, artifacts)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, publish the bound port to `serve_port`, and serve until `shutdown` resolves.
///
/// Port `0` binds an ephemeral port.
pub async fn start_gateway(
    state: Arc<GatewayState>,
    bind_addr: &str,
    port: u16,
    serve_port: ServePort,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;
    serve_port.set(local.port());
    info!("Gateway listening on {local}");

    let app = router(state);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    serve_port.clear();
    info!("Gateway stopped");
    served?;
    Ok(())
}

/// Resolve on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools.list(),
    }))
}

async fn list_tools_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(Value::Array(state.tools.to_llm_tools()))
}

async fn call_tool_handler(
    State(state): State<Arc<GatewayState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<ToolOutput>) {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(params) => params,
            Err(e) => {
                return error_reply(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {e}"));
            }
        }
    };

    match state.tools.dispatch(&name, &params, &state.context).await {
        Ok(output) => (StatusCode::OK, Json(output)),
        Err(e) => error_reply(status_for(&e), e.to_string()),
    }
}

fn status_for(error: &ToolError) -> StatusCode {
    match error.cause() {
        ToolError::Validation { .. } => StatusCode::BAD_REQUEST,
        ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(status: StatusCode, content: String) -> (StatusCode, Json<ToolOutput>) {
    (
        status,
        Json(ToolOutput {
            content,
            is_error: true,
            media: None,
        }),
    )
}
