use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use roadlaw_agent::{ConversationTurn, Orchestrator};
use serde::Deserialize;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::require_api_key;
use crate::error::ApiError;

/// Chat route, versioned like the rest of the public API.
pub const CHAT_PATH: &str = "/api/v0/agent/chat";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<dyn Orchestrator>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, api_key: Option<String>) -> Self {
        Self { orchestrator, api_key: api_key.map(Arc::from) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub chat_history: Option<Vec<ConversationTurn>>,
    /// Logged only.
    pub user_id: String,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let protected = Router::new()
        .route(CHAT_PATH, post(chat))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid BACKEND_HOST/BACKEND_PORT '{host}:{port}'"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("roadlaw listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy", "message": "Service is running"}))
}

/// Stream the run as NDJSON. The pipeline is driven by the response body, so
/// a client disconnect drops it mid-run.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let history = request.chat_history.unwrap_or_default();
    info!(
        user_id = %request.user_id,
        query_len = request.query.len(),
        history = history.len(),
        "chat request"
    );

    let events = state.orchestrator.process(request.query, history);
    let body = Body::from_stream(events.map(|event| event.to_ndjson()));

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream"), (header::CACHE_CONTROL, "no-cache")],
        body,
    )
        .into_response())
}
