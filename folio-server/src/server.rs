use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use folio_rag::{ChatRequest, ChatService, RagError};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::config::ServerConfig;

/// Response header carrying the session id, minted or echoed.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self { chat: Arc::new(chat) }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for folio-server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("folio-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"folio-server"}))
}

/// Streams the answer as plain text. Headers go out before the first token,
/// so a failure after that point cuts the body short instead of changing
/// the status.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    // The id is echoed in a header, so reject it before any retrieval work.
    if let Some(supplied) = request.session_id.as_deref() {
        session_header(supplied.trim())?;
    }
    let response = state.chat.respond(request).await?;
    let session_id = session_header(response.session_id.as_str())?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (HeaderName::from_static(SESSION_HEADER), session_id),
        ],
        Body::from_stream(response.stream),
    )
        .into_response())
}

fn session_header(session_id: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(session_id).map_err(|_| {
        ApiError(RagError::InvalidRequest("sessionId is not a valid header value".to_string()))
    })
}

/// Maps library errors onto HTTP statuses. Server-side details stay in the
/// logs.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(error: RagError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RagError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = if self.0.is_client_error() {
            warn!(error = %self.0, "rejected chat request");
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            error!(error = %self.0, "chat request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to process chat request".to_string())
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
