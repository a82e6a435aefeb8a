//! HTTP API 服务器
//!
//! 路由与 handler：上传、清空、状态查询、一次性对话与流式对话。
//! 会话存储与回答组装器通过 `AppState` 注入，便于测试替换。

use crate::composer::AnswerComposer;
use crate::config::Config;
use crate::error::{ChatError, IngestError};
use crate::ingest::ingest_upload;
use crate::models::{ChatRequest, ChatResponse, FileUploadRequest, UploadResponse, UploadSummary};
use crate::providers::CompletionProvider;
use crate::session::DatasetStore;
use crate::stream::{segment, sse_response};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: DatasetStore,
    pub composer: Arc<AnswerComposer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            store: DatasetStore::new(),
            composer: Arc::new(AnswerComposer::new(provider)),
            config: Arc::new(config),
        }
    }

    fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.config.stream.chunk_delay_ms)
    }
}

/// 组装路由表
///
/// 与原前端约定保持一致：所有来源放行，
/// 请求体大小限制只约束上传体积。
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.server.body_limit_mb * 1024 * 1024;

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/clear-data", post(clear_data))
        .route("/data-status", get(data_status))
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// 启动服务器，Ctrl-C 时优雅退出
pub async fn run_server(
    config: Config,
    provider: Arc<dyn CompletionProvider>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: std::net::SocketAddr =
        format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = build_router(AppState::new(config, provider));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "has_data": state.store.read().is_some(),
    }))
}

/// POST /upload
///
/// 摄取成功才提交到会话存储；任何失败都不触碰槽位。
async fn upload(
    State(state): State<AppState>,
    Json(request): Json<FileUploadRequest>,
) -> Result<Json<UploadResponse>, IngestError> {
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        "[REQ] POST /upload request_id={} filename={}",
        request_id,
        request.filename
    );

    let preview = ingest_upload(&request.filename, &request.data).inspect_err(|e| {
        tracing::warn!("[INGEST] request_id={} rejected: {}", request_id, e);
    })?;

    let summary = UploadSummary {
        rows: preview.total_rows,
        columns: preview.total_columns,
        column_names: preview.column_names.clone(),
    };
    let message = format!("File '{}' uploaded successfully", preview.filename);
    state.store.replace(preview);

    Ok(Json(UploadResponse {
        success: true,
        message,
        summary,
    }))
}

/// POST /clear-data，幂等
async fn clear_data(State(state): State<AppState>) -> impl IntoResponse {
    state.store.clear();
    Json(serde_json::json!({
        "success": true,
        "message": "Uploaded data cleared",
    }))
}

/// GET /data-status
async fn data_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.status())
}

/// POST /chat：完整回答，不分块
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    if request.message.trim().is_empty() {
        return Err(ChatError::EmptyQuery);
    }

    let request_id = uuid::Uuid::new_v4();
    tracing::info!("[REQ] POST /chat request_id={}", request_id);

    let preview = state.store.read();
    let result = state
        .composer
        .answer(&request.message, preview.as_deref())
        .await?;

    Ok(Json(ChatResponse { result }))
}

/// POST /chat/stream
///
/// 先完整拿到回答再开流：所有可能失败的路径都在
/// 流开始之前解决，已开始的流只会正常结束或被客户端取消。
async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.message.trim().is_empty() {
        return ChatError::EmptyQuery.into_response();
    }

    let request_id = uuid::Uuid::new_v4();
    tracing::info!("[REQ] POST /chat/stream request_id={}", request_id);

    let preview = state.store.read();
    let answer = match state
        .composer
        .answer(&request.message, preview.as_deref())
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            tracing::warn!("[STREAM] request_id={} composer failed: {}", request_id, e);
            return e.into_response();
        }
    };

    let chunks = segment(&answer);
    tracing::info!(
        "[STREAM] request_id={} emitting {} chunks",
        request_id,
        chunks.len()
    );
    sse_response(chunks, state.chunk_delay())
}
