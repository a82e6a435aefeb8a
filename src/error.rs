//! 错误类型定义
//!
//! 摄取错误与对话错误分开建模；
//! 所有错误最终映射为 `{"error": <message>}` 形式的 JSON 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// 文件摄取阶段的错误
#[derive(Debug, Error)]
pub enum IngestError {
    /// 扩展名不在支持列表内，解析前即拒绝
    #[error("Unsupported file format: {0}. Please upload an Excel or CSV file.")]
    UnsupportedFormat(String),

    /// 文件内容无法解码或解析，附带底层解码器信息
    #[error("Failed to read file: {0}")]
    MalformedFile(String),
}

/// 对话阶段的错误
#[derive(Debug, Error)]
pub enum ChatError {
    /// 空消息，进入 Composer 前即拒绝
    #[error("Message must not be empty")]
    EmptyQuery,

    /// 外部推理服务调用失败（网络、限流、响应结构异常）
    #[error("Completion request failed: {0}")]
    CompletionFailure(String),
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestError::UnsupportedFormat(_) | IngestError::MalformedFile(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        (
            status,
            Json(serde_json::json!({"error": self.to_string()})),
        )
            .into_response()
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match &self {
            ChatError::EmptyQuery => StatusCode::BAD_REQUEST,
            ChatError::CompletionFailure(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(serde_json::json!({"error": self.to_string()})),
        )
            .into_response()
    }
}
