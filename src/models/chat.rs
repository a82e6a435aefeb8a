//! HTTP 接口数据模型

use serde::{Deserialize, Serialize};

/// `/chat` 与 `/chat/stream` 的请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// `/chat` 的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub result: String,
}

/// `/upload` 的请求体：文件名 + Base64 编码的文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadRequest {
    pub filename: String,
    pub data: String,
}

/// 上传成功后返回的表格概要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
}

/// `/upload` 的成功响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub summary: UploadSummary,
}

/// `/data-status` 的响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStatusResponse {
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub rows: usize,
    pub columns: usize,
}
