//! 外部推理服务边界
//!
//! 以 [`CompletionProvider`] 为接缝：给定 system 文本与 user 文本，
//! 返回一份完整的回答文本。不假设上游支持流式输出。

pub mod openai;

pub use openai::OpenAiProvider;

use crate::error::ChatError;
use async_trait::async_trait;

/// 一次性补全接口
///
/// 失败语义：网络错误、非 2xx 状态、响应结构异常均视为
/// [`ChatError::CompletionFailure`]。本层不重试。
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system_text: &str, user_text: &str) -> Result<String, ChatError>;
}
