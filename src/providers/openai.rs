//! OpenAI 兼容 Provider
//!
//! 调用 `/chat/completions` 获取一份完整回答。
//! 超时由配置给定（缺省 60 秒），上游流式能力不被使用。

use crate::config::LlmConfig;
use crate::error::ChatError;
use crate::providers::CompletionProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    /// 构建 Provider
    ///
    /// 客户端构建失败直接向上返回，避免丢失配置的超时。
    pub fn new(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, system_text: &str, user_text: &str) -> Result<String, ChatError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_text.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_text.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("[OPENAI] POST {} model={}", url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::CompletionFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("[OPENAI] Upstream error HTTP {}: {}", status, body);
            return Err(ChatError::CompletionFailure(format!(
                "upstream returned HTTP {status}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ChatError::CompletionFailure(format!("invalid upstream body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ChatError::CompletionFailure("upstream response contained no content".to_string())
            })
    }
}
