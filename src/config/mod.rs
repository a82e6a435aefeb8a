//! 配置管理模块
//!
//! 提供 YAML 配置文件支持，缺省路径位于用户配置目录下，
//! 可通过 `SHEETCHAT_CONFIG` 环境变量覆盖。
//! API Key 始终优先读取 `OPENAI_API_KEY` 环境变量。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// 服务器监听配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 上传请求体大小上限 (MB)
    pub body_limit_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            body_limit_mb: 20,
        }
    }
}

/// 外部推理服务配置 (OpenAI 兼容接口)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// 单次补全请求超时 (秒)
    pub timeout_secs: u64,
    /// API Key，留空则由 OPENAI_API_KEY 环境变量提供
    pub api_key: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-nano".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            api_key: String::new(),
        }
    }
}

/// 流式输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// 相邻两个分块之间的发送间隔 (毫秒)
    pub chunk_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { chunk_delay_ms: 600 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub stream: StreamConfig,
}

impl Config {
    /// 缺省配置文件路径：`<config_dir>/sheetchat/config.yaml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetchat")
            .join("config.yaml")
    }

    /// 加载配置
    ///
    /// 优先级：`SHEETCHAT_CONFIG` 指定的文件 > 缺省路径文件 > 内置默认值。
    /// 文件不存在不是错误；文件存在但不可读/不可解析才报错。
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SHEETCHAT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_config_path());

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            tracing::info!("[CONFIG] No config file at {:?}, using defaults", path);
            Self::default()
        };

        // 环境变量中的 API Key 始终覆盖配置文件
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.llm.api_key = key;
            }
        }

        Ok(config)
    }
}
