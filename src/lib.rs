//! sheetchat - 基于上传表格数据的对话后端
//!
//! 工作流：上传表格 -> 归一化为受限预览 -> 携带预览向外部
//! 推理服务提问 -> 把完整回答切块后以 SSE 逐步送出。

pub mod composer;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod providers;
pub mod server;
pub mod session;
pub mod stream;

pub use config::Config;
pub use server::{build_router, run_server, AppState};
