//! 流式输出模块
//!
//! 上游推理服务返回的是一份完整回答；本模块把它按段落切分，
//! 再以固定间隔逐块发出，模拟增量生成。
//!
//! SSE 帧格式：`data: <payload>\n\n`，最后追加一个空的
//! `data:` 帧作为结束标记。响应体是惰性流，
//! 客户端断开即丢弃流，剩余分块不再计算或发送——
//! 取消是正常退出，不是错误。

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;

/// 一个待发送的分块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// 发送顺序，从 0 开始
    pub sequence_index: usize,
    /// 去除首尾空白后的非空文本段
    pub payload: String,
}

/// 把完整回答切分为有序分块
///
/// 步骤：去掉首尾任意数量的外层双引号（可以不成对），
/// 把字面 `\n` 转义序列还原为换行，按空行（`\n\n`）切段，
/// 逐段 trim，丢弃空段，按存活顺序编号。
pub fn segment(answer: &str) -> Vec<StreamChunk> {
    let text = answer.trim().trim_matches('"');

    text.replace("\\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(sequence_index, payload)| StreamChunk {
            sequence_index,
            payload: payload.to_string(),
        })
        .collect()
}

/// 生成逐块推进的 SSE 帧流
///
/// 发送间隔严格位于相邻两次发送之间：首块之前、
/// 末块（含结束标记）之后都没有等待。
/// sleep 是让出式的，不会阻塞运行时的其他任务。
pub fn chunk_stream<I>(
    chunks: I,
    delay: Duration,
) -> impl Stream<Item = Result<String, Infallible>> + Send
where
    I: IntoIterator<Item = StreamChunk> + Send + 'static,
    I::IntoIter: Send,
{
    async_stream::stream! {
        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            yield Ok(format!("data: {}\n\n", chunk.payload));
        }
        // 结束标记：空 data 帧
        yield Ok("data: \n\n".to_string());
    }
}

/// 把分块序列包装成 `text/event-stream` 响应
pub fn sse_response(chunks: Vec<StreamChunk>, delay: Duration) -> Response {
    let body = Body::from_stream(chunk_stream(chunks, delay));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build SSE response: {}", e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap_or_default()
        })
}
