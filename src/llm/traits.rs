//! 后端抽象
//!
//! 文本后端实现 LlmClient：一次 complete 接收系统提示、完整历史与工具 schema，
//! 返回内容块（文本 / 工具调用）与停止原因。图片后端实现 ImageBackend。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::memory::{ContentBlock, Message};

/// 后端调用失败；调用方按普通失败处理，不做重试
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("rate limited (retry after {retry_after_ms}ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// 工具声明：名称、用途描述、参数 JSON Schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// 无工具的单轮请求（正文生成、会话摘要）
    pub fn single(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            messages: vec![Message::user(user)],
            tools: Vec::new(),
            max_tokens,
        }
    }
}

/// 停止原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 正常结束
    EndTurn,
    /// 等待工具结果
    ToolUse,
    /// 达到输出上限
    MaxTokens,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

impl CompletionResponse {
    /// 拼接所有文本块
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

/// 文本后端
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// 生成图尺寸（平台决定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSize(pub String);

impl ImageSize {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 图片后端：文本提示 → 图片字节
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate(&self, prompt: &str, size: &ImageSize) -> Result<Vec<u8>, LlmError>;
}
