//! Mock 后端（用于测试，无需 API）
//!
//! ScriptedLlmClient 按顺序返回预置响应；脚本耗尽后返回 end_turn 文本。循环模式下永远重复同一步，
//! 用于验证迭代上限。所有请求都会被记录，便于断言历史顺序与系统提示内容。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::llm::{
    CompletionRequest, CompletionResponse, ImageBackend, ImageSize, LlmClient, LlmError, StopReason,
};
use crate::memory::ContentBlock;

/// 单步脚本
#[derive(Debug, Clone)]
pub enum MockStep {
    /// 文本回复，正常结束
    Text(String),
    /// 一次响应中的若干工具调用（可附带前置文本）
    ToolCalls {
        text: Option<String>,
        calls: Vec<(String, Value)>,
    },
    /// 后端失败
    Fail(LlmError),
}

impl MockStep {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tool(name: impl Into<String>, input: Value) -> Self {
        Self::ToolCalls {
            text: None,
            calls: vec![(name.into(), input)],
        }
    }

    pub fn tools(calls: Vec<(&str, Value)>) -> Self {
        Self::ToolCalls {
            text: None,
            calls: calls.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
        }
    }
}

/// 按脚本应答的后端
pub struct ScriptedLlmClient {
    steps: Mutex<VecDeque<MockStep>>,
    repeat: Option<MockStep>,
    requests: Mutex<Vec<CompletionRequest>>,
    next_id: AtomicUsize,
}

impl ScriptedLlmClient {
    pub fn new(steps: Vec<MockStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// 循环模式：每次调用都返回同一步
    pub fn repeating(step: MockStep) -> Self {
        Self {
            repeat: Some(step),
            ..Self::new(Vec::new())
        }
    }

    /// 单步返回固定文本（正文生成 / 摘要等无工具调用场景）
    pub fn always_text(text: impl Into<String>) -> Self {
        Self::repeating(MockStep::Text(text.into()))
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    fn render(&self, step: MockStep) -> Result<CompletionResponse, LlmError> {
        match step {
            MockStep::Text(text) => Ok(CompletionResponse {
                content: vec![ContentBlock::Text { text }],
                stop_reason: StopReason::EndTurn,
            }),
            MockStep::ToolCalls { text, calls } => {
                let mut content = Vec::new();
                if let Some(text) = text {
                    content.push(ContentBlock::Text { text });
                }
                for (name, input) in calls {
                    let n = self.next_id.fetch_add(1, Ordering::Relaxed);
                    content.push(ContentBlock::ToolUse {
                        id: format!("toolu_{:04}", n),
                        name,
                        input,
                    });
                }
                Ok(CompletionResponse {
                    content,
                    stop_reason: StopReason::ToolUse,
                })
            }
            MockStep::Fail(e) => Err(e),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().await.push(request.clone());
        let step = match &self.repeat {
            Some(step) => step.clone(),
            None => self
                .steps
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| MockStep::Text("(script exhausted)".to_string())),
        };
        self.render(step)
    }
}

/// 固定返回同一张图的图片后端
pub struct StaticImageBackend {
    bytes: Vec<u8>,
    fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl StaticImageBackend {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ImageBackend for StaticImageBackend {
    async fn generate(&self, prompt: &str, _size: &ImageSize) -> Result<Vec<u8>, LlmError> {
        self.prompts.lock().await.push(prompt.to_string());
        if self.fail {
            return Err(LlmError::Api("image backend unavailable".to_string()));
        }
        Ok(self.bytes.clone())
    }
}
