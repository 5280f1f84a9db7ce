//! 顶层错误类型
//!
//! 一轮对话中只有后端调用失败会冒泡到调用方；工具内部错误在执行器边界已转为失败文本。

use thiserror::Error;

use crate::llm::LlmError;

/// 对话轮次中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 策略循环中的后端调用失败（网络、超时、限流、响应不可解析）
    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),
}
