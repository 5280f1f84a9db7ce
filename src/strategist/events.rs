//! 策略循环过程事件：供前端展示进度（调用后端、执行工具、完成）

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategistEvent {
    /// 即将发起第 iteration 次后端调用
    Thinking {
        iteration: usize,
        max_iterations: usize,
    },
    /// 开始执行工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（确认文本预览）
    ToolResult {
        tool: String,
        ok: bool,
        preview: String,
    },
    /// 本轮结束
    Done { iterations: usize },
}

pub(crate) fn send_event(tx: &Option<&UnboundedSender<StrategistEvent>>, ev: StrategistEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}
