//! 工具执行器
//!
//! 持有各工具依赖与单次调用超时，execute(name, input, session) 按 ToolKind 穷举分发；
//! 未知工具、参数错误、处理失败、超时与 panic 都在这里转为失败文本，不会向循环抛出。
//! 每次调用输出结构化审计日志（JSON）。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

use crate::content::ContentEngine;
use crate::imaging::ImageEditor;
use crate::llm::{ImageBackend, ImageSize};
use crate::memory::PreferenceLog;
use crate::publish::{DirectPublisher, RednoteFormatter};
use crate::session::Session;
use crate::text::preview;
use crate::tools::{approval, media, produce, publishing, Action, ToolKind};

/// 平台 → 生成图尺寸
#[derive(Debug, Clone)]
pub struct ImageSizes {
    pub instagram: ImageSize,
    pub rednote: ImageSize,
}

impl Default for ImageSizes {
    fn default() -> Self {
        Self {
            instagram: ImageSize("1024x1024".to_string()),
            rednote: ImageSize("1024x1792".to_string()),
        }
    }
}

/// 工具处理函数需要的外部协作者
#[derive(Clone)]
pub struct ToolDeps {
    pub content: Arc<ContentEngine>,
    pub images: Arc<dyn ImageBackend>,
    pub image_sizes: ImageSizes,
    pub editor: Arc<dyn ImageEditor>,
    pub preferences: Arc<PreferenceLog>,
    pub publisher: Arc<dyn DirectPublisher>,
    pub rednote: RednoteFormatter,
}

/// 处理函数的非预期失败；预期内的前置条件失败走 ToolOutput::failure
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("{0}")]
    Failed(String),
}

/// 一次工具调用的结果：回给后端的确认文本 + 发给用户的动作
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub actions: Vec<Action>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            content: content.into(),
            actions,
            is_error: false,
        }
    }

    /// 失败文本，不带动作
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            actions: Vec::new(),
            is_error: true,
        }
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(input: Value) -> Result<T, ToolError> {
    Ok(serde_json::from_value(input)?)
}

pub struct ToolExecutor {
    deps: ToolDeps,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(deps: ToolDeps, timeout_secs: u64) -> Self {
        Self {
            deps,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn deps(&self) -> &ToolDeps {
        &self.deps
    }

    /// 执行指定工具；结果总是 ToolOutput，失败时 is_error 为 true 且没有动作
    pub async fn execute(&self, name: &str, input: Value, session: &mut Session) -> ToolOutput {
        let start = Instant::now();
        let args_preview = preview(&input.to_string(), 200);

        let Some(kind) = ToolKind::from_name(name) else {
            tracing::warn!(tool = %name, "unknown tool requested");
            audit(name, false, "unknown", start, &args_preview);
            return ToolOutput::failure(format!("Unknown tool: {}", name));
        };

        let guarded = AssertUnwindSafe(self.dispatch(kind, input, session)).catch_unwind();
        let (output, outcome) = match timeout(self.timeout, guarded).await {
            Ok(Ok(Ok(output))) => {
                let outcome = if output.is_error { "failed" } else { "ok" };
                (output, outcome)
            }
            Ok(Ok(Err(e))) => (ToolOutput::failure(format!("Tool error: {}", e)), "error"),
            Ok(Err(_)) => (
                ToolOutput::failure(format!("Tool error: {} panicked", name)),
                "panic",
            ),
            Err(_) => (
                ToolOutput::failure(format!(
                    "Tool error: {} timed out after {}s",
                    name,
                    self.timeout.as_secs()
                )),
                "timeout",
            ),
        };

        audit(name, !output.is_error, outcome, start, &args_preview);
        output
    }

    async fn dispatch(
        &self,
        kind: ToolKind,
        input: Value,
        session: &mut Session,
    ) -> Result<ToolOutput, ToolError> {
        let deps = &self.deps;
        match kind {
            ToolKind::GenerateTextContent => {
                produce::generate_text_content(deps, input, session).await
            }
            ToolKind::GenerateImage => media::generate_image(deps, input, session).await,
            ToolKind::ApplyBrandFilter => media::apply_brand_filter(deps, input, session).await,
            ToolKind::PresentOptions => approval::present_options(input, session),
            ToolKind::GenerateCalendar => produce::generate_calendar(deps, input).await,
            ToolKind::SaveApproval => approval::save_approval(deps, input, session).await,
            ToolKind::PublishContent => publishing::publish_content(deps, input, session).await,
        }
    }
}

fn audit(tool: &str, ok: bool, outcome: &str, start: Instant, args_preview: &str) {
    let audit = serde_json::json!({
        "event": "tool_audit",
        "tool": tool,
        "ok": ok,
        "outcome": outcome,
        "duration_ms": start.elapsed().as_millis() as u64,
        "args_preview": args_preview,
    });
    tracing::info!(audit = %audit.to_string(), "tool");
}
