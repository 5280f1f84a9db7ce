//! 策略循环
//!
//! 一轮：追加用户消息 → 组装系统提示 → 调用后端 → 文本块转为动作、工具调用按序执行
//! → 工具结果合并为一条用户消息 → 再次调用后端，直到没有工具调用或达到迭代上限。
//! 助手消息总是在其工具执行之前写入历史，工具结果按调用 id 配对。

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::AgentError;
use crate::llm::{CompletionRequest, LlmClient};
use crate::memory::{ContentBlock, Message, Role};
use crate::prompts::strategist::{build_strategist_system_prompt, StrategistPromptParts};
use crate::prompts::load_brand_voice;
use crate::session::Session;
use crate::strategist::events::{send_event, StrategistEvent};
use crate::text::preview;
use crate::tools::{tool_schemas, Action, ToolExecutor};

/// 后端调用失败时调用方展示给用户的文本；会话保持原样，可直接重试
pub const GENERIC_FAILURE_TEXT: &str =
    "Sorry, something went wrong on my side. Please send your message again.";

/// 事件中工具结果预览的最大字符数
const RESULT_PREVIEW_CHARS: usize = 200;

/// 策略师的协作者
pub struct StrategistDeps {
    pub llm: Arc<dyn LlmClient>,
    pub tools: ToolExecutor,
    /// 品牌语调指南路径，每轮重新读取
    pub brand_voice_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct StrategistSettings {
    pub max_iterations: usize,
    pub max_tokens: u32,
    pub publish_enabled: bool,
}

impl Default for StrategistSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_tokens: 2048,
            publish_enabled: false,
        }
    }
}

pub struct Strategist {
    deps: StrategistDeps,
    settings: StrategistSettings,
}

impl Strategist {
    pub fn new(deps: StrategistDeps, settings: StrategistSettings) -> Self {
        Self { deps, settings }
    }

    pub fn settings(&self) -> &StrategistSettings {
        &self.settings
    }

    pub fn tools(&self) -> &ToolExecutor {
        &self.deps.tools
    }

    /// 跑一轮对话，返回按产生顺序排列的动作
    pub async fn run_turn(
        &self,
        session: &mut Session,
        content: Vec<ContentBlock>,
        memory_context: &str,
    ) -> Result<Vec<Action>, AgentError> {
        self.run_turn_with_events(session, content, memory_context, None)
            .await
    }

    /// 同 run_turn，并向 event_tx 推送进度事件
    pub async fn run_turn_with_events(
        &self,
        session: &mut Session,
        content: Vec<ContentBlock>,
        memory_context: &str,
        event_tx: Option<&UnboundedSender<StrategistEvent>>,
    ) -> Result<Vec<Action>, AgentError> {
        session.push_message(Message::new(Role::User, content));

        let system = self.system_prompt(memory_context).await;
        let tools = tool_schemas();
        let max_iterations = self.settings.max_iterations;
        let mut actions = Vec::new();

        for iteration in 1..=max_iterations {
            send_event(
                &event_tx,
                StrategistEvent::Thinking {
                    iteration,
                    max_iterations,
                },
            );

            let request = CompletionRequest {
                system: system.clone(),
                messages: session.messages().messages().to_vec(),
                tools: tools.clone(),
                max_tokens: self.settings.max_tokens,
            };
            let response = self.deps.llm.complete(&request).await?;
            tracing::info!(
                session_id = %session.id,
                iteration,
                stop_reason = ?response.stop_reason,
                blocks = response.content.len(),
                "strategist response"
            );

            let wants_tools = response.has_tool_use();
            let mut calls: Vec<(String, String, Value)> = Vec::new();
            for block in &response.content {
                match block {
                    ContentBlock::Text { text } if !text.trim().is_empty() => {
                        actions.push(Action::text(text.clone()));
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        calls.push((id.clone(), name.clone(), input.clone()));
                    }
                    _ => {}
                }
            }
            session.push_message(Message::new(Role::Assistant, response.content));

            if !wants_tools {
                send_event(&event_tx, StrategistEvent::Done { iterations: iteration });
                return Ok(actions);
            }

            let mut results = Vec::with_capacity(calls.len());
            for (id, name, input) in calls {
                tracing::info!(tool = %name, call_id = %id, "tool call");
                send_event(
                    &event_tx,
                    StrategistEvent::ToolCall {
                        tool: name.clone(),
                        args: input.clone(),
                    },
                );

                let output = self.deps.tools.execute(&name, input, session).await;

                send_event(
                    &event_tx,
                    StrategistEvent::ToolResult {
                        tool: name,
                        ok: !output.is_error,
                        preview: preview(&output.content, RESULT_PREVIEW_CHARS),
                    },
                );
                actions.extend(output.actions);
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: output.content,
                    is_error: output.is_error,
                });
            }
            session.push_message(Message::new(Role::User, results));
        }

        tracing::warn!(
            session_id = %session.id,
            max_iterations,
            "iteration ceiling reached, ending turn"
        );
        send_event(
            &event_tx,
            StrategistEvent::Done {
                iterations: max_iterations,
            },
        );
        Ok(actions)
    }

    async fn system_prompt(&self, memory_context: &str) -> String {
        let brand_voice = load_brand_voice(self.deps.brand_voice_path.as_deref());
        let preference_summary = self.deps.tools.deps().preferences.summary().await;
        build_strategist_system_prompt(&StrategistPromptParts {
            brand_voice: &brand_voice,
            memory_context,
            preference_summary: &preference_summary,
            publish_enabled: self.settings.publish_enabled,
        })
    }
}
