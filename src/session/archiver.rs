//! 会话归档：压缩转录 → 后端生成结构化摘要 → 合并进长期记忆
//!
//! 摘要失败（后端错误、JSON 无法解析）时使用本地兜底摘要；归档本身从不向调用方报错。

use std::sync::Arc;

use chrono::Local;

use crate::llm::{CompletionRequest, LlmClient};
use crate::memory::{
    ArchivedSession, ContentBlock, MemoryStore, Message, Role, SessionInsights, TranscriptEntry,
};
use crate::prompts::SUMMARIZE_PROMPT;
use crate::session::Session;
use crate::text::truncate_chars;

const TRANSCRIPT_TEXT_CHARS: usize = 500;
const TRANSCRIPT_MAX_ENTRIES: usize = 30;
const FALLBACK_QUOTE_CHARS: usize = 100;
const FALLBACK_MAX_CHARS: usize = 300;

pub struct SessionArchiver {
    llm: Arc<dyn LlmClient>,
    memory: Arc<MemoryStore>,
    max_tokens: u32,
}

impl SessionArchiver {
    pub fn new(llm: Arc<dyn LlmClient>, memory: Arc<MemoryStore>, max_tokens: u32) -> Self {
        Self {
            llm,
            memory,
            max_tokens,
        }
    }

    /// 归档一个会话；持久化失败只记日志
    pub async fn archive(&self, user_id: &str, session: &Session) {
        let transcript = extract_transcript(session.messages().messages());
        let insights = self.summarize(&transcript, session).await;

        let summary = if insights.summary.trim().is_empty() {
            fallback_summary(session)
        } else {
            insights.summary.clone()
        };
        let archived = ArchivedSession {
            session_id: session.id.clone(),
            started_at: session.started_at.to_rfc3339(),
            ended_at: Local::now().to_rfc3339(),
            summary,
            transcript: Some(transcript),
        };

        let caps = *self.memory.caps();
        let retention = self.memory.retention();
        let topic = session.topic.clone();
        let result = self
            .memory
            .update(user_id, |record| {
                record.push_session(archived, retention);
                record.merge_insights(&insights, topic.as_deref(), &caps);
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!(user_id = %user_id, session_id = %session.id, "session archived")
            }
            Err(e) => tracing::error!(
                user_id = %user_id,
                session_id = %session.id,
                error = %e,
                "failed to archive session"
            ),
        }
    }

    /// 结构化摘要；失败时返回空洞察
    async fn summarize(
        &self,
        transcript: &[TranscriptEntry],
        session: &Session,
    ) -> SessionInsights {
        let transcript_text = transcript
            .iter()
            .map(|e| {
                let who = if e.role == "user" { "Creator" } else { "Sora" };
                format!("{}: {}", who, e.text)
            })
            .collect::<Vec<_>>()
            .join("\n");
        if transcript_text.trim().is_empty() {
            return SessionInsights::default();
        }

        let mut meta = format!(
            "Platform: {}. Topic: {}. ",
            session.platform.map(|p| p.as_str()).unwrap_or("not set"),
            session.topic.as_deref().unwrap_or("not set")
        );
        if let Some(key) = session.approved_option {
            meta.push_str(&format!("The creator approved Option {}.", key.upper()));
        }
        let user_message = format!(
            "Session metadata: {}\n\nTranscript:\n{}",
            meta, transcript_text
        );

        let request = CompletionRequest::single(SUMMARIZE_PROMPT, user_message, self.max_tokens);
        let response = match self.llm.complete(&request).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "session summarization failed, using fallback");
                return SessionInsights::default();
            }
        };

        let raw = strip_code_fences(&response.text());
        match serde_json::from_str::<SessionInsights>(&raw) {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!(error = %e, "summary is not valid JSON, using fallback");
                SessionInsights::default()
            }
        }
    }
}

/// 每条消息压缩为一行：文本截断到 500 字，工具调用 / 结果 / 图片用占位符；保留最后 30 条
pub fn extract_transcript(messages: &[Message]) -> Vec<TranscriptEntry> {
    let mut entries: Vec<TranscriptEntry> = messages
        .iter()
        .filter_map(|msg| {
            let parts: Vec<String> = msg
                .content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => truncate_chars(text, TRANSCRIPT_TEXT_CHARS),
                    ContentBlock::ToolUse { name, .. } => format!("[tool: {}]", name),
                    ContentBlock::ToolResult { .. } => "[tool result]".to_string(),
                    ContentBlock::Image { .. } => "[image]".to_string(),
                })
                .collect();
            if parts.is_empty() {
                return None;
            }
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            Some(TranscriptEntry {
                role: role.to_string(),
                text: parts.join(" | "),
            })
        })
        .collect();
    if entries.len() > TRANSCRIPT_MAX_ENTRIES {
        entries.drain(..entries.len() - TRANSCRIPT_MAX_ENTRIES);
    }
    entries
}

/// 本地兜底摘要
pub fn fallback_summary(session: &Session) -> String {
    let outcome = session
        .approved_option
        .map(|k| format!("Option {}", k.upper()))
        .unwrap_or_else(|| "no approval".to_string());
    let mut summary = format!(
        "Topic: {}. Platform: {}. Outcome: {}.",
        session.topic.as_deref().unwrap_or("unspecified topic"),
        session.platform.map(|p| p.as_str()).unwrap_or("unspecified"),
        outcome
    );
    if let Some(text) = session.first_user_text() {
        summary.push_str(&format!(
            " User said: '{}'",
            truncate_chars(text, FALLBACK_QUOTE_CHARS)
        ));
    }
    truncate_chars(&summary, FALLBACK_MAX_CHARS)
}

/// 去掉 ``` / ```json 围栏
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let body = trimmed.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}
