//! 长期记忆记录（每用户一个 JSON 文件）
//!
//! structured_summary 累积话题、搁置的想法、风格倾向与关键决定，每次合并后立即按上限裁剪；
//! recent_sessions 保存每个归档会话的叙述摘要，只有最近 K 个保留转录。

use serde::{Deserialize, Serialize};

use crate::config::MemorySection;
use crate::text::{tail_chars, truncate_chars};

/// 各列表上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCaps {
    pub topics: usize,
    pub parked: usize,
    pub decisions: usize,
    pub style_chars: usize,
}

impl Default for MemoryCaps {
    fn default() -> Self {
        Self {
            topics: 20,
            parked: 10,
            decisions: 10,
            style_chars: 300,
        }
    }
}

impl From<&MemorySection> for MemoryCaps {
    fn from(cfg: &MemorySection) -> Self {
        Self {
            topics: cfg.topics_cap,
            parked: cfg.parked_cap,
            decisions: cfg.decisions_cap,
            style_chars: cfg.style_cap,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredSummary {
    pub topics_discussed: Vec<String>,
    pub parked_ideas: Vec<String>,
    pub style_preferences: String,
    pub decisions: Vec<String>,
}

impl StructuredSummary {
    pub fn is_empty(&self) -> bool {
        self.topics_discussed.is_empty()
            && self.parked_ideas.is_empty()
            && self.style_preferences.is_empty()
            && self.decisions.is_empty()
    }
}

/// 转录中的一行（一条消息压缩后的文本）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedSession {
    pub session_id: String,
    pub started_at: String,
    pub ended_at: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurableMemoryRecord {
    pub structured_summary: StructuredSummary,
    pub recent_sessions: Vec<ArchivedSession>,
}

/// 摘要后端返回的结构化洞察；解析失败时为默认值
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionInsights {
    pub summary: String,
    pub topics_discussed: Vec<String>,
    pub parked_ideas: Vec<String>,
    pub style_preferences: String,
    pub decisions: Vec<String>,
}

fn keep_last<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        items.drain(..items.len() - cap);
    }
}

impl DurableMemoryRecord {
    /// 把一次会话的洞察合并进 structured_summary
    ///
    /// session_topic 为会话中最后一次生成正文时的话题，视为已产出。
    pub fn merge_insights(
        &mut self,
        insights: &SessionInsights,
        session_topic: Option<&str>,
        caps: &MemoryCaps,
    ) {
        let summary = &mut self.structured_summary;

        let mut new_topics: Vec<String> = insights.topics_discussed.clone();
        if let Some(topic) = session_topic {
            if !new_topics.iter().any(|t| t == topic) {
                new_topics.push(topic.to_string());
            }
        }
        for topic in &new_topics {
            if !topic.is_empty() && !summary.topics_discussed.contains(topic) {
                summary.topics_discussed.push(topic.clone());
            }
        }
        keep_last(&mut summary.topics_discussed, caps.topics);

        // 本次已产出的话题从搁置列表移除（不区分大小写）
        let produced: Vec<String> = new_topics.iter().map(|t| t.to_lowercase()).collect();
        summary
            .parked_ideas
            .retain(|idea| !produced.contains(&idea.to_lowercase()));
        for idea in &insights.parked_ideas {
            if !idea.is_empty() && !summary.parked_ideas.contains(idea) {
                summary.parked_ideas.push(idea.clone());
            }
        }
        keep_last(&mut summary.parked_ideas, caps.parked);

        if !insights.style_preferences.is_empty() {
            summary.style_preferences = if summary.style_preferences.is_empty() {
                truncate_chars(&insights.style_preferences, caps.style_chars)
            } else {
                let combined = format!(
                    "{}; {}",
                    summary.style_preferences, insights.style_preferences
                );
                tail_chars(&combined, caps.style_chars)
            };
        }

        for decision in &insights.decisions {
            if !decision.is_empty() && !summary.decisions.contains(decision) {
                summary.decisions.push(decision.clone());
            }
        }
        keep_last(&mut summary.decisions, caps.decisions);
    }

    /// 追加归档会话，并丢弃保留窗口之外的转录
    pub fn push_session(&mut self, session: ArchivedSession, retention: usize) {
        self.recent_sessions.push(session);
        let keep_from = self.recent_sessions.len().saturating_sub(retention);
        for sess in self.recent_sessions.iter_mut().take(keep_from) {
            sess.transcript = None;
        }
    }

    /// 渲染为系统提示中的记忆上下文
    pub fn render_context(&self, retention: usize) -> String {
        let mut parts: Vec<String> = Vec::new();
        let summary = &self.structured_summary;

        if !summary.is_empty() {
            parts.push("=== CONTENT HISTORY ===".to_string());
            if !summary.topics_discussed.is_empty() {
                parts.push(format!(
                    "Topics explored: {}",
                    last_n(&summary.topics_discussed, 10).join(", ")
                ));
            }
            if !summary.parked_ideas.is_empty() {
                parts.push(format!(
                    "Parked ideas (not yet produced): {}",
                    summary.parked_ideas.join(", ")
                ));
            }
            if !summary.style_preferences.is_empty() {
                parts.push(format!("Style tendencies: {}", summary.style_preferences));
            }
            if !summary.decisions.is_empty() {
                parts.push(format!(
                    "Key decisions: {}",
                    last_n(&summary.decisions, 5).join("; ")
                ));
            }
            parts.push(String::new());
        }

        if !self.recent_sessions.is_empty() {
            parts.push("=== RECENT SESSIONS ===".to_string());
            for sess in last_n(&self.recent_sessions, retention) {
                let date = truncate_chars(&sess.started_at, 10);
                let text = if sess.summary.is_empty() {
                    "No summary"
                } else {
                    sess.summary.as_str()
                };
                parts.push(format!("Session {}: {}", date, text));
            }
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
