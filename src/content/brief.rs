//! 创作 brief：generate_text_content / generate_calendar 的参数结构，以及渲染为正文生成请求

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::content::{Channel, ContentType, Platform};

/// 结构化创作 brief（策略师与用户打磨完想法后填写）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DraftBrief {
    /// Target platform
    pub platform: Platform,
    /// Core subject of the post
    pub topic: String,
    /// Type of content to produce
    pub content_type: ContentType,
    /// Form of writing: prose, poetry, list, micro-story, question-led
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Writing style, e.g. 'short and punchy', 'conversational', 'poetic and sparse'
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Target word count for the caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count_target: Option<u32>,
    /// Specific direction for the opening hook line
    pub hook_direction: String,
    /// What to explore in the body, which angle, what insight to build toward
    pub content_direction: String,
    /// Direction for the closing call-to-action or engagement invitation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_direction: Option<String>,
    /// Words or phrases that MUST appear in the content
    pub words_to_use: Vec<String>,
    /// Words or phrases that must NOT appear
    pub words_to_avoid: Vec<String>,
    /// Emotional tone, e.g. 'warm, grounded, gently encouraging'
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_register: Option<String>,
    /// Hashtag count and focus areas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtag_guidance: Option<String>,
    /// The user's own written text, if any. The copywriter refines it rather than replacing it.
    #[serde(default)]
    pub user_script: String,
}

/// 周内容日历 brief
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalendarBrief {
    /// Themes per day, angles, variation notes, any specific direction
    pub calendar_brief: String,
    /// Target platforms
    pub platforms: Vec<Channel>,
    /// Number of posts for the week (3-7)
    pub num_posts: u32,
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("{}: {}", label, v));
    }
}

/// brief → 正文生成的用户消息（只列出非空字段）
pub fn render_brief(brief: &DraftBrief) -> String {
    let mut lines = vec!["CREATIVE BRIEF".to_string()];
    push_field(&mut lines, "Platform", Some(brief.platform.as_str()));
    push_field(&mut lines, "Topic", Some(&brief.topic));
    push_field(&mut lines, "Content type", Some(brief.content_type.as_str()));
    push_field(&mut lines, "Form", brief.form.as_deref());
    push_field(&mut lines, "Style", brief.style.as_deref());
    if let Some(n) = brief.word_count_target {
        lines.push(format!("Target word count: {}", n));
    }
    push_field(&mut lines, "Hook direction", Some(&brief.hook_direction));
    push_field(&mut lines, "Content direction", Some(&brief.content_direction));
    push_field(&mut lines, "CTA direction", brief.cta_direction.as_deref());
    if !brief.words_to_use.is_empty() {
        lines.push(format!("Words to use: {}", brief.words_to_use.join(", ")));
    }
    if !brief.words_to_avoid.is_empty() {
        lines.push(format!("Words to avoid: {}", brief.words_to_avoid.join(", ")));
    }
    push_field(&mut lines, "Emotional register", brief.emotional_register.as_deref());
    push_field(&mut lines, "Hashtag guidance", brief.hashtag_guidance.as_deref());

    if !brief.user_script.trim().is_empty() {
        lines.push(String::new());
        lines.push(
            "USER SCRIPT (refine this text, keep its voice, do not replace it):".to_string(),
        );
        lines.push(format!("\"\"\"\n{}\n\"\"\"", brief.user_script.trim()));
    }

    lines.push(String::new());
    lines.push("Execute this brief faithfully and produce both options.".to_string());
    lines.join("\n")
}

/// 日历 brief → 用户消息
pub fn render_calendar_request(brief: &CalendarBrief) -> String {
    let platforms = platform_list(&brief.platforms);
    format!(
        "Generate a weekly content calendar for {}.\n\nNumber of posts: {}\n\nBrief:\n{}\n\nCreate {} posts, each with 2 options (A and B).",
        platforms,
        brief.num_posts,
        brief.calendar_brief.trim(),
        brief.num_posts
    )
}

/// ["instagram", "rednote"] → "instagram and rednote"；空列表视为 instagram
pub fn platform_list(platforms: &[Channel]) -> String {
    if platforms.is_empty() {
        return Channel::Instagram.as_str().to_string();
    }
    platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(" and ")
}
